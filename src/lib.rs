//! # Simple usage
//!
//! ## Creating the server
//!
//! The easiest way to create a server is to call `Server::new()` with a
//! [`ServerConfig`] and a [`ShutdownToken`].
//!
//! `new()` returns a `Result<Server>` which will return an error in the case
//! where the server creation fails (for example if neither the preferred port
//! nor any of the probed ports is free).
//!
//! ```no_run
//! use tiny_fileserver::{Endpoint, Server, ServerConfig, ShutdownToken};
//!
//! let config = ServerConfig { addr: Endpoint::localhost(8080), ..ServerConfig::default() };
//! let server = Server::new(config, ShutdownToken::new()).unwrap();
//! ```
//!
//! A newly-created `Server` is already listening. Calling `run()` serves
//! one connection after the other until the token is cancelled:
//!
//! ```no_run
//! # use tiny_fileserver::{Server, ServerConfig, ShutdownToken};
//! let token = ShutdownToken::new();
//! let server = Server::new(ServerConfig::default(), token.clone()).unwrap();
//!
//! let handle = std::thread::spawn(move || server.run());
//! // ...
//! token.cancel();
//! let _ = handle.join();
//! ```
//!
//! Only `GET` and `HEAD` of `/fileN.html` and `/imageN.jpg` (`N` a single
//! digit) below the serving root are answered with `200`; everything else
//! gets a `400` or `404` with an empty body.
//!
//! ## Using the transport directly
//!
//! [`Transport`] is the state-checked socket the server is built on. It can
//! be used on its own, together with the delimiter framing of
//! [`read_until`]:
//!
//! ```no_run
//! use tiny_fileserver::{Endpoint, Transport, Type};
//!
//! let mut client = Transport::create_connect(&Endpoint::localhost(1701), Type::Stream).unwrap();
//! client.send_str("HEAD /file1.html HTTP/1.0\r\n\r\n").unwrap();
//! let header = client.read_until(b"\r\n\r\n", 4096).unwrap();
//! ```

#[cfg(feature = "log")]
pub use crate::log::{init_logger, level_filter};
pub use common::{limits, ContentType, LimitsConfig, Method, StatusCode};
pub use config::Config;
pub use connection::{process_connection, respond_to};
pub use endpoint::{Endpoint, LOCALHOST};
pub use error::{Error, ParseError, Result};
pub use handle::{Handle, INVALID_DESCRIPTOR};
pub use poll::{Callback, Interest, Poll, Readiness};
pub use request::{Request, HEADER_TERMINATOR};
pub use response::{Response, ResponseBox, HTTP_VERSION};
pub use serve_root::ServeRoot;
pub use server::{bind_available, find_available_port, Server};
pub use server_config::{ServerConfig, PORT_DEFAULT, PROBE_ATTEMPTS_DEFAULT, ROOT_DEFAULT};
pub use shutdown::{install_signal_handlers, ShutdownToken};
pub use socket_config::SocketOptions;
pub use stream_traits::Receive;
pub use transport::{State, Transport, Type};
pub use util::{read_line, read_until, MAX_FRAME_LEN_DEFAULT};

mod common;
mod config;
mod connection;
mod endpoint;
mod error;
mod handle;
mod log;
mod poll;
mod request;
mod response;
mod serve_root;
mod server;
mod server_config;
mod shutdown;
mod socket_config;
mod stream_traits;
mod transport;
mod util;
