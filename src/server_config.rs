use std::path::PathBuf;

use crate::common::limits;
use crate::endpoint::Endpoint;
use crate::socket_config::SocketOptions;

/// Default preferred port
pub const PORT_DEFAULT: u16 = 1701;
/// Default serving root, relative to the working directory
pub const ROOT_DEFAULT: &str = "data";
/// Default number of random ports tried when the preferred one is taken
pub const PROBE_ATTEMPTS_DEFAULT: usize = 100;

/// Represents the config parameters required to create a server.
///
/// # Example
///
/// ```
/// # use tiny_fileserver::{Endpoint, ServerConfig};
/// let cfg = ServerConfig { addr: Endpoint::localhost(8080), ..ServerConfig::default() };
/// ```
///
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. The port is only preferred: if it is taken,
    /// random ports are probed. Port `0` lets the OS choose.
    pub addr: Endpoint,

    /// Directory the files are served from
    pub root: PathBuf,

    /// Random ports tried after the preferred port failed
    pub probe_attempts: usize,

    /// Header size, backlog and accept wake-up limits
    /// See [`limits::Config`]
    pub limits: limits::Config,

    /// Options applied to the listening socket
    /// See [`SocketOptions`]
    pub socket_options: SocketOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Endpoint::localhost(PORT_DEFAULT),
            root: PathBuf::from(ROOT_DEFAULT),
            probe_attempts: PROBE_ATTEMPTS_DEFAULT,
            limits: limits::Config::default(),
            socket_options: SocketOptions::default(),
        }
    }
}
