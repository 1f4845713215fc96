//! Error taxonomy shared by the transport layer and the request pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::{State, Type};
use crate::StatusCode;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors of transport operations and request handling.
///
/// Expected failures (address in use, peer reset, malformed request, ...) are
/// reported through this type and never by panicking.
#[derive(Debug, Error)]
pub enum Error {
    /// Text is not a dotted-decimal IPv4 address, or a native address is not IPv4.
    #[error("invalid IPv4 address `{0}`")]
    InvalidAddress(String),
    /// Operation attempted from a state that does not allow it.
    #[error("cannot {op} a transport in state {state}")]
    InvalidState {
        /// attempted operation
        op: &'static str,
        /// state the transport was in
        state: State,
    },
    /// Operation not available for the transport's protocol type.
    #[error("{op} is not supported on {kind} transports")]
    UnsupportedOperation {
        /// attempted operation
        op: &'static str,
        /// protocol type of the transport
        kind: Type,
    },
    /// Argument combination without meaning (e.g. shutdown of no direction).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The OS call behind `op` failed.
    #[error("{op} failed: {source}")]
    Io {
        /// OS-facing operation
        op: &'static str,
        /// error reported by the OS
        #[source]
        source: io::Error,
    },
    /// The request header block could not be parsed.
    #[error("malformed request: {0}")]
    Parse(#[from] ParseError),
    /// The path is not servable or no readable file exists for it.
    #[error("no servable file for `{}`", .0.display())]
    NotFound(PathBuf),
    /// The request was understood but cannot be honoured.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// Wire-level outcome closest to this error.
    ///
    /// Only `NotFound` maps to 404; everything else becomes a 400 so a single
    /// failing connection is always answered.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// `ErrorKind` of the underlying OS error, if this is an I/O failure.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        Error::Io { op, source }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Io { source, .. } => return source,
            Error::InvalidAddress(_) | Error::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            Error::InvalidState { .. } => io::ErrorKind::NotConnected,
            Error::UnsupportedOperation { .. } => io::ErrorKind::Unsupported,
            Error::Parse(_) | Error::BadRequest(_) => io::ErrorKind::InvalidData,
            Error::NotFound(_) => io::ErrorKind::NotFound,
        };
        io::Error::new(kind, err)
    }
}

/// Reasons a request header block is rejected.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// peer closed the connection without sending anything
    #[error("connection closed before a request arrived")]
    Empty,
    /// no CRLF after the request line
    #[error("request line is not terminated by CRLF")]
    MissingCrlf,
    /// header block not closed by a blank line within the limit
    #[error("header block not terminated by a blank line within {0} bytes")]
    Unterminated(usize),
    /// request line has fewer than three tokens
    #[error("request line needs METHOD PATH VERSION, found {0} token(s)")]
    MissingTokens(usize),
    /// request line is not ASCII
    #[error("request line contains non-ASCII bytes")]
    NonAscii,
}
