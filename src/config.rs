//! Command line configuration of the `tiny-fileserver` binary

use std::path::PathBuf;

use clap::Parser;

use crate::common::limits;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::server_config::ServerConfig;

/// Command line flags, each also readable from a `FILESERVER_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "tiny-fileserver")]
#[command(about = "Serves fileN.html and imageN.jpg over HTTP/1.0")]
#[command(version)]
pub struct Config {
    /// Log verbosity: 0 off, 1-2 error, 3 warn, 4 info, 5 debug, 6 trace
    #[arg(
        short,
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(0..=6),
        env = "FILESERVER_LOG_LEVEL"
    )]
    pub debug_level: u8,

    /// IPv4 address to listen on
    #[arg(long, default_value = crate::endpoint::LOCALHOST, env = "FILESERVER_HOST")]
    pub host: String,

    /// Preferred port; random ports are probed if it is taken
    #[arg(short, long, default_value_t = crate::server_config::PORT_DEFAULT, env = "FILESERVER_PORT")]
    pub port: u16,

    /// Directory the files are served from
    #[arg(short, long, default_value = crate::server_config::ROOT_DEFAULT, env = "FILESERVER_ROOT")]
    pub root: PathBuf,

    /// Pending connection queue length
    #[arg(long, default_value_t = limits::BACKLOG_DEFAULT, env = "FILESERVER_BACKLOG")]
    pub backlog: i32,

    /// Random ports tried when the preferred port is taken
    #[arg(
        long,
        default_value_t = crate::server_config::PROBE_ATTEMPTS_DEFAULT,
        env = "FILESERVER_PROBE_ATTEMPTS"
    )]
    pub probe_attempts: usize,
}

impl Config {
    /// Validates the flags into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAddress`](crate::Error::InvalidAddress) if `host` is
    /// not a dotted-decimal IPv4 address.
    pub fn into_server_config(self) -> Result<ServerConfig> {
        let defaults = ServerConfig::default();
        Ok(ServerConfig {
            addr: Endpoint::parse(&self.host, self.port)?,
            root: self.root,
            probe_attempts: self.probe_attempts,
            limits: limits::Config {
                backlog: self.backlog,
                ..defaults.limits
            },
            ..defaults
        })
    }
}
