#![allow(unused_crate_dependencies)]

use std::process::ExitCode;

use clap::Parser;
use tiny_fileserver::{init_logger, install_signal_handlers, Config, Server, ShutdownToken};

fn main() -> ExitCode {
    let config = Config::parse();
    if let Err(err) = init_logger(config.debug_level) {
        eprintln!("logger: {err}");
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tiny-fileserver: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> tiny_fileserver::Result<()> {
    install_signal_handlers()?;
    let server = Server::new(config.into_server_config()?, ShutdownToken::from_signals())?;
    server.run()
}
