//! Chat relay server - entry point
//!
//! Binds the listening socket, starts the acceptor, and tears the server
//! down when the operator presses Enter (or closes stdin).

use std::env;
use std::io::BufRead;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::RelayServer;

fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let Some(port) = env::args().nth(1).and_then(|arg| arg.parse::<u16>().ok()) else {
        eprintln!("USAGE: relay-server PORT");
        return ExitCode::FAILURE;
    };

    // Bind/listen failures are fatal to the whole process.
    let server = match RelayServer::bind(port) {
        Ok(server) => server,
        Err(err) => {
            error!("could not bind port {port}: {err}");
            return ExitCode::FAILURE;
        }
    };

    match server.local_addr() {
        Ok(addr) => info!("chat relay listening on {addr}"),
        Err(err) => {
            error!("listening socket unusable: {err}");
            return ExitCode::FAILURE;
        }
    }

    let acceptor = server.start();

    // Operator shutdown: any input line (or EOF) on stdin.
    info!("press Enter to stop the server");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);

    server.shutdown();
    let _ = acceptor.join();
    info!("server stopped");

    ExitCode::SUCCESS
}
