//! Console chat client
//!
//! Connects to a relay server, registers a display name, then runs two
//! loops: a reader thread printing everything the server fans out, and a
//! stdin loop sending each typed line as one message.

use std::env;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use chat_relay::{Name, Transport};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let [_, username, host, port] = args.as_slice() else {
        eprintln!("USAGE: relay-client USERNAME HOSTNAME PORT");
        return ExitCode::FAILURE;
    };

    let name = match Name::parse(username.as_bytes()) {
        Ok(name) => name,
        Err(err) => {
            eprintln!("bad username: {err}");
            return ExitCode::FAILURE;
        }
    };
    let Ok(port) = port.parse::<u16>() else {
        eprintln!("bad port: {port}");
        return ExitCode::FAILURE;
    };

    match run(&name, host, port) {
        Ok(code) => code,
        Err(err) => {
            error!("client failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(name: &Name, host: &str, port: u16) -> Result<ExitCode, chat_relay::RelayError> {
    let transport = Arc::new(Transport::connect(host, port)?);

    // Join handshake: the raw name, answered with DONE or FAILED.
    transport.send(name.as_str().as_bytes())?;
    let mut reply = [0u8; 16];
    let n = transport.recv(&mut reply)?;
    if n == 0 || reply[..n].starts_with(b"FAILED") {
        eprintln!("username already taken");
        return Ok(ExitCode::FAILURE);
    }

    // Everything the server sends from here on is chat output.
    let reader = {
        let transport = Arc::clone(&transport);
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            let stdout = std::io::stdout();
            loop {
                match transport.recv(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let mut out = stdout.lock();
                        let _ = out.write_all(&buf[..n]);
                        let _ = out.flush();
                    }
                }
            }
        })
    };

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.is_empty() {
            continue;
        }
        transport.send(line.as_bytes())?;
    }

    transport.shutdown();
    let _ = reader.join();
    Ok(ExitCode::SUCCESS)
}
