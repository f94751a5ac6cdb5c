//! hireboard - command line client for the job board.
//!
//! Signs users in against the gateway, keeps the session between runs and
//! offers job listing, posting, applications and candidate profiles
//! according to the signed-in role.

mod app;
mod commands;

use std::io;

use anyhow::Result;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use commands::{Command, USAGE};

/// Directory for an additional daily-rotated log file
const LOG_DIR_ENV: &str = "HIREBOARD_LOG_DIR";

const LOG_FILE_PREFIX: &str = "hireboard.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). When
/// `HIREBOARD_LOG_DIR` is set they are also written to a file there; the
/// returned guard must live until exit so buffered lines are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            drop(log_guard);
            std::process::exit(2);
        }
    };
    debug!(?command, "Parsed command");

    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut app = App::new()?;
    info!(authenticated = app.store.is_authenticated(), "hireboard starting");

    if let Err(e) = commands::run(&mut app, command).await {
        eprintln!("Error: {:#}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    drop(log_guard);
    Ok(())
}
