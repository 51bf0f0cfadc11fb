//! daybook - personal task tracker
//!
//! Tasks are kept in a single JSON document and remember every day they were
//! active on.

use clap::Parser;
use daybook::cli::Cli;
use daybook::error::{exit_codes, Error};
use daybook::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG.
    // Ignore invalid or oversized filters rather than failing startup.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            let err = Error::from(err);
            let _ = emit_error(&command, &err, json);
            std::process::exit(exit_codes::OPERATION_FAILED);
        }
    };

    if let Err(err) = runtime.block_on(cli.run()) {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
