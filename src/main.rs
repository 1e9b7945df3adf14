//! combine CLI - combine open pull requests into a single PR

mod cli;

use anstream::eprintln;
use anyhow::Context;
use clap::Parser;
use cli::style::Stylize;
use cli::{Args, run_combine};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log level used when neither `LOG_LEVEL` nor `RUST_LOG` is set
const DEFAULT_LOG_LEVEL: &str = "warn";

fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Command line echoed into the combined PR body
fn command_line() -> String {
    std::iter::once("combine".to_string())
        .chain(std::env::args().skip(1))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.no_color {
        anstream::ColorChoice::Never.write_global();
    }
    init_tracing();

    match try_main(args).await {
        Ok(code) => code,
        Err(e) if is_cancelled(&e) => {
            eprintln!("{}", "Cancelled".muted());
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".error());
            ExitCode::FAILURE
        }
    }
}

async fn try_main(args: Args) -> anyhow::Result<ExitCode> {
    let stats = run_combine(args, command_line())
        .await
        .context("combine failed")?;

    if stats.has_failures() {
        eprintln!(
            "{}",
            "Some repositories could not be processed; see the summary above.".warn()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<pr_combine::Error>()
        .is_some_and(pr_combine::Error::is_cancelled)
}
