//! Detection cache probe
//!
//! Exits 0 when no check failed, 1 otherwise.

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_admin::probe::{self, ProbeArgs, RunEnd};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_admin=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = ProbeArgs::parse();

    match probe::run_until_interrupted(probe::run(args), tokio::signal::ctrl_c()).await {
        RunEnd::Completed(Ok(report)) => ExitCode::from(report.exit_code()),
        RunEnd::Completed(Err(err)) => {
            println!("{}", format!("\n❌ Unexpected error: {err:#}").red());
            ExitCode::FAILURE
        }
        RunEnd::Interrupted => {
            println!("{}", "\n\nTest interrupted by user".yellow());
            ExitCode::FAILURE
        }
    }
}
