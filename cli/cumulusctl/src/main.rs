//! cumulusctl (cumulus) - CLI for the Cumulus hosting platform
//!
//! Issues REST operations against the platform API and polls the
//! resulting activities until completion.

use std::process::ExitCode;

use clap::Parser;

mod activity;
mod batch;
mod commands;
mod config;
mod error;
mod gate;
mod git;
mod output;
mod prompt;
mod select;
mod ssl;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            error::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
