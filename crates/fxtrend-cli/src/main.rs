mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use fxtrend_core::DashboardConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::from_env();
    cli.apply_to(&mut config);

    if let Some(result) = commands::run(&cli, &config).await? {
        output::render(&result, cli.format, cli.pretty)?;
    }

    Ok(ExitCode::SUCCESS)
}
