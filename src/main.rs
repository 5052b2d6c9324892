mod cli;
mod model;
mod output;
mod plugin;
mod registry;
mod syntax;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use model::config::AppConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let _guard = init_logging(&config)?;

    tracing::info!(command = ?cli.command, "hpm starting");

    match cli::run(cli, &config) {
        Ok(outcome) => Ok(outcome.into()),
        Err(e) => {
            tracing::error!("command failed: {e:#}");
            output::failure(&format!("hpm error: {e:#}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Logs go to a daily file, never stdout.
fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let log_dir = AppConfig::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "hpm.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env("HPM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_filter));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Ok(guard)
}
