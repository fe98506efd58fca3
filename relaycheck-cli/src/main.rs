//! relaycheck -- delivery pipeline verification CLI
//!
//! Waits for the resources of a test environment to become ready, lets
//! deliveries settle, then checks that the expected number of events was
//! observed. The process exit code tells which phase failed.

mod cli;
mod commands;
mod error;
mod logging;
mod metrics_export;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);

    match run(cli, &writer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    let Cli {
        config: config_path,
        log_level,
        metrics_file,
        command,
        ..
    } = cli;

    // config subcommands report load failures themselves
    let command = match command {
        Commands::Config(args) => {
            return commands::config::execute(args, config_path.as_deref(), writer).await;
        }
        other => other,
    };

    let mut config = commands::load_config(config_path.as_deref()).await?;
    if let Some(level) = log_level {
        config.general.log_level = level;
    }
    if let Some(path) = metrics_file {
        config.metrics.enabled = true;
        config.metrics.textfile = path.to_string_lossy().into_owned();
    }
    config.validate()?;
    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    let recorder = metrics_export::install_metrics_recorder(&config.metrics)
        .map_err(|e| CliError::Config(e.to_string()))?;
    let textfile = PathBuf::from(&config.metrics.textfile);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, cancelling");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for interrupt"),
        }
    });

    let result = match command {
        Commands::Run(args) => commands::run::execute(args, config, &cancel, writer).await,
        Commands::Wait(args) => commands::wait::execute(args, config, &cancel, writer).await,
        Commands::Observations(args) => {
            commands::observations::execute(args, config, writer).await
        }
        Commands::Config(_) => Ok(()),
    };

    // metrics are written for failed runs too; the command error wins
    if let Some(handle) = recorder {
        match metrics_export::write_textfile(&handle, &textfile).await {
            Ok(()) => info!(path = %textfile.display(), "metrics written"),
            Err(e) => {
                warn!(path = %textfile.display(), error = %e, "failed to write metrics");
                result?;
                return Err(CliError::Io(e));
            }
        }
    }

    result
}
