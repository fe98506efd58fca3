//! `relaycheck wait` command handler

use std::io::Write;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use relaycheck_core::config::RelaycheckConfig;
use relaycheck_core::types::Environment;
use relaycheck_readiness::{FileStatusSource, ReadinessReport, ReadinessWatcher, WatcherConfig};

use crate::cli::WaitArgs;
use crate::commands::{apply_readiness_overrides, format_duration, source_path};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `wait` command.
pub async fn execute(
    args: WaitArgs,
    mut config: RelaycheckConfig,
    cancel: &CancellationToken,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    apply_readiness_overrides(&args.readiness, &mut config);
    config.validate()?;

    let environment = Environment::load(&args.env).await?;
    let status_path = source_path(args.status_file.as_deref(), &config.sources.status_file);
    info!(
        namespace = %environment.namespace,
        status = %status_path.display(),
        "waiting for resources"
    );

    let watcher = ReadinessWatcher::new(
        Arc::new(FileStatusSource::new(status_path)),
        WatcherConfig::from_core(&config.readiness)?,
    );
    let report = watcher
        .wait_for_all_ready(&environment.references, cancel)
        .await?;

    writer.render(&report)?;
    Ok(())
}

impl Render for ReadinessReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Readiness: {} ({})",
            "ALL READY".green().bold(),
            format_duration(self.elapsed)
        )?;

        if !self.converged.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "  {:<12} {:<30} {:<8} {:>6} {:>8}",
                "KIND", "NAME", "OUTCOME", "POLLS", "WAITED"
            )?;
            for outcome in &self.converged {
                writeln!(
                    w,
                    "  {:<12} {:<30} {:<8} {:>6} {:>8}",
                    outcome.reference.kind,
                    outcome.reference.name,
                    outcome.outcome.as_str(),
                    outcome.polls,
                    format_duration(outcome.waited)
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(w)?;
            writeln!(w, "  Skipped (outside platform domain):")?;
            for reference in &self.skipped {
                writeln!(w, "    {}", reference.to_string().dimmed())?;
            }
        }
        Ok(())
    }
}
