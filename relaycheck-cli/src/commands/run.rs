//! `relaycheck run` command handler

use std::io::Write;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use relaycheck_core::config::RelaycheckConfig;
use relaycheck_core::types::Environment;
use relaycheck_harness::{DeliveryRun, RunOutcome, RunPlan, RunReport};
use relaycheck_readiness::FileStatusSource;
use relaycheck_verifier::FileObservationStore;

use crate::cli::RunArgs;
use crate::commands::{apply_readiness_overrides, format_duration, source_path};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// The report is rendered for every outcome; a run that did not pass is
/// then returned as an error so the exit code reflects the failure kind.
pub async fn execute(
    args: RunArgs,
    mut config: RelaycheckConfig,
    cancel: &CancellationToken,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    apply_run_overrides(&args, &mut config);
    config.validate()?;

    let environment = Environment::load(&args.env).await?;
    let status_path = source_path(args.status_file.as_deref(), &config.sources.status_file);
    let observations_path = source_path(
        args.observations_file.as_deref(),
        &config.sources.observations_file,
    );
    info!(
        env = %args.env.display(),
        status = %status_path.display(),
        observations = %observations_path.display(),
        "preparing delivery run"
    );

    let plan = RunPlan::from_config(&config, environment)?;
    let run = DeliveryRun::new(
        plan,
        Arc::new(FileStatusSource::new(status_path)),
        Arc::new(FileObservationStore::new(observations_path)),
    );
    let report = run.execute(cancel).await;

    writer.render(&report)?;

    match report.error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Apply `run` flags on top of the loaded configuration.
pub fn apply_run_overrides(args: &RunArgs, config: &mut RelaycheckConfig) {
    apply_readiness_overrides(&args.readiness, config);
    if let Some(count) = args.expected_count {
        config.delivery.expected_count = count;
    }
    if let Some(observer) = &args.observer {
        config.delivery.observer_identity = observer.clone();
    }
    if let Some(secs) = args.settling_delay_secs {
        config.delivery.settling_delay_secs = secs;
    }
    if args.at_least {
        config.delivery.match_mode = "at_least".to_owned();
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Delivery Run: {} (namespace: {})",
            self.run_id.bold(),
            self.namespace
        )?;

        match &self.outcome {
            RunOutcome::Passed => writeln!(w, "  Result:    {}", "PASSED".green().bold())?,
            RunOutcome::Failed(failure) => {
                writeln!(w, "  Result:    {}", "FAILED".red().bold())?;
                writeln!(w, "  Reason:    {failure}")?;
            }
            RunOutcome::Cancelled { phase } => {
                writeln!(
                    w,
                    "  Result:    {} (during {phase})",
                    "CANCELLED".yellow().bold()
                )?;
            }
        }
        writeln!(w, "  Observer:  {}", self.observer)?;

        if let Some(readiness) = &self.readiness {
            writeln!(
                w,
                "  Readiness: {} converged, {} skipped ({})",
                readiness.polled(),
                readiness.skipped.len(),
                format_duration(readiness.elapsed)
            )?;
        }
        if let Some(settle) = &self.settle {
            write!(w, "  Settled:   {}", format_duration(settle.waited))?;
            if settle.polls > 0 {
                write!(
                    w,
                    " after {} queries{}",
                    settle.polls,
                    if settle.stable { " (stable)" } else { " (max wait)" }
                )?;
            }
            writeln!(w)?;
        }
        if let Some(verification) = &self.verification {
            writeln!(
                w,
                "  Observed:  {} (expected {}, {})",
                verification.actual, verification.expected, verification.match_mode
            )?;
            if !verification.passed {
                for (index, event) in verification.events.iter().enumerate() {
                    writeln!(w, "    [{index}] {event}")?;
                }
            }
        }
        writeln!(w, "  Elapsed:   {}", format_duration(self.elapsed))?;
        Ok(())
    }
}
