//! `relaycheck observations` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use relaycheck_core::config::RelaycheckConfig;
use relaycheck_core::types::ObservedEvent;
use relaycheck_verifier::{FileObservationStore, ObservationFilter, ObservationStore, ObserverIdentity};

use crate::cli::ObservationsArgs;
use crate::commands::source_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `observations` command.
pub async fn execute(
    args: ObservationsArgs,
    config: RelaycheckConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let path = source_path(
        args.observations_file.as_deref(),
        &config.sources.observations_file,
    );
    let filter = build_filter(&args, &config);
    info!(source = %path.display(), filter = %filter, "querying observations");

    let store = FileObservationStore::new(&path);
    let events = store.query(&filter).await?;

    let listing = ObservationListing {
        source: path.display().to_string(),
        filter: filter.to_string(),
        count: events.len(),
        events,
    };
    writer.render(&listing)?;
    Ok(())
}

/// Build the query filter from flags and configuration.
///
/// `--observer` wins over `--namespace`; without either the configured
/// `delivery.observer_identity` is used, and an empty one lists every observer.
pub fn build_filter(args: &ObservationsArgs, config: &RelaycheckConfig) -> ObservationFilter {
    let observer = match (&args.observer, &args.namespace) {
        (Some(observer), _) => Some(observer.clone()),
        (None, Some(namespace)) => Some(
            ObserverIdentity::with_prefix(&config.delivery.observer_prefix, namespace).to_string(),
        ),
        (None, None) if !config.delivery.observer_identity.is_empty() => {
            Some(config.delivery.observer_identity.clone())
        }
        (None, None) => None,
    };

    let mut filter = ObservationFilter::new();
    if let Some(observer) = observer {
        filter = filter.observer(observer);
    }
    if !args.any_origin {
        filter = filter.origin(config.delivery.origin());
    }
    filter
}

/// Observation listing payload.
#[derive(Serialize)]
pub struct ObservationListing {
    /// Observation export path
    pub source: String,
    /// Applied filter
    pub filter: String,
    /// Number of matching events
    pub count: usize,
    /// Matching events, in store order
    pub events: Vec<ObservedEvent>,
}

impl Render for ObservationListing {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Observations: {}", self.source.bold())?;
        writeln!(w, "  Filter: {}", self.filter)?;
        writeln!(w, "  Count:  {}", self.count.to_string().bold())?;

        for (index, event) in self.events.iter().enumerate() {
            writeln!(w)?;
            writeln!(w, "[{index}]: seen by {:?} from {}", event.observer, event.origin)?;
            let payload = serde_json::to_string_pretty(&event.event)
                .unwrap_or_else(|_| event.event.to_string());
            writeln!(w, "{payload}")?;
        }
        Ok(())
    }
}
