//! Prometheus metrics export.
//!
//! A run is a one-shot process, so instead of serving a scrape endpoint the
//! recorder from `metrics-exporter-prometheus` is rendered once into a text
//! file when the command finishes (node_exporter textfile collector format).
//!
//! # Usage
//!
//! ```ignore
//! let handle = install_metrics_recorder(&config.metrics)?;
//! // ... run the command ...
//! if let Some(handle) = handle {
//!     write_textfile(&handle, Path::new(&config.metrics.textfile)).await?;
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use relaycheck_core::config::MetricsConfig;

/// Install the global Prometheus recorder when metrics are enabled.
///
/// Returns `None` without touching the global recorder when `[metrics]` is
/// disabled. Must be called at most once per process.
///
/// # Errors
///
/// - Global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    relaycheck_core::metrics::describe_all();

    tracing::info!(
        textfile = %config.textfile,
        "Prometheus metrics recorder installed"
    );

    Ok(Some(handle))
}

/// Render the recorder and replace `path` with the result.
///
/// The text is written to a sibling `.tmp` file and renamed into place.
pub async fn write_textfile(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    let staging = staging_path(path);
    tokio::fs::write(&staging, handle.render()).await?;
    tokio::fs::rename(&staging, path).await
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
