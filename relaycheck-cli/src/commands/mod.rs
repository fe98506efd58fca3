//! Command handlers -- one module per subcommand

pub mod config;
pub mod observations;
pub mod run;
pub mod wait;

use std::path::{Path, PathBuf};

use tracing::debug;

use relaycheck_core::config::RelaycheckConfig;

use crate::cli::ReadinessArgs;
use crate::error::CliError;

/// Configuration file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "relaycheck.toml";

/// Decide which configuration file to read, if any.
///
/// An explicit path always wins, even when it does not exist, so that a
/// typo is reported instead of silently falling back to defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        }
    }
}

/// Load the effective configuration (file + env overrides + defaults).
pub async fn load_config(explicit: Option<&Path>) -> Result<RelaycheckConfig, CliError> {
    match resolve_config_path(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            Ok(RelaycheckConfig::load(&path).await?)
        }
        None => {
            debug!("no configuration file, using defaults");
            let mut config = RelaycheckConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Apply readiness flags on top of the loaded configuration.
pub fn apply_readiness_overrides(args: &ReadinessArgs, config: &mut RelaycheckConfig) {
    if let Some(ms) = args.poll_interval_ms {
        config.readiness.poll_interval_ms = ms;
    }
    if let Some(secs) = args.timeout_secs {
        config.readiness.per_resource_timeout_secs = secs;
    }
    if args.sequential {
        config.readiness.strategy = "sequential".to_owned();
    }
}

/// Pick the file-backed collaborator path: flag first, then configuration.
pub fn source_path(flag: Option<&Path>, configured: &str) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(configured))
}

/// Human-readable duration for text output.
pub fn format_duration(d: std::time::Duration) -> String {
    if d.as_secs() >= 60 {
        format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
