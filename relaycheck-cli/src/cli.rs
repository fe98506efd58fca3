//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// relaycheck -- verify that an event pipeline delivers what was sent.
///
/// Use `relaycheck <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "relaycheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to the relaycheck.toml configuration file.
    /// Defaults to ./relaycheck.toml when present, built-in defaults otherwise.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Write Prometheus text format metrics to this file when the command finishes.
    /// Enables `[metrics]` and overrides `metrics.textfile`.
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for readiness, let deliveries settle, then verify the observed count.
    Run(RunArgs),

    /// Only wait for the environment's resources to become ready.
    Wait(WaitArgs),

    /// Query and list recorded observations without checking a count.
    Observations(ObservationsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- shared ----

/// Readiness polling overrides.
#[derive(Args, Debug, Default)]
pub struct ReadinessArgs {
    /// Poll interval in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Per-resource readiness timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Wait for resources one at a time instead of concurrently.
    #[arg(long)]
    pub sequential: bool,
}

// ---- run ----

/// Run a full delivery verification.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Environment file (TOML) naming the namespace and resources under test.
    #[arg(short, long)]
    pub env: PathBuf,

    /// Resource status snapshot (JSON).
    #[arg(long)]
    pub status_file: Option<PathBuf>,

    /// Observation export (JSON array or JSON lines).
    #[arg(long)]
    pub observations_file: Option<PathBuf>,

    #[command(flatten)]
    pub readiness: ReadinessArgs,

    /// Expected number of delivered events.
    #[arg(long)]
    pub expected_count: Option<usize>,

    /// Observer identity to count (default: derived from the namespace).
    #[arg(long)]
    pub observer: Option<String>,

    /// Settling delay in seconds before querying observations.
    #[arg(long)]
    pub settling_delay_secs: Option<u64>,

    /// Pass when at least the expected count was observed.
    #[arg(long)]
    pub at_least: bool,
}

// ---- wait ----

/// Wait for resources to become ready.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Environment file (TOML) naming the namespace and resources under test.
    #[arg(short, long)]
    pub env: PathBuf,

    /// Resource status snapshot (JSON).
    #[arg(long)]
    pub status_file: Option<PathBuf>,

    #[command(flatten)]
    pub readiness: ReadinessArgs,
}

// ---- observations ----

/// List recorded observations.
#[derive(Args, Debug)]
pub struct ObservationsArgs {
    /// Observation export (JSON array or JSON lines).
    #[arg(long)]
    pub observations_file: Option<PathBuf>,

    /// Only list events recorded by this observer.
    #[arg(long, conflicts_with = "namespace")]
    pub observer: Option<String>,

    /// Derive the observer identity from this namespace.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Ignore the configured origin scope.
    #[arg(long)]
    pub any_origin: bool,
}

// ---- config ----

/// Manage relaycheck configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, readiness, delivery, sources, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}
