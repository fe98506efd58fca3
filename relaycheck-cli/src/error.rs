//! CLI-specific error types and exit code mapping

use relaycheck_core::error::{ConfigError, RelaycheckError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes so that
/// scripts can tell a readiness problem from a delivery mismatch.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from relaycheck-core.
    #[error("{0}")]
    Core(#[from] RelaycheckError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Run passed                                |
    /// | 1    | General / command error                   |
    /// | 2    | Configuration or environment file error   |
    /// | 3    | Readiness did not converge                |
    /// | 4    | Observation store query failed            |
    /// | 5    | Observed count did not match              |
    /// | 10   | IO error                                  |
    /// | 130  | Cancelled by signal                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
            Self::Core(err) => match err {
                RelaycheckError::Config(_) | RelaycheckError::Environment(_) => 2,
                RelaycheckError::Readiness(_) => 3,
                RelaycheckError::ObservationQuery(_) => 4,
                RelaycheckError::CountMismatch { .. } => 5,
                RelaycheckError::Cancelled(_) => 130,
                RelaycheckError::Io(_) => 10,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Core(RelaycheckError::Config(e))
    }
}

impl From<relaycheck_readiness::ReadinessError> for CliError {
    fn from(e: relaycheck_readiness::ReadinessError) -> Self {
        Self::Core(e.into())
    }
}

impl From<relaycheck_verifier::VerifierError> for CliError {
    fn from(e: relaycheck_verifier::VerifierError) -> Self {
        Self::Core(e.into())
    }
}
