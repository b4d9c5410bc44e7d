//! Error types for configuration loading and simulation runs.

use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A recognised option holds a value outside its legal range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// A strategy name that matches no known strategy.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    /// Malformed YAML or an unrecognised option key.
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The stats sink failed to accept a record.
    #[error("stats output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
