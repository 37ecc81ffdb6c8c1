//! Error types for the engine crate

use thiserror::Error;

/// Configuration rejected by [`EngineConfig::validate`](crate::EngineConfig::validate)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors building an [`Engine`](crate::Engine)
///
/// Once started, the engine itself never fails: runtime errors are logged
/// and counted in [`EngineStats`](crate::EngineStats).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
