use thiserror::Error;

/// Errors reported by a persistence sink
///
/// The engine logs these and drops the record; none of them is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid sink configuration: {0}")]
    Config(String),
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;
