//! Error types for the gateway crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl TransportError {
    /// Whether a fresh subscription may succeed after this error
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::ChannelClosed)
    }
}

/// Errors decoding a raw payload into a domain message
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Invalid JSON payload: {0}")]
    Json(String),

    #[error("Missing or empty symbol")]
    EmptySymbol,

    #[error("Price is not a finite number: {0}")]
    InvalidPrice(String),

    #[error("Unexpected topic: {0}")]
    UnexpectedTopic(String),

    #[error("Payload symbol {payload} does not match topic symbol {topic}")]
    SymbolMismatch { topic: String, payload: String },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e.to_string())
    }
}

/// Gateway-level errors (adapter operations)
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}
