use serde::{Deserialize, Serialize};

use crate::values::{Price, Symbol, Timestamp};

/// A price update as received from the transport
///
/// Immutable once created. `received_at` is the local arrival time, which
/// defines processing order; `published_at` is whatever the producer claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMessage {
    pub symbol: Symbol,
    pub price: Price,
    pub received_at: Timestamp,
    /// Producer-side timestamp, if the payload carried one
    pub published_at: Option<Timestamp>,
}

impl PriceMessage {
    /// Create a message with no producer timestamp
    pub fn new(symbol: impl Into<Symbol>, price: Price, received_at: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            received_at,
            published_at: None,
        }
    }

    /// Attach the producer-side timestamp
    pub fn with_published_at(mut self, published_at: Timestamp) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// A message buffered in the ingestion queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub message: PriceMessage,
    pub enqueued_at: Timestamp,
}

impl QueueEntry {
    pub fn new(message: PriceMessage, enqueued_at: Timestamp) -> Self {
        Self {
            message,
            enqueued_at,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.message.symbol
    }
}
