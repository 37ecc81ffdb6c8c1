//! Transport abstraction layer
//!
//! Provides unified traits for topic-based publish/subscribe.
//! The trait-based design allows swapping in a broker client (MQTT, NATS, etc.) later.

pub mod channel;
pub mod config;

pub use config::Topics;

use crate::error::TransportError;
use async_trait::async_trait;

/// A raw message as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publisher - sends raw payloads to a topic
///
/// Delivery is at-most-once: a message published while nobody is subscribed
/// is simply lost.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a payload on a topic
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;
}

/// Subscriber - receives envelopes matching its topic filters
#[async_trait]
pub trait Subscriber: Send {
    /// Wait for the next message
    ///
    /// A `TransportError::Connection` means the underlying connection dropped;
    /// the subscription is dead and must be re-established through
    /// [`Transport::subscribe`].
    async fn next(&mut self) -> Result<Envelope, TransportError>;

    /// Try to receive without blocking (returns None if no message available)
    fn try_next(&mut self) -> Result<Option<Envelope>, TransportError>;
}

/// Transport - opens subscriptions for a set of topic filters
#[async_trait]
pub trait Transport: Send + Sync {
    /// Subscribe to every topic matching any of `filters`
    async fn subscribe(&self, filters: &[String]) -> Result<Box<dyn Subscriber>, TransportError>;

    /// Get the transport's name for logging
    fn name(&self) -> &str {
        "Transport"
    }
}

/// MQTT-style topic filter matching
///
/// Levels are separated by `/`. `+` matches exactly one level, `#` (last
/// level only) matches any number of remaining levels, including none.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}
