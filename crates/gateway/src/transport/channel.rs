//! Tokio channel-based transport for single-process mode
//!
//! Uses a broadcast channel as an in-process broker. Every subscriber sees
//! every frame and filters by topic locally. Connection drops can be injected
//! with [`ChannelTransport::reset_connections`] to exercise reconnect logic.

use crate::error::TransportError;
use crate::transport::{Envelope, Publisher, Subscriber, Transport, topic_matches};
use async_trait::async_trait;
use log::warn;
use tokio::sync::broadcast;

/// What travels on the internal broadcast channel
#[derive(Debug, Clone)]
enum Frame {
    Message(Envelope),
    /// Every live subscription observes a dropped connection
    Reset,
}

/// In-process broker backed by a tokio broadcast channel
pub struct ChannelTransport {
    tx: broadcast::Sender<Frame>,
}

impl ChannelTransport {
    /// Create a transport whose per-subscriber backlog is `capacity` frames
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Drop every live subscription, as a broker disconnect would
    ///
    /// Returns the number of subscriptions affected.
    pub fn reset_connections(&self) -> usize {
        self.tx.send(Frame::Reset).unwrap_or(0)
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl Publisher for ChannelTransport {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if topic.is_empty() || topic.contains(['+', '#']) {
            return Err(TransportError::Send(format!(
                "invalid publish topic '{}'",
                topic
            )));
        }
        // No subscribers is not an error: delivery is at-most-once.
        let _ = self.tx.send(Frame::Message(Envelope::new(topic, payload)));
        Ok(())
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn subscribe(&self, filters: &[String]) -> Result<Box<dyn Subscriber>, TransportError> {
        if filters.is_empty() {
            return Err(TransportError::Subscribe("no topic filters".to_string()));
        }
        if let Some(bad) = filters.iter().find(|f| f.is_empty()) {
            return Err(TransportError::Subscribe(format!(
                "invalid topic filter '{}'",
                bad
            )));
        }

        Ok(Box::new(ChannelSubscriber {
            rx: self.tx.subscribe(),
            filters: filters.to_vec(),
            reset: false,
        }))
    }

    fn name(&self) -> &str {
        "ChannelTransport"
    }
}

/// Channel-based subscriber using a broadcast receiver
pub struct ChannelSubscriber {
    rx: broadcast::Receiver<Frame>,
    filters: Vec<String>,
    /// Set once a reset has been observed; the subscription stays dead
    reset: bool,
}

impl ChannelSubscriber {
    fn accepts(&self, envelope: &Envelope) -> bool {
        self.filters
            .iter()
            .any(|filter| topic_matches(filter, &envelope.topic))
    }

    fn dead(&self) -> TransportError {
        TransportError::Connection("connection reset".to_string())
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn next(&mut self) -> Result<Envelope, TransportError> {
        if self.reset {
            return Err(self.dead());
        }
        loop {
            match self.rx.recv().await {
                Ok(Frame::Message(envelope)) => {
                    if self.accepts(&envelope) {
                        return Ok(envelope);
                    }
                }
                Ok(Frame::Reset) => {
                    self.reset = true;
                    return Err(self.dead());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // At-most-once: skipped frames are gone
                    warn!("[TRANSPORT] Subscriber lagged, {} frames lost", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(TransportError::ChannelClosed);
                }
            }
        }
    }

    fn try_next(&mut self) -> Result<Option<Envelope>, TransportError> {
        if self.reset {
            return Err(self.dead());
        }
        loop {
            match self.rx.try_recv() {
                Ok(Frame::Message(envelope)) => {
                    if self.accepts(&envelope) {
                        return Ok(Some(envelope));
                    }
                }
                Ok(Frame::Reset) => {
                    self.reset = true;
                    return Err(self.dead());
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("[TRANSPORT] Subscriber lagged, {} frames lost", skipped);
                    continue;
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(TransportError::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_pubsub() {
        let transport = ChannelTransport::new(10);
        let mut sub = transport
            .subscribe(&filters(&["crypto/price/BTCUSDT"]))
            .await
            .unwrap();

        transport
            .publish("crypto/price/BTCUSDT", b"hello")
            .await
            .unwrap();

        let msg = sub.next().await.unwrap();
        assert_eq!(msg.topic, "crypto/price/BTCUSDT");
        assert_eq!(msg.payload, b"hello".to_vec());
    }

    #[tokio::test]
    async fn test_unmatched_topics_are_filtered() {
        let transport = ChannelTransport::new(10);
        let mut sub = transport
            .subscribe(&filters(&["crypto/price/+"]))
            .await
            .unwrap();

        transport.publish("other/topic", b"x").await.unwrap();
        transport.publish("crypto/price/ETHUSDT", b"y").await.unwrap();

        let msg = sub.next().await.unwrap();
        assert_eq!(msg.topic, "crypto/price/ETHUSDT");
        assert!(sub.try_next().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let transport = ChannelTransport::new(10);
        let mut sub1 = transport.subscribe(&filters(&["a"])).await.unwrap();
        let mut sub2 = transport.subscribe(&filters(&["a"])).await.unwrap();
        assert_eq!(transport.subscriber_count(), 2);

        transport.publish("a", b"42").await.unwrap();

        assert_eq!(sub1.next().await.unwrap().payload, b"42".to_vec());
        assert_eq!(sub2.next().await.unwrap().payload, b"42".to_vec());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let transport = ChannelTransport::new(10);
        assert!(transport.publish("nobody/listens", b"x").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_kills_subscription() {
        let transport = ChannelTransport::new(10);
        let mut sub = transport.subscribe(&filters(&["a"])).await.unwrap();

        assert_eq!(transport.reset_connections(), 1);

        let err = sub.next().await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        assert!(err.is_transient());

        // Stays dead even if more traffic arrives
        transport.publish("a", b"late").await.unwrap();
        assert!(sub.try_next().is_err());
    }

    #[tokio::test]
    async fn test_invalid_filters_and_topics_rejected() {
        let transport = ChannelTransport::new(10);
        assert!(transport.subscribe(&[]).await.is_err());
        assert!(transport.subscribe(&filters(&[""])).await.is_err());
        assert!(transport.publish("crypto/price/+", b"x").await.is_err());
    }
}
