//! Producer Gateway - publishes prices and announcements in wire format
//!
//! Used by price producers (the simulated feed, or any poller of an external
//! price API) to put updates on the transport.

use crate::error::GatewayError;
use crate::messages::{AnnouncementPayload, PricePayload};
use crate::transport::{Publisher, Topics};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tickwatch_core::{Price, SensorDescriptor, Timestamp};

/// Producer-side gateway
pub struct ProducerGateway {
    publisher: Arc<dyn Publisher>,
    topics: Topics,
    /// Number of payloads published successfully
    published: AtomicU64,
}

impl ProducerGateway {
    pub fn new(publisher: Arc<dyn Publisher>, topics: Topics) -> Self {
        Self {
            publisher,
            topics,
            published: AtomicU64::new(0),
        }
    }

    /// Publish a price update on the symbol's price topic
    pub async fn publish_price(
        &self,
        symbol: &str,
        price: Price,
        published_at: Timestamp,
    ) -> Result<(), GatewayError> {
        if symbol.is_empty() {
            return Err(GatewayError::InvalidMessage("empty symbol".to_string()));
        }
        if !price.is_finite() {
            return Err(GatewayError::InvalidMessage(format!(
                "non-finite price for {}",
                symbol
            )));
        }

        let payload = PricePayload::new(symbol, price).with_timestamp(published_at);
        let payload = serde_json::to_vec(&payload)?;
        let topic = self.topics.price(symbol);

        debug!("Publishing price {} {:.4} on topic {}", symbol, price, topic);

        self.publisher
            .publish(&topic, &payload)
            .await
            .map_err(GatewayError::Transport)?;

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Publish the producer's full sensor list on the announcement topic
    pub async fn publish_announcement(
        &self,
        machine_id: &str,
        sensors: &[SensorDescriptor],
    ) -> Result<(), GatewayError> {
        let payload = serde_json::to_vec(&AnnouncementPayload::new(machine_id, sensors))?;

        debug!(
            "Publishing announcement from {} with {} sensors",
            machine_id,
            sensors.len()
        );

        self.publisher
            .publish(&self.topics.announcement, &payload)
            .await
            .map_err(GatewayError::Transport)?;

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of payloads published so far
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{decode_announcement, decode_price};
    use crate::transport::Transport;
    use crate::transport::channel::ChannelTransport;
    use chrono::Utc;

    fn sensor(id: &str) -> SensorDescriptor {
        SensorDescriptor {
            sensor_id: id.to_string(),
            data_type: "USDT price".to_string(),
            data_interval: 0.5,
        }
    }

    #[tokio::test]
    async fn test_publish_price_reaches_symbol_topic() {
        let transport = Arc::new(ChannelTransport::new(16));
        let topics = Topics::default();
        let mut sub = transport
            .subscribe(&[topics.price("BTCUSDT")])
            .await
            .unwrap();
        let gateway = ProducerGateway::new(transport.clone(), topics);

        gateway
            .publish_price("ETHUSDT", 3500.0, Utc::now())
            .await
            .unwrap();
        gateway
            .publish_price("BTCUSDT", 64000.123456, Utc::now())
            .await
            .unwrap();

        let envelope = sub.next().await.unwrap();
        assert_eq!(envelope.topic, "crypto/price/BTCUSDT");

        let msg = decode_price(&envelope.payload, Utc::now()).unwrap();
        assert_eq!(msg.symbol, "BTCUSDT");
        assert!((msg.price - 64000.1235).abs() < 1e-9);
        assert!(msg.published_at.is_some());
        assert_eq!(gateway.published(), 2);
    }

    #[tokio::test]
    async fn test_publish_announcement() {
        let transport = Arc::new(ChannelTransport::new(16));
        let topics = Topics::default();
        let mut sub = transport
            .subscribe(&[topics.announcement.clone()])
            .await
            .unwrap();
        let gateway = ProducerGateway::new(transport.clone(), topics);

        gateway
            .publish_announcement("host-1", &[sensor("BTCUSDT"), sensor("DOGEUSDT")])
            .await
            .unwrap();

        let envelope = sub.next().await.unwrap();
        let ann = decode_announcement(&envelope.payload, Utc::now()).unwrap();
        assert_eq!(ann.machine_id, "host-1");
        assert_eq!(ann.symbols().collect::<Vec<_>>(), vec!["BTCUSDT", "DOGEUSDT"]);
    }

    #[tokio::test]
    async fn test_invalid_price_rejected() {
        let gateway = ProducerGateway::new(Arc::new(ChannelTransport::new(4)), Topics::default());
        assert!(gateway.publish_price("", 1.0, Utc::now()).await.is_err());
        assert!(gateway
            .publish_price("BTCUSDT", f64::INFINITY, Utc::now())
            .await
            .is_err());
        assert_eq!(gateway.published(), 0);
    }
}
