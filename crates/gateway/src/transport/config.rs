//! Transport configuration

use serde::{Deserialize, Serialize};

/// Topic names for price and announcement routing
///
/// Producers publish each symbol on its own price topic and periodically
/// announce their sensor list on a single well-known topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    /// Prefix of per-symbol price topics: `crypto/price/`
    pub price_prefix: String,
    /// Announcement topic: `sensor_monitors`
    pub announcement: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            price_prefix: "crypto/price/".to_string(),
            announcement: "sensor_monitors".to_string(),
        }
    }
}

impl Topics {
    /// Price topic for a specific symbol: `crypto/price/BTCUSDT`
    pub fn price(&self, symbol: &str) -> String {
        format!("{}{}", self.price_prefix, symbol)
    }

    /// Filter matching every price topic: `crypto/price/+`
    pub fn price_all(&self) -> String {
        format!("{}+", self.price_prefix)
    }

    /// Extract the symbol from a price topic
    pub fn symbol_of<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(&self.price_prefix)
            .filter(|s| !s.is_empty() && !s.contains('/'))
    }

    /// Whether the topic is the announcement topic
    pub fn is_announcement(&self, topic: &str) -> bool {
        topic == self.announcement
    }

    /// Full subscription set: one price topic per symbol (or the price
    /// wildcard when `symbols` is empty) plus the announcement topic
    pub fn subscriptions(&self, symbols: &[String]) -> Vec<String> {
        let mut filters: Vec<String> = if symbols.is_empty() {
            vec![self.price_all()]
        } else {
            symbols.iter().map(|s| self.price(s)).collect()
        };
        filters.push(self.announcement.clone());
        filters
    }
}
