//! Price update payload: `{"symbol": "BTCUSDT", "price": "64000.1234", "timestamp": 1718000000.5}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tickwatch_core::{Price, PriceMessage, Timestamp};

use crate::error::DecodeError;

/// Price update as published on `crypto/price/{symbol}`
///
/// Producers send the price as a fixed-precision string; plain JSON numbers
/// are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePayload {
    #[serde(default)]
    pub symbol: String,
    #[serde(
        serialize_with = "serialize_price",
        deserialize_with = "deserialize_price"
    )]
    pub price: Price,
    /// Producer clock, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl PricePayload {
    pub fn new(symbol: impl Into<String>, price: Price) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, published_at: Timestamp) -> Self {
        self.timestamp = Some(published_at.timestamp_micros() as f64 / 1_000_000.0);
        self
    }

    /// Producer timestamp, if present and representable
    pub fn published_at(&self) -> Option<Timestamp> {
        let secs = self.timestamp.filter(|t| t.is_finite() && *t >= 0.0)?;
        DateTime::<Utc>::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

fn serialize_price<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.4}", price))
}

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => Ok(n),
        RawPrice::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Decode a raw price payload into a [`PriceMessage`] stamped with `received_at`
///
/// Rejects payloads that are not JSON, lack a symbol, or carry a non-finite
/// price. An unusable producer timestamp is dropped, not rejected.
pub fn decode_price(payload: &[u8], received_at: Timestamp) -> Result<PriceMessage, DecodeError> {
    let raw: PricePayload = serde_json::from_slice(payload)?;

    let symbol = raw.symbol.trim();
    if symbol.is_empty() {
        return Err(DecodeError::EmptySymbol);
    }
    if !raw.price.is_finite() {
        return Err(DecodeError::InvalidPrice(raw.price.to_string()));
    }

    let message = PriceMessage::new(symbol, raw.price, received_at);
    Ok(match raw.published_at() {
        Some(published_at) => message.with_published_at(published_at),
        None => message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_string_price() {
        let msg = decode_price(
            br#"{"symbol":"BTCUSDT","price":"64000.1234","timestamp":1718020800.25}"#,
            now(),
        )
        .unwrap();

        assert_eq!(msg.symbol, "BTCUSDT");
        assert!((msg.price - 64000.1234).abs() < 1e-9);
        assert_eq!(msg.received_at, now());
        assert_eq!(
            msg.published_at,
            Some(Utc.timestamp_millis_opt(1_718_020_800_250).unwrap())
        );
    }

    #[test]
    fn test_decode_numeric_price_without_timestamp() {
        let msg = decode_price(br#"{"symbol":"ETHUSDT","price":3500.5}"#, now()).unwrap();
        assert_eq!(msg.price, 3500.5);
        assert_eq!(msg.published_at, None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode_price(b"not json", now()),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode_price(br#"{"symbol":"","price":"1.0"}"#, now()),
            Err(DecodeError::EmptySymbol)
        ));
        assert!(matches!(
            decode_price(br#"{"price":"1.0"}"#, now()),
            Err(DecodeError::EmptySymbol)
        ));
        assert!(matches!(
            decode_price(br#"{"symbol":"BTCUSDT","price":"abc"}"#, now()),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode_price(br#"{"symbol":"BTCUSDT","price":"NaN"}"#, now()),
            Err(DecodeError::InvalidPrice(_))
        ));
        assert!(decode_price(br#"{"symbol":"BTCUSDT"}"#, now()).is_err());
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        let msg = decode_price(
            br#"{"symbol":"BTCUSDT","price":"1.0","timestamp":-5}"#,
            now(),
        )
        .unwrap();
        assert_eq!(msg.published_at, None);
    }

    #[test]
    fn test_price_serialized_with_four_decimals() {
        let json = serde_json::to_string(&PricePayload::new("DOGEUSDT", 0.123456)).unwrap();
        assert_eq!(json, r#"{"symbol":"DOGEUSDT","price":"0.1235"}"#);
    }
}
