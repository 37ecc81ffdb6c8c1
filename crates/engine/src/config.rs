//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tickwatch_gateway::Topics;

use crate::error::ConfigError;

/// One year
const MAX_PRESENCE_TIMEOUT_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Reconnect backoff for the transport subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Multiplier applied after every failed attempt
    pub factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            factor: 2.0,
        }
    }
}

/// Configuration for the alerting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum buffered messages; overflow evicts the oldest
    pub queue_capacity: usize,
    /// A registered symbol silent for longer than this raises a presence alarm
    pub presence_timeout_ms: u64,
    pub presence_scan_interval_ms: u64,
    /// Strict: alarm when |variation| > threshold
    pub two_measurement_threshold_pct: f64,
    /// Inclusive: alarm when |variation| >= threshold
    pub total_variation_threshold_pct: f64,
    /// Symbols to subscribe to. Empty subscribes to every price topic.
    pub symbols: Vec<String>,
    pub topics: Topics,
    pub reconnect: ReconnectConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            presence_timeout_ms: 5000,
            presence_scan_interval_ms: 1000,
            two_measurement_threshold_pct: 0.5,
            total_variation_threshold_pct: 5.0,
            symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "DOGEUSDT".to_string(),
            ],
            topics: Topics::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid("queue_capacity", "must be at least 1"));
        }
        if self.presence_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "presence_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.presence_timeout_ms > MAX_PRESENCE_TIMEOUT_MS {
            return Err(ConfigError::invalid(
                "presence_timeout_ms",
                format!("must not exceed {}", MAX_PRESENCE_TIMEOUT_MS),
            ));
        }
        if self.presence_scan_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "presence_scan_interval_ms",
                "must be greater than 0",
            ));
        }
        check_threshold(
            "two_measurement_threshold_pct",
            self.two_measurement_threshold_pct,
        )?;
        check_threshold(
            "total_variation_threshold_pct",
            self.total_variation_threshold_pct,
        )?;
        if let Some(bad) = self
            .symbols
            .iter()
            .find(|s| s.is_empty() || s.contains(['/', '+', '#']))
        {
            return Err(ConfigError::invalid(
                "symbols",
                format!("'{}' is not a valid symbol", bad),
            ));
        }
        if self.topics.price_prefix.is_empty() {
            return Err(ConfigError::invalid("topics.price_prefix", "must not be empty"));
        }
        if self.topics.announcement.is_empty() {
            return Err(ConfigError::invalid("topics.announcement", "must not be empty"));
        }

        let reconnect = &self.reconnect;
        if reconnect.initial_delay_ms == 0 {
            return Err(ConfigError::invalid(
                "reconnect.initial_delay_ms",
                "must be greater than 0",
            ));
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            return Err(ConfigError::invalid(
                "reconnect.max_delay_ms",
                "must not be below initial_delay_ms",
            ));
        }
        if !reconnect.factor.is_finite() || reconnect.factor < 1.0 {
            return Err(ConfigError::invalid(
                "reconnect.factor",
                "must be a finite number >= 1",
            ));
        }
        Ok(())
    }

    /// Topic filters the engine subscribes to
    pub fn subscriptions(&self) -> Vec<String> {
        self.topics.subscriptions(&self.symbols)
    }

    pub fn presence_timeout(&self) -> chrono::Duration {
        let millis = self.presence_timeout_ms.min(MAX_PRESENCE_TIMEOUT_MS);
        chrono::Duration::milliseconds(millis as i64)
    }

    pub fn presence_scan_interval(&self) -> Duration {
        Duration::from_millis(self.presence_scan_interval_ms)
    }
}

fn check_threshold(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("{} is not a non-negative percentage", value),
        ));
    }
    Ok(())
}
