//! Runner configuration (JSON)
//!
//! ```json
//! {
//!   "engine": { "queue_capacity": 100, "symbols": ["BTCUSDT"] },
//!   "sink": { "kind": "postgres", "url": "host=localhost port=8812 user=admin password=quest dbname=qdb" },
//!   "simulator": { "update_interval_ms": 500, "seed": 7 }
//! }
//! ```
//!
//! Every section is optional. An omitted `simulator` runs the default
//! simulated feed; `"simulator": null` disables it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tickwatch_engine::{EngineConfig, EngineError};
use tickwatch_persistence::{PostgresConfig, SinkError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid engine config: {0}")]
    Engine(#[from] tickwatch_engine::ConfigError),
    #[error("Engine start-up failed: {0}")]
    Startup(#[from] EngineError),
    #[error("Invalid sink config: {0}")]
    Sink(#[from] SinkError),
    #[error("Invalid simulator config: {0}")]
    Simulator(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Where samples and alarms go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Log every record, store nothing
    #[default]
    Log,
    /// Keep records in memory
    Memory,
    Postgres(PostgresConfig),
}

/// Simulated price producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Reported as `machine_id` in announcements
    pub machine_id: String,
    /// Starting price per symbol; also the set of symbols announced
    pub initial_prices: BTreeMap<String, f64>,
    /// Maximum move per update, in percent
    pub volatility_pct: f64,
    pub update_interval_ms: u64,
    pub announce_interval_ms: u64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let mut initial_prices = BTreeMap::new();
        initial_prices.insert("BTCUSDT".to_string(), 97_250.12);
        initial_prices.insert("ETHUSDT".to_string(), 3_480.55);
        initial_prices.insert("DOGEUSDT".to_string(), 0.3215);

        Self {
            machine_id: "tickwatch-sim".to_string(),
            initial_prices,
            volatility_pct: 0.2,
            update_interval_ms: 500,
            announce_interval_ms: 10_000,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_prices.is_empty() {
            return Err(ConfigError::Simulator(
                "initial_prices must name at least one symbol".to_string(),
            ));
        }
        if let Some((symbol, price)) = self
            .initial_prices
            .iter()
            .find(|(s, p)| s.is_empty() || !p.is_finite() || **p <= 0.0)
        {
            return Err(ConfigError::Simulator(format!(
                "invalid initial price {} for '{}'",
                price, symbol
            )));
        }
        if !self.volatility_pct.is_finite() || !(0.0..100.0).contains(&self.volatility_pct) {
            return Err(ConfigError::Simulator(
                "volatility_pct must be in [0, 100)".to_string(),
            ));
        }
        if self.update_interval_ms == 0 || self.announce_interval_ms == 0 {
            return Err(ConfigError::Simulator(
                "intervals must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.initial_prices.keys().cloned().collect()
    }
}

/// Top-level configuration for the `tickwatch` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub engine: EngineConfig,
    pub sink: SinkConfig,
    /// Backlog of the in-process transport
    pub channel_capacity: usize,
    pub simulator: Option<SimulatorConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            sink: SinkConfig::default(),
            channel_capacity: 1000,
            simulator: Some(SimulatorConfig::default()),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if let SinkConfig::Postgres(postgres) = &self.sink {
            postgres.validate()?;
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }
        if let Some(simulator) = &self.simulator {
            simulator.validate()?;
        }
        Ok(())
    }
}

/// Load runner configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<RunnerConfig, ConfigError> {
    let config: RunnerConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.sink, SinkConfig::Log);
        assert!(config.simulator.is_some());
    }

    #[test]
    fn test_postgres_sink() {
        let config = load_config_from_str(
            r#"{"sink": {"kind": "postgres", "url": "postgres://u:p@db:5432/x", "alarm_table": "alarms"}}"#,
        )
        .unwrap();

        match config.sink {
            SinkConfig::Postgres(pg) => {
                assert_eq!(pg.url, "postgres://u:p@db:5432/x");
                assert_eq!(pg.sample_table, "crypto_data");
                assert_eq!(pg.alarm_table, "alarms");
            }
            other => panic!("unexpected sink {:?}", other),
        }
    }

    #[test]
    fn test_null_simulator_disables_feed() {
        let config = load_config_from_str(r#"{"sink": {"kind": "memory"}, "simulator": null}"#)
            .unwrap();
        assert_eq!(config.sink, SinkConfig::Memory);
        assert!(config.simulator.is_none());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            load_config_from_str(r#"{"engine": {"queue_capacity": 0}}"#),
            Err(ConfigError::Engine(_))
        ));
        assert!(matches!(
            load_config_from_str(r#"{"sink": {"kind": "postgres", "sample_table": "x y"}}"#),
            Err(ConfigError::Sink(_))
        ));
        assert!(matches!(
            load_config_from_str(r#"{"sink": {"kind": "kafka"}}"#),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            load_config_from_str(r#"{"simulator": {"initial_prices": {}}}"#),
            Err(ConfigError::Simulator(_))
        ));
        assert!(matches!(
            load_config("/nonexistent/tickwatch.json"),
            Err(ConfigError::IoError(_))
        ));
    }
}
