//! Tickwatch Runner
//!
//! Assembles the alerting engine with a transport, a persistence sink, and
//! an optional simulated price producer:
//!
//! - **Config**: JSON configuration for every component
//! - **Bootstrap**: builds and starts the system from a [`RunnerConfig`]
//! - **Price Feed**: random-walk producer publishing prices and announcements
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────────────┐
//!   │ PriceFeedSimulator │  crypto/price/{symbol}, sensor_monitors
//!   └─────────┬──────────┘
//!             │ ProducerGateway
//!   ┌─────────▼──────────┐
//!   │  ChannelTransport  │
//!   └─────────┬──────────┘
//!             │
//!   ┌─────────▼──────────┐      ┌─────────────────┐
//!   │       Engine       ├─────▶│ PersistenceSink │  log | memory | postgres
//!   └────────────────────┘      └─────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod price_feed;

pub use bootstrap::{Bootstrap, RunningSystem, build_sink};
pub use config::{
    ConfigError, RunnerConfig, SimulatorConfig, SinkConfig, load_config, load_config_from_str,
};
pub use price_feed::PriceFeedSimulator;
