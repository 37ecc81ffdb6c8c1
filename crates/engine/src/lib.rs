//! Tickwatch Engine
//!
//! Stream processing and alerting engine for published price updates.
//!
//! - **Ingestion Queue**: bounded, drop-oldest buffer between delivery and processing
//! - **Alarm Engine**: two-measurement and ratchet (total) variation rules
//! - **Presence Monitor**: liveness alarms for registered symbols that stop reporting
//! - **Registration Registry**: symbols producers announce, replaced atomically
//!
//! ## Architecture
//!
//! ```text
//!   Transport ──► Intake ──► IngestionQueue ──► Processor ──► PersistenceSink
//!                   │                                               ▲
//!                   ▼                                               │
//!        RegistrationRegistry + LivenessTracker ──► PresenceMonitor ┘
//! ```
//!
//! Three tasks run per engine: the intake (subscription and delivery
//! callback, with reconnect), the single processor, and the presence
//! monitor. They share one shutdown signal.

pub mod alarms;
pub mod config;
pub mod engine;
pub mod error;
pub mod intake;
pub mod liveness;
pub mod presence;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod stats;

// Re-export main types
pub use alarms::{AlarmEngine, Evaluation, PriceStore, Thresholds, variation_pct};
pub use config::{EngineConfig, ReconnectConfig};
pub use engine::{Engine, EngineHandle};
pub use error::{ConfigError, EngineError};
pub use intake::{Delivery, ExponentialBackoff, Intake, run_intake};
pub use liveness::LivenessTracker;
pub use presence::PresenceMonitor;
pub use processor::Processor;
pub use queue::IngestionQueue;
pub use registry::{Registration, RegistrationRegistry};
pub use stats::{EngineStats, StatsSnapshot};
