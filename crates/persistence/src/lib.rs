//! Tickwatch Persistence
//!
//! Adapters implementing the [`PersistenceSink`] port:
//!
//! - [`LogSink`]: writes every record to the log, stores nothing
//! - [`MemorySink`]: keeps records in memory, with failure injection for tests
//! - [`PostgresSink`]: inserts into the `crypto_data` / `crypto_alarms` tables
//!
//! No sink retries or buffers. A failed write is reported once and the
//! record is gone.

mod log_sink;
mod memory;
mod postgres;

pub use log_sink::LogSink;
pub use memory::MemorySink;
pub use postgres::{PostgresConfig, PostgresSink};

// Re-export the port for convenience
pub use tickwatch_ports::{PersistenceSink, SinkError, SinkResult};
