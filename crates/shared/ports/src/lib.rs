//! Tickwatch Ports
//!
//! Port definitions (traits) for the Tickwatch engine.
//! These define the boundaries between the alerting logic and infrastructure.

mod clock;
mod error;
mod sink;

pub use clock::Clock;
pub use error::{SinkError, SinkResult};
pub use sink::PersistenceSink;
