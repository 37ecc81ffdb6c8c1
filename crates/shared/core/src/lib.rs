//! Tickwatch Core Domain
//!
//! Pure domain types for the Tickwatch price alerting engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Alarm, AlarmKind, Announcement, PriceMessage, PriceSample, PriceState, QueueEntry,
    SensorDescriptor,
};
pub use values::{Price, Symbol, Timestamp};
