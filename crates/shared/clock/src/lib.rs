//! Tickwatch Clock Infrastructure
//!
//! Provides time sources for production and tests:
//!
//! - [`SystemClock`]: wall-clock UTC time
//! - [`ManualClock`]: frozen time that only moves when advanced, so presence
//!   timeouts can be exercised without sleeping
//!
//! ## Usage
//!
//! ```ignore
//! use tickwatch_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::seconds(6));
//! assert_eq!(clock.now() - before, Duration::seconds(6));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use tickwatch_ports::Clock;
