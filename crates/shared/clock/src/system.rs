use chrono::Utc;
use tickwatch_core::Timestamp;
use tickwatch_ports::Clock;

/// Wall-clock UTC time. Used by the running engine for arrival times,
/// alarm stamps and presence checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
