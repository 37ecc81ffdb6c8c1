//! Engine counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared by the engine tasks
#[derive(Debug, Default)]
pub struct EngineStats {
    received: AtomicU64,
    malformed: AtomicU64,
    announcements: AtomicU64,
    enqueued: AtomicU64,
    evicted: AtomicU64,
    processed: AtomicU64,
    alarms_raised: AtomicU64,
    sink_failures: AtomicU64,
    transport_resets: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub malformed: u64,
    pub announcements: u64,
    pub enqueued: u64,
    pub evicted: u64,
    pub processed: u64,
    pub alarms_raised: u64,
    pub sink_failures: u64,
    pub transport_resets: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        bump(&self.received);
    }

    pub fn record_malformed(&self) {
        bump(&self.malformed);
    }

    pub fn record_announcement(&self) {
        bump(&self.announcements);
    }

    pub fn record_enqueued(&self) {
        bump(&self.enqueued);
    }

    pub fn record_evicted(&self) {
        bump(&self.evicted);
    }

    pub fn record_processed(&self) {
        bump(&self.processed);
    }

    pub fn record_alarm(&self) {
        bump(&self.alarms_raised);
    }

    pub fn record_sink_failure(&self) {
        bump(&self.sink_failures);
    }

    pub fn record_transport_reset(&self) {
        bump(&self.transport_resets);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            received: load(&self.received),
            malformed: load(&self.malformed),
            announcements: load(&self.announcements),
            enqueued: load(&self.enqueued),
            evicted: load(&self.evicted),
            processed: load(&self.processed),
            alarms_raised: load(&self.alarms_raised),
            sink_failures: load(&self.sink_failures),
            transport_resets: load(&self.transport_resets),
        }
    }
}
