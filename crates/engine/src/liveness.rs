//! Last-seen tracking per symbol

use dashmap::DashMap;
use std::collections::HashMap;
use tickwatch_core::{Symbol, Timestamp};

/// Most recent time a sample was seen for each symbol
///
/// Written by the intake and the processor, read by the presence monitor.
/// Timestamps only move forward; entries are never removed.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    last_seen: DashMap<Symbol, Timestamp>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity for `symbol` at `at`; older timestamps are ignored
    pub fn touch(&self, symbol: &str, at: Timestamp) {
        self.last_seen
            .entry(symbol.to_string())
            .and_modify(|seen| {
                if at > *seen {
                    *seen = at;
                }
            })
            .or_insert(at);
    }

    pub fn last_seen(&self, symbol: &str) -> Option<Timestamp> {
        self.last_seen.get(symbol).map(|seen| *seen)
    }

    pub fn snapshot(&self) -> HashMap<Symbol, Timestamp> {
        self.last_seen
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_touch_keeps_latest() {
        let tracker = LivenessTracker::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(1);

        assert_eq!(tracker.last_seen("BTCUSDT"), None);
        tracker.touch("BTCUSDT", t1);
        tracker.touch("BTCUSDT", t0);
        assert_eq!(tracker.last_seen("BTCUSDT"), Some(t1));

        tracker.touch("ETHUSDT", t0);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.snapshot().get("ETHUSDT"), Some(&t0));
    }
}
