//! Presence monitor
//!
//! On every tick, each registered symbol whose last sample is older than the
//! presence timeout (or that was never seen) raises a `PresenceTimeout`
//! alarm. Alarms repeat on every tick while the condition holds.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tickwatch_core::{Alarm, AlarmKind};
use tickwatch_ports::{Clock, PersistenceSink};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::liveness::LivenessTracker;
use crate::processor::persist_alarm;
use crate::registry::RegistrationRegistry;
use crate::stats::EngineStats;

pub struct PresenceMonitor {
    registry: Arc<RegistrationRegistry>,
    liveness: Arc<LivenessTracker>,
    clock: Arc<dyn Clock>,
    timeout: chrono::Duration,
}

impl PresenceMonitor {
    pub fn new(
        registry: Arc<RegistrationRegistry>,
        liveness: Arc<LivenessTracker>,
        clock: Arc<dyn Clock>,
        timeout: chrono::Duration,
    ) -> Self {
        Self {
            registry,
            liveness,
            clock,
            timeout,
        }
    }

    /// One pass over the current registration set
    pub fn scan(&self) -> Vec<Alarm> {
        let now = self.clock.now();
        let registration = self.registry.snapshot();
        let kind = AlarmKind::PresenceTimeout;

        registration
            .symbols
            .iter()
            .filter_map(|symbol| match self.liveness.last_seen(symbol) {
                Some(seen) => {
                    let elapsed = now - seen;
                    (elapsed > self.timeout).then(|| {
                        Alarm::new(
                            now,
                            symbol.as_str(),
                            kind,
                            format!(
                                "{}: silent for {} ms (timeout {} ms)",
                                kind.title(),
                                elapsed.num_milliseconds(),
                                self.timeout.num_milliseconds()
                            ),
                        )
                    })
                }
                None => Some(Alarm::new(
                    now,
                    symbol.as_str(),
                    kind,
                    format!("{}: no sample received yet", kind.title()),
                )),
            })
            .collect()
    }

    /// Scan every `interval` until shutdown, persisting alarms
    pub async fn run(
        self,
        sink: Arc<dyn PersistenceSink>,
        stats: Arc<EngineStats>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        info!(
            "[PRESENCE] Monitoring every {:?}, timeout {} ms",
            interval,
            self.timeout.num_milliseconds()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let alarms = self.scan();
                    if alarms.is_empty() {
                        debug!("[PRESENCE] All registered symbols reporting");
                    }
                    for alarm in &alarms {
                        persist_alarm(sink.as_ref(), &stats, alarm).await;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        debug!("[PRESENCE] Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tickwatch_clock::ManualClock;
    use tickwatch_core::{Announcement, SensorDescriptor};

    struct Fixture {
        clock: Arc<ManualClock>,
        registry: Arc<RegistrationRegistry>,
        liveness: Arc<LivenessTracker>,
        monitor: PresenceMonitor,
    }

    fn fixture(timeout_ms: i64) -> Fixture {
        let clock = ManualClock::new(Some(Utc::now()));
        let registry = Arc::new(RegistrationRegistry::new());
        let liveness = Arc::new(LivenessTracker::new());
        let monitor = PresenceMonitor::new(
            registry.clone(),
            liveness.clone(),
            clock.clone(),
            chrono::Duration::milliseconds(timeout_ms),
        );
        Fixture {
            clock,
            registry,
            liveness,
            monitor,
        }
    }

    fn register(registry: &RegistrationRegistry, symbols: &[&str]) {
        registry.replace(&Announcement {
            machine_id: "host-1".to_string(),
            sensors: symbols
                .iter()
                .map(|s| SensorDescriptor {
                    sensor_id: s.to_string(),
                    data_type: "USDT price".to_string(),
                    data_interval: 0.5,
                })
                .collect(),
            received_at: Utc::now(),
        });
    }

    #[test]
    fn test_silent_symbol_alarms_after_timeout() {
        let f = fixture(5000);
        register(&f.registry, &["BTCUSDT"]);
        f.liveness.touch("BTCUSDT", f.clock.now());

        f.clock.advance(chrono::Duration::seconds(4));
        assert!(f.monitor.scan().is_empty());

        f.clock.advance(chrono::Duration::seconds(2));
        let alarms = f.monitor.scan();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].symbol, "BTCUSDT");
        assert_eq!(alarms[0].kind, AlarmKind::PresenceTimeout);
        assert_eq!(alarms[0].timestamp, f.clock.now());
    }

    #[test]
    fn test_exactly_at_timeout_does_not_alarm() {
        let f = fixture(5000);
        register(&f.registry, &["BTCUSDT"]);
        f.liveness.touch("BTCUSDT", f.clock.now());

        f.clock.advance(chrono::Duration::milliseconds(5000));
        assert!(f.monitor.scan().is_empty());
    }

    #[test]
    fn test_alarm_repeats_every_scan_until_sample() {
        let f = fixture(5000);
        register(&f.registry, &["ETHUSDT"]);
        f.liveness.touch("ETHUSDT", f.clock.now());
        f.clock.advance(chrono::Duration::seconds(6));

        assert_eq!(f.monitor.scan().len(), 1);
        f.clock.advance(chrono::Duration::seconds(1));
        assert_eq!(f.monitor.scan().len(), 1);

        f.liveness.touch("ETHUSDT", f.clock.now());
        assert!(f.monitor.scan().is_empty());
    }

    #[test]
    fn test_never_seen_symbol_alarms_immediately() {
        let f = fixture(5000);
        register(&f.registry, &["DOGEUSDT"]);
        let alarms = f.monitor.scan();
        assert_eq!(alarms.len(), 1);
        assert!(alarms[0].detail.contains("no sample"));
    }

    #[test]
    fn test_unregistered_symbols_are_ignored() {
        let f = fixture(5000);
        f.liveness.touch("BTCUSDT", f.clock.now());
        f.clock.advance(chrono::Duration::seconds(60));
        assert!(f.monitor.scan().is_empty());

        // Deregistered by a later announcement
        register(&f.registry, &["BTCUSDT"]);
        assert_eq!(f.monitor.scan().len(), 1);
        register(&f.registry, &["ETHUSDT"]);
        let alarms = f.monitor.scan();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].symbol, "ETHUSDT");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_persists_alarms_each_tick() {
        let f = fixture(5000);
        register(&f.registry, &["BTCUSDT"]);
        let sink = tickwatch_persistence::MemorySink::new();
        let stats = Arc::new(EngineStats::new());
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(f.monitor.run(
            sink.clone(),
            stats.clone(),
            Duration::from_secs(1),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(sink.alarms_of(AlarmKind::PresenceTimeout).len(), 3);
        assert_eq!(stats.snapshot().alarms_raised, 3);
    }
}
