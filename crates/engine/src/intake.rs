//! Delivery path from the transport into the engine
//!
//! [`Intake::handle`] is the delivery callback: it decodes the payload,
//! records liveness, and either enqueues a price or replaces the
//! registration set. It never blocks. [`run_intake`] owns the subscription
//! and re-establishes it with exponential backoff when the transport drops.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tickwatch_core::QueueEntry;
use tickwatch_gateway::{
    DecodeError, Envelope, Topics, Transport, decode_announcement, decode_price,
};
use tickwatch_ports::Clock;
use tokio::sync::watch;

use crate::config::ReconnectConfig;
use crate::liveness::LivenessTracker;
use crate::queue::IngestionQueue;
use crate::registry::RegistrationRegistry;
use crate::stats::EngineStats;

/// What a delivered envelope turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Price enqueued for processing
    Price { symbol: String, evicted: bool },
    /// Registration set replaced
    Announcement { symbols: usize },
}

pub struct Intake {
    queue: Arc<IngestionQueue>,
    registry: Arc<RegistrationRegistry>,
    liveness: Arc<LivenessTracker>,
    stats: Arc<EngineStats>,
    clock: Arc<dyn Clock>,
    topics: Topics,
}

impl Intake {
    pub fn new(
        queue: Arc<IngestionQueue>,
        registry: Arc<RegistrationRegistry>,
        liveness: Arc<LivenessTracker>,
        stats: Arc<EngineStats>,
        clock: Arc<dyn Clock>,
        topics: Topics,
    ) -> Self {
        Self {
            queue,
            registry,
            liveness,
            stats,
            clock,
            topics,
        }
    }

    /// Handle one delivered envelope
    ///
    /// Malformed payloads are logged, counted, and discarded.
    pub fn handle(&self, envelope: &Envelope) -> Result<Delivery, DecodeError> {
        self.stats.record_received();
        let result = self.route(envelope);
        if let Err(e) = &result {
            self.stats.record_malformed();
            warn!(
                "[INTAKE] Discarding malformed message on {}: {}",
                envelope.topic, e
            );
        }
        result
    }

    fn route(&self, envelope: &Envelope) -> Result<Delivery, DecodeError> {
        let received_at = self.clock.now();

        if self.topics.is_announcement(&envelope.topic) {
            let announcement = decode_announcement(&envelope.payload, received_at)?;
            self.registry.replace(&announcement);
            self.stats.record_announcement();
            return Ok(Delivery::Announcement {
                symbols: announcement.sensors.len(),
            });
        }

        let topic_symbol = self
            .topics
            .symbol_of(&envelope.topic)
            .ok_or_else(|| DecodeError::UnexpectedTopic(envelope.topic.clone()))?;

        let message = decode_price(&envelope.payload, received_at)?;
        if message.symbol != topic_symbol {
            return Err(DecodeError::SymbolMismatch {
                topic: topic_symbol.to_string(),
                payload: message.symbol,
            });
        }
        let symbol = message.symbol.clone();
        self.liveness.touch(&symbol, received_at);

        let evicted = self
            .queue
            .enqueue(QueueEntry::new(message, received_at))
            .is_some();
        self.stats.record_enqueued();
        if evicted {
            self.stats.record_evicted();
        }

        Ok(Delivery::Price { symbol, evicted })
    }
}

/// Exponential backoff between reconnect attempts
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl From<&ReconnectConfig> for ExponentialBackoff {
    fn from(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.factor,
        )
    }
}

/// Sleep for the next backoff delay; false if shutdown arrived first
async fn wait_before_retry(
    backoff: &mut ExponentialBackoff,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let delay = backoff.next_delay();
    info!("[INTAKE] Reconnecting in {:?}", delay);
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.changed() => false,
    }
}

/// Subscribe, pump deliveries into `intake`, and reconnect on failure
///
/// Every reconnect re-subscribes the full `filters` set. Messages published
/// while disconnected are lost.
pub async fn run_intake(
    intake: Intake,
    transport: Arc<dyn Transport>,
    filters: Vec<String>,
    reconnect: ReconnectConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = ExponentialBackoff::from(&reconnect);

    loop {
        if *shutdown.borrow() {
            break;
        }

        let subscribed = tokio::select! {
            result = transport.subscribe(&filters) => result,
            _ = shutdown.changed() => break,
        };

        let mut subscriber = match subscribed {
            Ok(subscriber) => {
                backoff.reset();
                info!(
                    "[INTAKE] Subscribed to {} topics via {}",
                    filters.len(),
                    transport.name()
                );
                subscriber
            }
            Err(e) => {
                warn!("[INTAKE] Subscribe failed: {}", e);
                if !wait_before_retry(&mut backoff, &mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        let lost = loop {
            tokio::select! {
                received = subscriber.next() => match received {
                    Ok(envelope) => {
                        // Errors are logged and counted inside
                        let _ = intake.handle(&envelope);
                    }
                    Err(e) => break e,
                },
                _ = shutdown.changed() => {
                    debug!("[INTAKE] Stopped");
                    return;
                }
            }
        };

        drop(subscriber);
        intake.stats.record_transport_reset();
        if lost.is_transient() {
            warn!("[INTAKE] Transport connection lost: {}", lost);
        } else {
            error!("[INTAKE] Transport closed: {}", lost);
        }

        if !wait_before_retry(&mut backoff, &mut shutdown).await {
            break;
        }
    }

    debug!("[INTAKE] Stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tickwatch_clock::ManualClock;

    struct Fixture {
        intake: Intake,
        queue: Arc<IngestionQueue>,
        registry: Arc<RegistrationRegistry>,
        liveness: Arc<LivenessTracker>,
        stats: Arc<EngineStats>,
        clock: Arc<ManualClock>,
    }

    fn fixture(capacity: usize) -> Fixture {
        let queue = Arc::new(IngestionQueue::new(capacity));
        let registry = Arc::new(RegistrationRegistry::new());
        let liveness = Arc::new(LivenessTracker::new());
        let stats = Arc::new(EngineStats::new());
        let clock = ManualClock::new(Some(Utc::now()));
        let intake = Intake::new(
            queue.clone(),
            registry.clone(),
            liveness.clone(),
            stats.clone(),
            clock.clone(),
            Topics::default(),
        );
        Fixture {
            intake,
            queue,
            registry,
            liveness,
            stats,
            clock,
        }
    }

    fn price(symbol: &str, price: &str) -> Envelope {
        Envelope::new(
            format!("crypto/price/{}", symbol),
            format!(
                r#"{{"symbol":"{}","price":"{}","timestamp":1718020800.0}}"#,
                symbol, price
            ),
        )
    }

    #[test]
    fn test_price_is_enqueued_and_marks_liveness() {
        let f = fixture(10);
        let delivery = f.intake.handle(&price("BTCUSDT", "64000.0000")).unwrap();

        assert_eq!(
            delivery,
            Delivery::Price {
                symbol: "BTCUSDT".to_string(),
                evicted: false
            }
        );
        let queued = f.queue.snapshot();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].message.price, 64000.0);
        assert_eq!(queued[0].enqueued_at, f.clock.now());
        assert_eq!(f.liveness.last_seen("BTCUSDT"), Some(f.clock.now()));
        assert_eq!(f.stats.snapshot().enqueued, 1);
    }

    #[test]
    fn test_announcement_replaces_registry() {
        let f = fixture(10);
        let envelope = Envelope::new(
            "sensor_monitors",
            r#"{"machine_id":"host-1","sensors":[{"sensor_id":"BTCUSDT","data_type":"USDT price","data_interval":0.5}]}"#,
        );

        let delivery = f.intake.handle(&envelope).unwrap();
        assert_eq!(delivery, Delivery::Announcement { symbols: 1 });
        assert_eq!(f.registry.symbols(), vec!["BTCUSDT"]);
        assert!(f.queue.is_empty());
        assert_eq!(f.stats.snapshot().announcements, 1);
    }

    #[test]
    fn test_malformed_messages_are_discarded() {
        let f = fixture(10);
        assert!(f.intake.handle(&Envelope::new("crypto/price/BTCUSDT", "{oops")).is_err());
        assert!(f.intake.handle(&price("BTCUSDT", "not-a-price")).is_err());
        assert!(f.intake.handle(&Envelope::new("sensor_monitors", "42")).is_err());
        assert!(matches!(
            f.intake.handle(&Envelope::new("elsewhere", "{}")),
            Err(DecodeError::UnexpectedTopic(_))
        ));

        assert!(f.queue.is_empty());
        assert!(f.liveness.is_empty());
        let snap = f.stats.snapshot();
        assert_eq!(snap.received, 4);
        assert_eq!(snap.malformed, 4);

        // Intake keeps working afterwards
        assert!(f.intake.handle(&price("BTCUSDT", "1.0")).is_ok());
    }

    #[test]
    fn test_payload_symbol_must_match_topic() {
        let f = fixture(10);
        let envelope = Envelope::new(
            "crypto/price/BTCUSDT",
            r#"{"symbol":"ETHUSDT","price":"3500.0000"}"#,
        );

        assert!(matches!(
            f.intake.handle(&envelope),
            Err(DecodeError::SymbolMismatch { .. })
        ));
        assert!(f.queue.is_empty());
        assert_eq!(f.liveness.last_seen("ETHUSDT"), None);
        assert_eq!(f.stats.snapshot().malformed, 1);
    }

    #[test]
    fn test_overflow_counts_evictions() {
        let f = fixture(2);
        f.intake.handle(&price("A", "1")).unwrap();
        f.intake.handle(&price("B", "1")).unwrap();
        let delivery = f.intake.handle(&price("C", "1")).unwrap();

        assert_eq!(
            delivery,
            Delivery::Price {
                symbol: "C".to_string(),
                evicted: true
            }
        );
        let symbols: Vec<String> = f
            .queue
            .snapshot()
            .iter()
            .map(|e| e.symbol().to_string())
            .collect();
        assert_eq!(symbols, vec!["B", "C"]);
        assert_eq!(f.stats.snapshot().evicted, 1);
        // Evicted symbols were still seen
        assert!(f.liveness.last_seen("A").is_some());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = ExponentialBackoff::from(&ReconnectConfig::default());
        let delays: Vec<u64> = (0..8)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 32000, 60000, 60000]
        );

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
