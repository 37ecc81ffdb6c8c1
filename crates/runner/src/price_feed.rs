//! Price Feed - simulated price producer
//!
//! Stands in for the producers that poll an exchange price API:
//! - Random-walk price per symbol, published every update interval
//! - Sensor announcement listing every symbol, published every announce interval
//!
//! Publishes through [`ProducerGateway`], so the engine sees exactly the
//! wire format a real producer sends.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tickwatch_core::{Price, SensorDescriptor};
use tickwatch_gateway::{GatewayError, ProducerGateway};
use tickwatch_ports::Clock;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::SimulatorConfig;

/// Lowest price the walk can reach
const PRICE_FLOOR: Price = 1e-8;

pub struct PriceFeedSimulator {
    config: SimulatorConfig,
    /// Current price per symbol
    prices: BTreeMap<String, Price>,
    gateway: ProducerGateway,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl PriceFeedSimulator {
    /// Create a feed; seeded from `config.seed` when set
    pub fn new(config: SimulatorConfig, gateway: ProducerGateway, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            prices: config.initial_prices.clone(),
            config,
            gateway,
            clock,
            rng,
        }
    }

    pub fn price(&self, symbol: &str) -> Option<Price> {
        self.prices.get(symbol).copied()
    }

    pub fn sensors(&self) -> Vec<SensorDescriptor> {
        let interval_secs = self.config.update_interval_ms as f64 / 1000.0;
        self.prices
            .keys()
            .map(|symbol| SensorDescriptor {
                sensor_id: symbol.clone(),
                data_type: "USDT price".to_string(),
                data_interval: interval_secs,
            })
            .collect()
    }

    /// Advance every symbol one step of the random walk
    pub fn next_prices(&mut self) -> Vec<(String, Price)> {
        let volatility = self.config.volatility_pct / 100.0;
        let mut updates = Vec::with_capacity(self.prices.len());

        for (symbol, price) in self.prices.iter_mut() {
            let change: f64 = self.rng.gen_range(-1.0..1.0);
            *price = (*price * (1.0 + volatility * change)).max(PRICE_FLOOR);
            updates.push((symbol.clone(), *price));
        }

        updates
    }

    /// Step the walk and publish every symbol
    pub async fn publish_tick(&mut self) -> Result<usize, GatewayError> {
        let now = self.clock.now();
        let updates = self.next_prices();
        for (symbol, price) in &updates {
            self.gateway.publish_price(symbol, *price, now).await?;
        }
        debug!("[FEED] Published {} prices", updates.len());
        Ok(updates.len())
    }

    /// Publish the sensor announcement
    pub async fn announce(&self) -> Result<(), GatewayError> {
        let sensors = self.sensors();
        self.gateway
            .publish_announcement(&self.config.machine_id, &sensors)
            .await
    }

    /// Publish until shutdown. Announces first so the engine registers the
    /// symbols before their prices arrive.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut announcements =
            tokio::time::interval(Duration::from_millis(self.config.announce_interval_ms));
        let mut updates =
            tokio::time::interval(Duration::from_millis(self.config.update_interval_ms));
        announcements.set_missed_tick_behavior(MissedTickBehavior::Delay);
        updates.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "[FEED] {} publishing {:?} every {} ms",
            self.config.machine_id,
            self.prices.keys().collect::<Vec<_>>(),
            self.config.update_interval_ms
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = announcements.tick() => {
                    if let Err(e) = self.announce().await {
                        warn!("[FEED] Announcement failed: {}", e);
                    }
                }
                _ = updates.tick() => {
                    if let Err(e) = self.publish_tick().await {
                        warn!("[FEED] Price publish failed: {}", e);
                    }
                }
            }
        }

        info!("[FEED] Stopped after {} messages", self.gateway.published());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwatch_clock::SystemClock;
    use tickwatch_gateway::{
        ChannelTransport, Topics, Transport, decode_announcement, decode_price,
    };

    fn feed(config: SimulatorConfig, transport: Arc<ChannelTransport>) -> PriceFeedSimulator {
        PriceFeedSimulator::new(
            config,
            ProducerGateway::new(transport, Topics::default()),
            Arc::new(SystemClock::new()),
        )
    }

    fn single(symbol: &str, price: Price) -> SimulatorConfig {
        let mut initial_prices = BTreeMap::new();
        initial_prices.insert(symbol.to_string(), price);
        SimulatorConfig {
            initial_prices,
            seed: Some(42),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_random_walk_stays_within_volatility() {
        let mut feed = feed(single("TEST", 100.0), Arc::new(ChannelTransport::default()));

        let mut previous = 100.0;
        for _ in 0..200 {
            let updates = feed.next_prices();
            assert_eq!(updates.len(), 1);
            let price = updates[0].1;
            // 0.2% max step
            assert!((price / previous - 1.0).abs() <= 0.002 + 1e-12);
            previous = price;
        }
        assert_eq!(feed.price("TEST"), Some(previous));
    }

    #[test]
    fn test_same_seed_same_walk() {
        let mut a = feed(single("TEST", 100.0), Arc::new(ChannelTransport::default()));
        let mut b = feed(single("TEST", 100.0), Arc::new(ChannelTransport::default()));
        for _ in 0..20 {
            assert_eq!(a.next_prices(), b.next_prices());
        }
    }

    #[test]
    fn test_sensors_describe_update_interval() {
        let feed = feed(SimulatorConfig::default(), Arc::new(ChannelTransport::default()));
        let sensors = feed.sensors();
        assert_eq!(sensors.len(), 3);
        assert!(sensors.iter().all(|s| s.data_type == "USDT price"));
        assert!(sensors.iter().all(|s| s.data_interval == 0.5));
    }

    #[tokio::test]
    async fn test_publishes_wire_messages() {
        let transport = Arc::new(ChannelTransport::new(64));
        let mut sub = transport
            .subscribe(&Topics::default().subscriptions(&[]))
            .await
            .unwrap();
        let mut feed = feed(SimulatorConfig::default(), transport.clone());

        feed.announce().await.unwrap();
        assert_eq!(feed.publish_tick().await.unwrap(), 3);

        let announcement = sub.next().await.unwrap();
        let ann = decode_announcement(&announcement.payload, chrono::Utc::now()).unwrap();
        assert_eq!(ann.machine_id, "tickwatch-sim");
        assert_eq!(
            ann.symbols().collect::<Vec<_>>(),
            vec!["BTCUSDT", "DOGEUSDT", "ETHUSDT"]
        );

        for _ in 0..3 {
            let envelope = sub.next().await.unwrap();
            let msg = decode_price(&envelope.payload, chrono::Utc::now()).unwrap();
            assert_eq!(envelope.topic, format!("crypto/price/{}", msg.symbol));
            assert!(msg.price > 0.0);
        }
    }
}
