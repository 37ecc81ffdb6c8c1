//! Bootstrap - builds a runnable system from [`RunnerConfig`]
//!
//! Wires the in-process transport, the configured sink, the system clock,
//! the engine, and (optionally) the simulated price feed.

use log::{info, warn};
use std::sync::Arc;
use tickwatch_clock::SystemClock;
use tickwatch_engine::{Engine, EngineHandle};
use tickwatch_gateway::{ChannelTransport, ProducerGateway};
use tickwatch_persistence::{LogSink, MemorySink, PersistenceSink, PostgresSink};
use tickwatch_ports::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, RunnerConfig, SinkConfig};
use crate::price_feed::PriceFeedSimulator;

/// Build the configured sink. The memory sink is also returned concretely
/// so callers can inspect what was written.
pub fn build_sink(
    config: &SinkConfig,
) -> Result<(Arc<dyn PersistenceSink>, Option<Arc<MemorySink>>), ConfigError> {
    let mut memory = None;
    let sink: Arc<dyn PersistenceSink> = match config {
        SinkConfig::Log => Arc::new(LogSink::new()),
        SinkConfig::Memory => {
            let sink = MemorySink::new();
            memory = Some(sink.clone());
            sink
        }
        SinkConfig::Postgres(postgres) => Arc::new(PostgresSink::new(postgres.clone())?),
    };
    Ok((sink, memory))
}

/// A fully wired, not yet running system
pub struct Bootstrap {
    pub transport: Arc<ChannelTransport>,
    pub sink: Arc<dyn PersistenceSink>,
    pub memory: Option<Arc<MemorySink>>,
    pub engine: Engine,
    pub feed: Option<PriceFeedSimulator>,
}

impl Bootstrap {
    pub fn with_config(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let transport = Arc::new(ChannelTransport::new(config.channel_capacity));
        let (sink, memory) = build_sink(&config.sink)?;

        let feed = config.simulator.clone().map(|simulator| {
            let gateway = ProducerGateway::new(transport.clone(), config.engine.topics.clone());
            PriceFeedSimulator::new(simulator, gateway, clock.clone())
        });

        if let Some(simulator) = &config.simulator {
            let unsubscribed: Vec<String> = simulator
                .symbols()
                .into_iter()
                .filter(|s| !config.engine.symbols.is_empty() && !config.engine.symbols.contains(s))
                .collect();
            if !unsubscribed.is_empty() {
                warn!(
                    "[FEED] Simulated symbols {:?} are not subscribed by the engine",
                    unsubscribed
                );
            }
        }

        let engine = Engine::new(config.engine, transport.clone(), sink.clone(), clock)?;

        Ok(Self {
            transport,
            sink,
            memory,
            engine,
            feed,
        })
    }

    /// Start the engine, then the feed
    pub fn start(self) -> RunningSystem {
        let engine = self.engine.start();
        let (feed_shutdown, feed_rx) = watch::channel(false);
        let feed = self.feed.map(|feed| tokio::spawn(feed.run(feed_rx)));

        info!(
            "[RUNNER] Started with sink {}{}",
            self.sink.name(),
            if feed.is_some() { " and simulated feed" } else { "" }
        );

        RunningSystem {
            engine,
            feed,
            feed_shutdown,
            transport: self.transport,
            memory: self.memory,
        }
    }
}

/// Handle to the running engine and feed
pub struct RunningSystem {
    pub engine: EngineHandle,
    feed: Option<JoinHandle<()>>,
    feed_shutdown: watch::Sender<bool>,
    pub transport: Arc<ChannelTransport>,
    pub memory: Option<Arc<MemorySink>>,
}

impl RunningSystem {
    /// Stop the feed first, then the engine
    pub async fn shutdown(self) {
        let _ = self.feed_shutdown.send(true);
        if let Some(feed) = self.feed {
            if let Err(e) = feed.await {
                warn!("[RUNNER] Feed task ended abnormally: {}", e);
            }
        }
        self.engine.shutdown().await;
        info!("[RUNNER] Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwatch_persistence::PostgresConfig;

    #[test]
    fn test_build_sinks() {
        let (sink, memory) = build_sink(&SinkConfig::Log).unwrap();
        assert_eq!(sink.name(), "LogSink");
        assert!(memory.is_none());

        let (sink, memory) = build_sink(&SinkConfig::Memory).unwrap();
        assert_eq!(sink.name(), "MemorySink");
        assert!(memory.is_some());

        // Postgres connects lazily, so building needs no database
        let (sink, _) = build_sink(&SinkConfig::Postgres(PostgresConfig::default())).unwrap();
        assert_eq!(sink.name(), "PostgresSink");
    }

    #[test]
    fn test_bootstrap_without_feed() {
        let config = RunnerConfig {
            sink: SinkConfig::Memory,
            simulator: None,
            ..RunnerConfig::default()
        };
        let bootstrap = Bootstrap::with_config(config).unwrap();
        assert!(bootstrap.feed.is_none());
        assert!(bootstrap.memory.is_some());
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let mut config = RunnerConfig::default();
        config.engine.presence_timeout_ms = 0;
        assert!(matches!(
            Bootstrap::with_config(config),
            Err(ConfigError::Engine(_))
        ));
    }
}
