//! Engine assembly and lifecycle

use log::{error, info, warn};
use std::sync::Arc;
use tickwatch_core::{Symbol, Timestamp};
use tickwatch_gateway::Transport;
use tickwatch_ports::{Clock, PersistenceSink};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::alarms::{AlarmEngine, Thresholds};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::intake::{Intake, run_intake};
use crate::liveness::LivenessTracker;
use crate::presence::PresenceMonitor;
use crate::processor::Processor;
use crate::queue::IngestionQueue;
use crate::registry::RegistrationRegistry;
use crate::stats::{EngineStats, StatsSnapshot};

/// A configured, not yet running engine
///
/// All state lives here; several engines can run side by side in one process.
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn PersistenceSink>,
    clock: Arc<dyn Clock>,
    queue: Arc<IngestionQueue>,
    registry: Arc<RegistrationRegistry>,
    liveness: Arc<LivenessTracker>,
    stats: Arc<EngineStats>,
}

impl Engine {
    /// Validate `config` and build the engine's state
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn PersistenceSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            queue: Arc::new(IngestionQueue::new(config.queue_capacity)),
            registry: Arc::new(RegistrationRegistry::new()),
            liveness: Arc::new(LivenessTracker::new()),
            stats: Arc::new(EngineStats::new()),
            config,
            transport,
            sink,
            clock,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn the intake, processor, and presence monitor tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> EngineHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let filters = self.config.subscriptions();

        info!(
            "[ENGINE] Starting: transport={} sink={} clock={} queue_capacity={} subscriptions={:?}",
            self.transport.name(),
            self.sink.name(),
            self.clock.name(),
            self.config.queue_capacity,
            filters
        );

        let intake = Intake::new(
            self.queue.clone(),
            self.registry.clone(),
            self.liveness.clone(),
            self.stats.clone(),
            self.clock.clone(),
            self.config.topics.clone(),
        );
        let processor = Processor::new(
            self.queue.clone(),
            AlarmEngine::new(Thresholds::from(&self.config)),
            self.liveness.clone(),
            self.sink.clone(),
            self.stats.clone(),
            self.clock.clone(),
        );
        let presence = PresenceMonitor::new(
            self.registry.clone(),
            self.liveness.clone(),
            self.clock.clone(),
            self.config.presence_timeout(),
        );

        let tasks = vec![
            tokio::spawn(run_intake(
                intake,
                self.transport.clone(),
                filters,
                self.config.reconnect.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(processor.run(shutdown_rx.clone())),
            tokio::spawn(presence.run(
                self.sink.clone(),
                self.stats.clone(),
                self.config.presence_scan_interval(),
                shutdown_rx,
            )),
        ];

        EngineHandle {
            shutdown_tx,
            tasks,
            queue: self.queue,
            registry: self.registry,
            liveness: self.liveness,
            stats: self.stats,
        }
    }
}

/// Handle to a running engine
pub struct EngineHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    queue: Arc<IngestionQueue>,
    registry: Arc<RegistrationRegistry>,
    liveness: Arc<LivenessTracker>,
    stats: Arc<EngineStats>,
}

impl EngineHandle {
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Symbols from the most recent announcement
    pub fn registered_symbols(&self) -> Vec<Symbol> {
        self.registry.symbols()
    }

    pub fn last_seen(&self, symbol: &str) -> Option<Timestamp> {
        self.liveness.last_seen(symbol)
    }

    /// Entries waiting to be processed
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Signal every task to stop and wait for them
    ///
    /// Entries still queued are dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                error!("[ENGINE] Task ended abnormally: {}", e);
            }
        }

        let dropped = self.queue.clear();
        if dropped > 0 {
            warn!("[ENGINE] Dropped {} unprocessed entries at shutdown", dropped);
        }
        info!("[ENGINE] Stopped: {:?}", self.stats.snapshot());
    }
}
