//! Single processing loop
//!
//! Dequeues entries in FIFO order, runs the variation rules, and writes
//! alarms and samples to the sink. Sink failures are logged, counted, and the
//! record is dropped; the loop never stops on them.

use log::{debug, info, warn};
use std::sync::Arc;
use tickwatch_core::{Alarm, QueueEntry};
use tickwatch_ports::{Clock, PersistenceSink};
use tokio::sync::watch;

use crate::alarms::{AlarmEngine, Evaluation};
use crate::liveness::LivenessTracker;
use crate::queue::IngestionQueue;
use crate::stats::EngineStats;

/// Log, count, and write one alarm. Shared by the processor and the presence monitor.
pub(crate) async fn persist_alarm(
    sink: &dyn PersistenceSink,
    stats: &EngineStats,
    alarm: &Alarm,
) {
    stats.record_alarm();
    info!(
        "[ALARM] {} {} at {}: {}",
        alarm.kind.title(),
        alarm.symbol,
        alarm.timestamp.to_rfc3339(),
        alarm.detail
    );

    if let Err(e) = sink.write_alarm(alarm).await {
        stats.record_sink_failure();
        warn!(
            "[SINK] {} failed to write {} alarm for {}: {}",
            sink.name(),
            alarm.kind,
            alarm.symbol,
            e
        );
    }
}

pub struct Processor {
    queue: Arc<IngestionQueue>,
    alarms: AlarmEngine,
    liveness: Arc<LivenessTracker>,
    sink: Arc<dyn PersistenceSink>,
    stats: Arc<EngineStats>,
    clock: Arc<dyn Clock>,
}

impl Processor {
    pub fn new(
        queue: Arc<IngestionQueue>,
        alarms: AlarmEngine,
        liveness: Arc<LivenessTracker>,
        sink: Arc<dyn PersistenceSink>,
        stats: Arc<EngineStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            alarms,
            liveness,
            sink,
            stats,
            clock,
        }
    }

    /// Process one entry: evaluate, persist alarms, then persist the sample
    pub async fn process(&mut self, entry: QueueEntry) -> Evaluation {
        let message = &entry.message;
        let evaluation = self.alarms.evaluate(message, self.clock.now());
        self.liveness.touch(&message.symbol, message.received_at);

        for alarm in &evaluation.alarms {
            persist_alarm(self.sink.as_ref(), &self.stats, alarm).await;
        }

        let sample = &evaluation.sample;
        debug!(
            "[PROCESSOR] {} {:.4} ({:+.4}%)",
            sample.symbol, sample.price, sample.pct_variation
        );
        if let Err(e) = self.sink.write_sample(sample).await {
            self.stats.record_sink_failure();
            warn!(
                "[SINK] {} failed to write sample for {}: {}",
                self.sink.name(),
                sample.symbol,
                e
            );
        }

        self.stats.record_processed();
        evaluation
    }

    /// Drain the queue until shutdown
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[PROCESSOR] Started");
        let queue = self.queue.clone();
        loop {
            tokio::select! {
                entry = queue.dequeue() => {
                    self.process(entry).await;
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("[PROCESSOR] Stopped");
    }

    pub fn alarm_engine(&self) -> &AlarmEngine {
        &self.alarms
    }
}
