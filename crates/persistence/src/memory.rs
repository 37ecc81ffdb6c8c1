use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tickwatch_core::{Alarm, AlarmKind, PriceSample};
use tickwatch_ports::{PersistenceSink, SinkError, SinkResult};

/// In-memory sink
///
/// Records are appended in write order. `set_failing(true)` makes every
/// subsequent write fail with `SinkError::Unavailable` until switched back.
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Mutex<Vec<PriceSample>>,
    alarms: Mutex<Vec<Alarm>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Toggle failure injection
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn samples(&self) -> Vec<PriceSample> {
        self.samples.lock().clone()
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.lock().clone()
    }

    /// Alarms of one kind, in write order
    pub fn alarms_of(&self, kind: AlarmKind) -> Vec<Alarm> {
        self.alarms
            .lock()
            .iter()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect()
    }

    /// Samples for one symbol, in write order
    pub fn samples_for(&self, symbol: &str) -> Vec<PriceSample> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
        self.alarms.lock().clear();
    }

    fn check(&self) -> SinkResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SinkError::Unavailable("memory sink set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn write_sample(&self, sample: &PriceSample) -> SinkResult<()> {
        self.check()?;
        self.samples.lock().push(sample.clone());
        Ok(())
    }

    async fn write_alarm(&self, alarm: &Alarm) -> SinkResult<()> {
        self.check()?;
        self.alarms.lock().push(alarm.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "MemorySink"
    }
}
