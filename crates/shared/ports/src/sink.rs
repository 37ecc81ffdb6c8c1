use async_trait::async_trait;
use tickwatch_core::{Alarm, PriceSample};

use crate::error::SinkResult;

/// Port for the durable store of samples and alarms
///
/// Each call is independent. Implementations report failures through
/// `SinkError` and must not retry or buffer internally; the caller drops the
/// record and moves on.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist one raw price sample
    async fn write_sample(&self, sample: &PriceSample) -> SinkResult<()>;

    /// Persist one alarm
    async fn write_alarm(&self, alarm: &Alarm) -> SinkResult<()>;

    /// Get the sink's name/identifier for logging
    fn name(&self) -> &str {
        "PersistenceSink"
    }
}
