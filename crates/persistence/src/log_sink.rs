use async_trait::async_trait;
use log::info;
use tickwatch_core::{Alarm, PriceSample};
use tickwatch_ports::{PersistenceSink, SinkResult};

/// Sink that only logs. Used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PersistenceSink for LogSink {
    async fn write_sample(&self, sample: &PriceSample) -> SinkResult<()> {
        info!(
            "[SINK] sample {} {} price={:.4} variation={:.4}%",
            sample.timestamp.to_rfc3339(),
            sample.symbol,
            sample.price,
            sample.pct_variation
        );
        Ok(())
    }

    async fn write_alarm(&self, alarm: &Alarm) -> SinkResult<()> {
        info!(
            "[SINK] alarm {} {} {} ({})",
            alarm.timestamp.to_rfc3339(),
            alarm.symbol,
            alarm.kind,
            alarm.detail
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "LogSink"
    }
}
