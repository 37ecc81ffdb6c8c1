use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{Symbol, Timestamp};

/// Kind of alarm raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// Consecutive samples moved more than the two-measurement threshold
    TwoMeasurementVariation,
    /// Price moved past the total-variation threshold relative to the ratchet baseline
    TotalVariation,
    /// A registered symbol has not reported within the presence timeout
    PresenceTimeout,
}

impl AlarmKind {
    /// Stable code written to the sink
    pub fn code(&self) -> &'static str {
        match self {
            AlarmKind::TwoMeasurementVariation => "two_measurement_variation",
            AlarmKind::TotalVariation => "total_variation",
            AlarmKind::PresenceTimeout => "presence_timeout",
        }
    }

    /// Human-readable title for logs and alarm details
    pub fn title(&self) -> &'static str {
        match self {
            AlarmKind::TwoMeasurementVariation => "Significant Two-Measurement Variation",
            AlarmKind::TotalVariation => "Total Variation Threshold Crossed",
            AlarmKind::PresenceTimeout => "Registered Symbol Not Received",
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An alarm record. Append-only: never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub timestamp: Timestamp,
    pub symbol: Symbol,
    pub kind: AlarmKind,
    pub detail: String,
}

impl Alarm {
    pub fn new(
        timestamp: Timestamp,
        symbol: impl Into<Symbol>,
        kind: AlarmKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            kind,
            detail: detail.into(),
        }
    }
}
