use serde::{Deserialize, Serialize};

use crate::values::{Symbol, Timestamp};

/// One sensor (price series) declared by a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub sensor_id: Symbol,
    pub data_type: String,
    /// Publish interval in seconds
    pub data_interval: f64,
}

/// Periodic declaration of the symbols a producer is currently reporting
///
/// An announcement is authoritative: it replaces the registration set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub machine_id: String,
    pub sensors: Vec<SensorDescriptor>,
    pub received_at: Timestamp,
}

impl Announcement {
    /// Symbols declared by this announcement, in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|s| s.sensor_id.as_str())
    }
}
