//! Announcement payload published on the announcement topic
//!
//! ```json
//! {"machine_id": "host-1", "sensors": [{"sensor_id": "BTCUSDT", "data_type": "USDT price", "data_interval": 0.5}]}
//! ```

use serde::{Deserialize, Serialize};
use tickwatch_core::{Announcement, SensorDescriptor, Timestamp};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    pub sensor_id: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub data_interval: f64,
}

impl From<&SensorDescriptor> for SensorPayload {
    fn from(sensor: &SensorDescriptor) -> Self {
        Self {
            sensor_id: sensor.sensor_id.clone(),
            data_type: sensor.data_type.clone(),
            data_interval: sensor.data_interval,
        }
    }
}

/// Producer announcement: the full list of symbols it currently reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementPayload {
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub sensors: Vec<SensorPayload>,
}

impl AnnouncementPayload {
    pub fn new(machine_id: impl Into<String>, sensors: &[SensorDescriptor]) -> Self {
        Self {
            machine_id: machine_id.into(),
            sensors: sensors.iter().map(SensorPayload::from).collect(),
        }
    }
}

/// Decode a raw announcement payload
///
/// An empty sensor list is valid and clears the registration set. A sensor
/// entry without an id makes the whole announcement malformed.
pub fn decode_announcement(
    payload: &[u8],
    received_at: Timestamp,
) -> Result<Announcement, DecodeError> {
    let raw: AnnouncementPayload = serde_json::from_slice(payload)?;

    let mut sensors = Vec::with_capacity(raw.sensors.len());
    for sensor in raw.sensors {
        let sensor_id = sensor.sensor_id.trim();
        if sensor_id.is_empty() {
            return Err(DecodeError::EmptySymbol);
        }
        sensors.push(SensorDescriptor {
            sensor_id: sensor_id.to_string(),
            data_type: sensor.data_type,
            data_interval: sensor.data_interval,
        });
    }

    Ok(Announcement {
        machine_id: raw.machine_id,
        sensors,
        received_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_decode_announcement() {
        let ann = decode_announcement(
            br#"{"machine_id":"host-1","sensors":[
                {"sensor_id":"BTCUSDT","data_type":"USDT price","data_interval":0.5},
                {"sensor_id":"ETHUSDT"}
            ]}"#,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(ann.machine_id, "host-1");
        assert_eq!(ann.symbols().collect::<Vec<_>>(), vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(ann.sensors[0].data_interval, 0.5);
        assert_eq!(ann.sensors[1].data_type, "");
    }

    #[test]
    fn test_empty_sensor_list_is_valid() {
        let ann = decode_announcement(br#"{"machine_id":"host-1","sensors":[]}"#, Utc::now())
            .unwrap();
        assert!(ann.sensors.is_empty());

        let ann = decode_announcement(br#"{}"#, Utc::now()).unwrap();
        assert!(ann.sensors.is_empty());
    }

    #[test]
    fn test_malformed_announcements_rejected() {
        assert!(decode_announcement(b"[1,2", Utc::now()).is_err());
        assert!(decode_announcement(br#"{"sensors":[{"data_type":"x"}]}"#, Utc::now()).is_err());
        assert!(matches!(
            decode_announcement(br#"{"sensors":[{"sensor_id":"  "}]}"#, Utc::now()),
            Err(DecodeError::EmptySymbol)
        ));
        assert!(decode_announcement(br#"{"sensors":"BTCUSDT"}"#, Utc::now()).is_err());
    }
}
