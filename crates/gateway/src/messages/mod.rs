//! Wire payloads for gateway communication
//!
//! These types mirror the JSON producers put on the wire and are decoded
//! into the domain messages from `tickwatch-core` at the gateway boundary.

pub mod announcement;
pub mod price;

pub use announcement::{AnnouncementPayload, SensorPayload, decode_announcement};
pub use price::{PricePayload, decode_price};
