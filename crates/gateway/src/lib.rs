//! Tickwatch Gateway
//!
//! Gateway layer between producers, the broker, and the alerting engine. Provides:
//! - Transport abstraction (tokio channels, with traits for other brokers)
//! - Topic naming for price and announcement streams
//! - Wire payloads and their decoding into domain messages
//! - The producer-facing adapter that publishes prices and announcements
//!
//! ## Architecture
//!
//! ```text
//!  Producers (price pollers)
//!         │ ProducerGateway
//!    ┌────▼────┐
//!    │Transport│  topics: crypto/price/{symbol}, sensor_monitors
//!    └────┬────┘
//!         │ Subscriber::next() -> Envelope
//!    ┌────▼────┐
//!    │ Engine  │  decode_price / decode_announcement
//!    └─────────┘
//! ```
//!
//! ## Transport
//!
//! Currently uses a tokio broadcast channel for single-process operation.
//! The `Publisher`/`Subscriber`/`Transport` traits allow plugging in a real
//! broker client (MQTT, NATS, etc.) without touching the engine.

pub mod adapters;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use adapters::ProducerGateway;
pub use error::{DecodeError, GatewayError, TransportError};
pub use messages::{
    announcement::{AnnouncementPayload, SensorPayload, decode_announcement},
    price::{PricePayload, decode_price},
};
pub use transport::{
    Envelope, Publisher, Subscriber, Topics, Transport,
    channel::{ChannelSubscriber, ChannelTransport},
    topic_matches,
};
