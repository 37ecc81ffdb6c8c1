//! Producer adapters
//!
//! Adapters turn domain values into wire payloads and publish them on the
//! right topics.

pub mod producer;

pub use producer::ProducerGateway;
