use chrono::{DateTime, Utc};

/// Price value
///
/// Producers publish floating point quotes and variation thresholds compare
/// full-precision values, so prices stay `f64` end to end.
pub type Price = f64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier of a monitored price series (e.g. `BTCUSDT`)
pub type Symbol = String;
