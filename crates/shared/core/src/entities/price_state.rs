use serde::{Deserialize, Serialize};

use crate::values::{Price, Symbol, Timestamp};

/// Per-symbol price memory used by the variation rules
///
/// `last_price` moves on every processed sample. `baseline_price` is the
/// ratchet reference and only moves when a total-variation alarm fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub last_price: Option<Price>,
    pub baseline_price: Option<Price>,
}

impl PriceState {
    /// Reference price for the ratchet rule: baseline, else last price, else `fallback`
    pub fn ratchet_reference(&self, fallback: Price) -> Price {
        self.baseline_price.or(self.last_price).unwrap_or(fallback)
    }
}

/// A raw sample row as written to the persistence sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: Timestamp,
    pub symbol: Symbol,
    pub price: Price,
    /// Two-measurement variation in percent (0 on the first sample)
    pub pct_variation: f64,
}

impl PriceSample {
    pub fn new(
        timestamp: Timestamp,
        symbol: impl Into<Symbol>,
        price: Price,
        pct_variation: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            price,
            pct_variation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratchet_reference_prefers_baseline() {
        let state = PriceState {
            last_price: Some(101.0),
            baseline_price: Some(100.0),
        };
        assert_eq!(state.ratchet_reference(105.0), 100.0);
    }

    #[test]
    fn test_ratchet_reference_falls_back_to_last_then_current() {
        let state = PriceState {
            last_price: Some(101.0),
            baseline_price: None,
        };
        assert_eq!(state.ratchet_reference(105.0), 101.0);
        assert_eq!(PriceState::default().ratchet_reference(105.0), 105.0);
    }
}
