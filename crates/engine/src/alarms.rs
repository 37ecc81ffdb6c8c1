//! Price state store and variation rules
//!
//! For each processed message (S, P):
//!
//! 1. Two-measurement rule: with a previous price L, `pct = (P - L) / L * 100`.
//!    `|pct| > two_measurement_threshold` raises `TwoMeasurementVariation`.
//! 2. Ratchet rule: reference `R = baseline ?? L ?? P`, `total = (P - R) / R * 100`.
//!    `|total| >= total_variation_threshold` raises `TotalVariation` and moves
//!    the baseline to P.
//! 3. `last_price = P`.
//!
//! Both alarms may fire for the same message. A missing or zero reference
//! yields a variation of exactly 0.

use std::collections::HashMap;
use tickwatch_core::{
    Alarm, AlarmKind, Price, PriceMessage, PriceSample, PriceState, Symbol, Timestamp,
};

use crate::config::EngineConfig;

/// Percent change of `current` relative to `reference`
///
/// Returns 0 when there is no reference or the reference is zero.
pub fn variation_pct(current: Price, reference: Option<Price>) -> f64 {
    match reference {
        Some(r) if r != 0.0 => (current - r) / r * 100.0,
        _ => 0.0,
    }
}

/// Per-symbol price memory. Entries are created lazily and never removed.
#[derive(Debug, Default)]
pub struct PriceStore {
    states: HashMap<Symbol, PriceState>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<PriceState> {
        self.states.get(symbol).copied()
    }

    fn entry(&mut self, symbol: &str) -> &mut PriceState {
        self.states.entry(symbol.to_string()).or_default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Alarm thresholds in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub two_measurement_pct: f64,
    pub total_variation_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            two_measurement_pct: 0.5,
            total_variation_pct: 5.0,
        }
    }
}

impl From<&EngineConfig> for Thresholds {
    fn from(config: &EngineConfig) -> Self {
        Self {
            two_measurement_pct: config.two_measurement_threshold_pct,
            total_variation_pct: config.total_variation_threshold_pct,
        }
    }
}

/// Result of evaluating one message
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Row to persist, regardless of alarms
    pub sample: PriceSample,
    /// Alarms raised, two-measurement first
    pub alarms: Vec<Alarm>,
}

/// Applies the variation rules. Owns the [`PriceStore`]; single writer.
#[derive(Debug, Default)]
pub struct AlarmEngine {
    store: PriceStore,
    thresholds: Thresholds,
}

impl AlarmEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            store: PriceStore::new(),
            thresholds,
        }
    }

    /// Evaluate one message and update the symbol's state
    ///
    /// `now` stamps any alarm raised; the sample keeps the message's arrival time.
    pub fn evaluate(&mut self, message: &PriceMessage, now: Timestamp) -> Evaluation {
        let thresholds = self.thresholds;
        let symbol = message.symbol.as_str();
        let price = message.price;
        let state = self.store.entry(symbol);

        let mut alarms = Vec::new();

        let pct = variation_pct(price, state.last_price);
        if let Some(last) = state.last_price {
            if pct.abs() > thresholds.two_measurement_pct {
                alarms.push(Alarm::new(
                    now,
                    symbol,
                    AlarmKind::TwoMeasurementVariation,
                    format!(
                        "{}: {:+.4}% ({} -> {})",
                        AlarmKind::TwoMeasurementVariation.title(),
                        pct,
                        last,
                        price
                    ),
                ));
            }
        }

        let reference = state.ratchet_reference(price);
        let total = variation_pct(price, Some(reference));
        if total.abs() >= thresholds.total_variation_pct {
            alarms.push(Alarm::new(
                now,
                symbol,
                AlarmKind::TotalVariation,
                format!(
                    "{}: {:+.4}% from baseline {} -> {}",
                    AlarmKind::TotalVariation.title(),
                    total,
                    reference,
                    price
                ),
            ));
            state.baseline_price = Some(price);
        }

        state.last_price = Some(price);

        Evaluation {
            sample: PriceSample::new(message.received_at, symbol, price, pct),
            alarms,
        }
    }

    pub fn state(&self, symbol: &str) -> Option<PriceState> {
        self.store.get(symbol)
    }

    pub fn store(&self) -> &PriceStore {
        &self.store
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}
