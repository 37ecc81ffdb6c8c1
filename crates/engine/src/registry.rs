//! Registration registry
//!
//! Holds the set of symbols producers have announced. Each announcement
//! replaces the whole set; readers always see either the old or the new set,
//! never a mix.

use arc_swap::ArcSwap;
use log::info;
use std::collections::BTreeSet;
use std::sync::Arc;
use tickwatch_core::{Announcement, Symbol, Timestamp};

/// One immutable registration set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registration {
    pub symbols: BTreeSet<Symbol>,
    /// Producer that sent the announcement, if any announcement was received
    pub machine_id: Option<String>,
    pub updated_at: Option<Timestamp>,
}

impl Registration {
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }
}

impl From<&Announcement> for Registration {
    fn from(announcement: &Announcement) -> Self {
        Self {
            symbols: announcement.symbols().map(str::to_string).collect(),
            machine_id: Some(announcement.machine_id.clone()),
            updated_at: Some(announcement.received_at),
        }
    }
}

#[derive(Debug)]
pub struct RegistrationRegistry {
    current: ArcSwap<Registration>,
}

impl Default for RegistrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationRegistry {
    /// Empty registry: nothing is expected to report until announced
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Registration::default()),
        }
    }

    /// Replace the registration set wholesale; returns the previous set
    pub fn replace(&self, announcement: &Announcement) -> Arc<Registration> {
        let next = Arc::new(Registration::from(announcement));
        let previous = self.current.swap(next.clone());

        let added: Vec<&Symbol> = next.symbols.difference(&previous.symbols).collect();
        let removed: Vec<&Symbol> = previous.symbols.difference(&next.symbols).collect();
        if !added.is_empty() || !removed.is_empty() {
            info!(
                "[REGISTRY] {} now reports {} symbols (added {:?}, removed {:?})",
                announcement.machine_id,
                next.symbols.len(),
                added,
                removed
            );
        }

        previous
    }

    /// Current set. Stays consistent for as long as the caller holds it.
    pub fn snapshot(&self) -> Arc<Registration> {
        self.current.load_full()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.current.load().symbols.iter().cloned().collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.current.load().contains(symbol)
    }
}
