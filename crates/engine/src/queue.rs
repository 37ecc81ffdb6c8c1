//! Bounded ingestion queue
//!
//! Decouples transport delivery from processing. `enqueue` never blocks and
//! never fails: when the queue is full the oldest entry is evicted to make
//! room. The single consumer awaits `dequeue`, which wakes on notification.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tickwatch_core::QueueEntry;
use tokio::sync::Notify;

pub struct IngestionQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    capacity: usize,
    notify: Notify,
    evicted: AtomicU64,
}

impl IngestionQueue {
    /// Create a queue holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            evicted: AtomicU64::new(0),
        }
    }

    /// Append an entry, evicting the oldest one if the queue is full
    ///
    /// Returns the evicted entry, if any.
    pub fn enqueue(&self, entry: QueueEntry) -> Option<QueueEntry> {
        let evicted = {
            let mut entries = self.entries.lock();
            let evicted = if entries.len() >= self.capacity {
                entries.pop_front()
            } else {
                None
            };
            entries.push_back(entry);
            evicted
        };

        if let Some(old) = &evicted {
            let total = self.evicted.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                "[QUEUE] Full ({}), evicted {} enqueued at {}",
                self.capacity,
                old.symbol(),
                old.enqueued_at.to_rfc3339()
            );
            if total.is_power_of_two() {
                warn!("[QUEUE] Overloaded: {} entries evicted so far", total);
            }
        }

        self.notify.notify_one();
        evicted
    }

    /// Wait for the oldest entry
    ///
    /// Cancel safe: dropping the future never loses an entry.
    pub async fn dequeue(&self) -> QueueEntry {
        loop {
            if let Some(entry) = self.try_dequeue() {
                return entry;
            }
            self.notify.notified().await;
        }
    }

    pub fn try_dequeue(&self) -> Option<QueueEntry> {
        self.entries.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries evicted since creation
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Copy of the buffered entries, oldest first
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Drop everything still buffered; returns how many entries were lost
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        dropped
    }
}
