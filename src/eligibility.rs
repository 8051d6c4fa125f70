//! Proof of Participation — eligibility pool
//!
//! Every accepted transaction refreshes its sender in a bounded recency
//! window. Only addresses inside the window may submit block proposals.
//!
//! # Structure
//!
//! Fixed-capacity LRU set built from two collections:
//!
//! - `stamps`: address → recency stamp of its latest activity (membership)
//! - `order`: (stamp, address) in activity order (front = oldest)
//!
//! A refresh pushes a new entry and leaves the previous one in `order` as a
//! stale tombstone (its stamp no longer matches `stamps`). Tombstones are
//! skipped on eviction and purged once `order` grows past
//! `RECENCY_COMPACTION_FACTOR × live addresses`, so every operation is
//! amortized O(1) and memory tracks the live set, not the configured capacity.

use crate::types::{Address, DEFAULT_ELIGIBILITY_CAPACITY, RECENCY_COMPACTION_FACTOR};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// Bounded, recency-ordered set of addresses allowed to propose
#[derive(Debug, Clone)]
pub struct EligibilityTracker {
    /// Live membership with the stamp of the latest activity
    stamps: HashMap<Address, u64>,
    /// Activity order, may contain stale entries
    order: VecDeque<(u64, Address)>,
    /// Maximum live addresses
    capacity: usize,
    /// Monotonic recency counter
    next_stamp: u64,
}

impl Default for EligibilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ELIGIBILITY_CAPACITY)
    }
}

impl EligibilityTracker {
    /// Create an empty tracker. A zero capacity is raised to 1.
    ///
    /// Preallocation is capped at the default pool size; larger pools grow on
    /// demand.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let prealloc = capacity.min(DEFAULT_ELIGIBILITY_CAPACITY) + 1;
        Self {
            stamps: HashMap::with_capacity(prealloc),
            order: VecDeque::with_capacity(prealloc),
            capacity,
            next_stamp: 0,
        }
    }

    /// Mark `address` as most recently active.
    ///
    /// Returns the address evicted to make room, if any. Refreshing an address
    /// that is already present never evicts.
    pub fn record_activity(&mut self, address: Address) -> Option<Address> {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let refreshed = self.stamps.insert(address.clone(), stamp).is_some();
        self.order.push_back((stamp, address));

        let evicted = if self.stamps.len() > self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let limit = self.stamps.len().saturating_mul(RECENCY_COMPACTION_FACTOR);
        if refreshed && self.order.len() > limit {
            self.compact();
        }

        evicted
    }

    /// Check if address may currently propose
    pub fn is_eligible(&self, address: &Address) -> bool {
        self.stamps.contains_key(address)
    }

    /// All eligible addresses. Callers must not rely on the order.
    pub fn list_eligible(&self) -> Vec<Address> {
        self.live_entries().map(|(_, addr)| addr.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next address that would be evicted
    pub fn oldest(&self) -> Option<&Address> {
        self.live_entries().next().map(|(_, addr)| addr)
    }

    fn live_entries(&self) -> impl Iterator<Item = &(u64, Address)> {
        self.order
            .iter()
            .filter(move |(stamp, addr)| self.stamps.get(addr) == Some(stamp))
    }

    /// Drop the least recently active live address
    fn evict_oldest(&mut self) -> Option<Address> {
        while let Some((stamp, addr)) = self.order.pop_front() {
            if self.stamps.get(&addr) == Some(&stamp) {
                self.stamps.remove(&addr);
                trace!("eligibility: evicted {}", addr);
                return Some(addr);
            }
        }
        None
    }

    /// Purge tombstones left by refreshes
    fn compact(&mut self) {
        let stamps = &self.stamps;
        self.order
            .retain(|(stamp, addr)| stamps.get(addr) == Some(stamp));
    }
}
