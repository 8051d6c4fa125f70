// Vuser Consensus — Constants and Types
// Distributed under the MIT software license.

//! Core types and constants for the Proof of Participation engine.
//!
//! # Memory Budget
//!
//! | Component           | Max Size | Calculation                              |
//! |---------------------|----------|------------------------------------------|
//! | Eligibility pool    | ~10 KB   | 100 addresses × ~100 bytes               |
//! | Pre-submission pool | unbounded by count, one entry per eligible address |
//! | Treasury log        | ~1 MB    | 10k entries × ~100 bytes                 |
//!
//! The pre-submission pool is bounded indirectly: only eligible addresses may
//! submit, so it never holds more than `eligibility_capacity` proposals.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub type Hash = [u8; 32];

// =============================================================================
// PROOF OF PARTICIPATION
// =============================================================================

/// Number of most recent unique transaction senders allowed to propose.
pub const DEFAULT_ELIGIBILITY_CAPACITY: usize = 100;

/// Stale order entries tolerated per live entry before the recency queue is
/// compacted. Keeps refresh amortized O(1) while bounding memory at 2× capacity.
pub const RECENCY_COMPACTION_FACTOR: usize = 2;

// =============================================================================
// TREASURY
// =============================================================================

/// Separator between address and timestamp in the approval hash preimage.
pub const APPROVAL_PREIMAGE_SEPARATOR: &str = ":";

/// Base units minted per block before fees are added.
pub const BLOCK_GENERATION_REWARD: u128 = 9;

/// Block reward is split evenly between miner, coalition and burn.
pub const REWARD_SHARES: u128 = 3;

/// Maximum entries kept in the coalition treasury activity log.
/// Oldest entries are dropped first; totals are unaffected.
pub const MAX_TREASURY_LOG_ENTRIES: usize = 10_000;

// =============================================================================
// ADDRESS
// =============================================================================

/// Opaque participant identifier.
///
/// Only equality, hashing and ordering are meaningful. Ascending `Ord` is the
/// canonical order used for deterministic fallback rotation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Current unix time in milliseconds
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_address_ordering_is_lexicographic() {
        let mut addrs = vec![Address::from("C"), Address::from("A"), Address::from("B")];
        addrs.sort();
        assert_eq!(addrs, vec![Address::from("A"), Address::from("B"), Address::from("C")]);
    }

    #[test]
    fn test_address_borrow_str_lookup() {
        let mut set = HashSet::new();
        set.insert(Address::from("Addr1"));
        assert!(set.contains("Addr1"));
        assert!(!set.contains("Addr2"));
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
