//! Eligibility pool tests
//!
//! Run with: cargo test --test eligibility_test

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vuser::{Address, EligibilityTracker};

fn addr(i: usize) -> Address {
    Address::new(format!("Addr{}", i))
}

// =============================================================================
// BOUNDS
// =============================================================================

#[test]
fn test_pool_never_exceeds_capacity() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut tracker = EligibilityTracker::new(16);

    for _ in 0..5_000 {
        // Small address space forces a mix of refreshes and evictions
        tracker.record_activity(addr(rng.gen_range(0..40)));
        assert!(tracker.len() <= tracker.capacity());
    }
    assert_eq!(tracker.len(), 16);
}

// =============================================================================
// LRU ORDER
// =============================================================================

#[test]
fn test_capacity_plus_one_evicts_first() {
    let capacity = 100;
    let mut tracker = EligibilityTracker::new(capacity);
    for i in 0..=capacity {
        tracker.record_activity(addr(i));
    }

    assert!(!tracker.is_eligible(&addr(0)));
    for i in 1..=capacity {
        assert!(tracker.is_eligible(&addr(i)), "Addr{} should be eligible", i);
    }
}

#[test]
fn test_refresh_keeps_size_and_defers_eviction() {
    let mut tracker = EligibilityTracker::new(3);
    tracker.record_activity(addr(1));
    tracker.record_activity(addr(2));
    tracker.record_activity(addr(3));

    assert_eq!(tracker.record_activity(addr(1)), None);
    assert_eq!(tracker.len(), 3);

    // Addr2 is now the oldest, not Addr1
    assert_eq!(tracker.record_activity(addr(4)), Some(addr(2)));
    assert!(tracker.is_eligible(&addr(1)));
}

#[test]
fn test_concrete_scenario_abcd() {
    let mut tracker = EligibilityTracker::new(3);
    for name in ["A", "B", "C", "D"] {
        tracker.record_activity(name.into());
    }

    let mut eligible = tracker.list_eligible();
    eligible.sort();
    assert_eq!(eligible, vec![Address::from("B"), Address::from("C"), Address::from("D")]);
    assert!(!tracker.is_eligible(&"A".into()));
}

#[test]
fn test_list_has_no_duplicates_after_refreshes() {
    let mut tracker = EligibilityTracker::new(5);
    for _ in 0..10 {
        for i in 0..5 {
            tracker.record_activity(addr(i));
        }
    }
    let mut eligible = tracker.list_eligible();
    eligible.sort();
    eligible.dedup();
    assert_eq!(eligible.len(), 5);
}
