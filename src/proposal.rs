//! Pre-submission pool: one proposal per eligible proposer per round
//!
//! # Round lifecycle
//!
//! ```text
//! Empty ──submit──▶ Collecting ──select──▶ Selected ──clear_round──▶ Empty
//!                    ▲      │
//!                    └submit┘
//! ```
//!
//! `clear_round` is legal from any phase. Once a winner has been selected,
//! further submissions are refused until the round is cleared.
//!
//! # Selection
//!
//! | Strategy         | Determinism          | Use                                 |
//! |------------------|----------------------|-------------------------------------|
//! | `select_primary` | random (thread RNG)  | local placeholder leader draw       |
//! | `select_by_seed` | pure fn of seed      | leader agreed by all honest nodes   |
//! | `get_fallback`   | canonical rotation   | next proposer when leader is absent |
//!
//! Canonical order is ascending `Address`. The pool is a `BTreeMap`, so
//! iteration order is canonical order and independent of insertion history.

use crate::eligibility::EligibilityTracker;
use crate::types::{Address, Hash};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("proposer {0} not eligible (not among recent transaction senders)")]
    IneligibleProposer(Address),
    #[error("no proposals in pre-submission pool")]
    EmptyPool,
    #[error("round already selected a winner; clear the round before submitting")]
    RoundSealed,
}

/// Candidate block for the next round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: Address,
    /// Opaque block content
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    #[default]
    Empty,
    Collecting,
    Selected,
}

#[derive(Debug, Clone, Default)]
pub struct ProposalSelector {
    pending: BTreeMap<Address, Proposal>,
    phase: RoundPhase,
}

impl ProposalSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit (or replace) the proposal of `proposer`.
    ///
    /// Eligibility is checked against `tracker` at call time only.
    pub fn submit(
        &mut self,
        tracker: &EligibilityTracker,
        proposer: Address,
        payload: Vec<u8>,
    ) -> Result<(), SelectorError> {
        if self.phase == RoundPhase::Selected {
            return Err(SelectorError::RoundSealed);
        }
        if !tracker.is_eligible(&proposer) {
            return Err(SelectorError::IneligibleProposer(proposer));
        }

        let proposal = Proposal {
            proposer: proposer.clone(),
            payload,
        };
        if self.pending.insert(proposer, proposal).is_some() {
            trace!("proposal replaced");
        }
        self.phase = RoundPhase::Collecting;
        Ok(())
    }

    /// Uniformly random leader among pending proposals.
    ///
    /// Not deterministic across nodes. Use `select_by_seed` when all nodes
    /// must agree on the winner.
    pub fn select_primary(&mut self) -> Result<&Proposal, SelectorError> {
        self.select_primary_with(&mut rand::thread_rng())
    }

    /// Uniform draw over canonical order with a caller-supplied RNG
    pub fn select_primary_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&Proposal, SelectorError> {
        if self.pending.is_empty() {
            return Err(SelectorError::EmptyPool);
        }
        let idx = rng.gen_range(0..self.pending.len());
        self.phase = RoundPhase::Selected;
        self.pending
            .values()
            .nth(idx)
            .ok_or(SelectorError::EmptyPool)
    }

    /// Deterministic leader: same seed and same pending set → same winner.
    pub fn select_by_seed(&mut self, seed: &Hash) -> Result<&Proposal, SelectorError> {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        self.select_primary_with(&mut rng)
    }

    /// Next proposal after `current` in canonical order, wrapping around.
    ///
    /// If `current` has no pending proposal the first proposal is returned.
    pub fn get_fallback(&mut self, current: &Address) -> Result<&Proposal, SelectorError> {
        if self.pending.is_empty() {
            return Err(SelectorError::EmptyPool);
        }
        self.phase = RoundPhase::Selected;

        let first = self.pending.values().next();
        if !self.pending.contains_key(current) {
            return first.ok_or(SelectorError::EmptyPool);
        }

        self.pending
            .range::<Address, _>((Bound::Excluded(current), Bound::Unbounded))
            .map(|(_, p)| p)
            .next()
            .or(first)
            .ok_or(SelectorError::EmptyPool)
    }

    /// Drop proposals whose proposer has rotated out of eligibility.
    ///
    /// Returns the dropped proposers in canonical order.
    pub fn retain_eligible(&mut self, tracker: &EligibilityTracker) -> Vec<Address> {
        let stale: Vec<Address> = self
            .pending
            .keys()
            .filter(|addr| !tracker.is_eligible(addr))
            .cloned()
            .collect();
        for addr in &stale {
            self.pending.remove(addr);
        }
        if self.pending.is_empty() && self.phase == RoundPhase::Collecting {
            self.phase = RoundPhase::Empty;
        }
        if !stale.is_empty() {
            debug!("dropped {} stale proposals", stale.len());
        }
        stale
    }

    /// End the round: all pending proposals are discarded.
    pub fn clear_round(&mut self) {
        let cleared = self.pending.len();
        self.pending.clear();
        self.phase = RoundPhase::Empty;
        debug!("round cleared ({} proposals)", cleared);
    }

    pub fn get(&self, proposer: &Address) -> Option<&Proposal> {
        self.pending.get(proposer)
    }

    /// Pending proposals in canonical order
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.pending.values()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
