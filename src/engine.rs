//! Consensus engine — single owner of eligibility, proposals and approvals
//!
//! # Round flow
//!
//! ```text
//! tx pool ──record_activity──▶ eligibility
//! miners  ──submit───────────▶ pre-submission pool (eligible only)
//! driver  ──select_leader────▶ winner  (──get_fallback──▶ next in rotation)
//! fee path──is_sponsored─────▶ treasury approvals
//! driver  ──clear_round──────▶ empty pool
//! ```
//!
//! `ConsensusEngine` is a plain owned value. `EngineHandle` shares one engine
//! between tasks behind a single mutex: each call holds the lock for the whole
//! operation, so a submission's eligibility check and insertion cannot
//! interleave with an eviction, and a verification never observes a
//! half-applied revoke.

use crate::config::{ConfigError, EngineConfig, SelectionMode};
use crate::eligibility::EligibilityTracker;
use crate::proposal::{Proposal, ProposalSelector, RoundPhase, SelectorError};
use crate::treasury::TreasuryAuthorizer;
use crate::types::{now_millis, Address, Hash};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: EngineConfig,
    eligibility: EligibilityTracker,
    proposals: ProposalSelector,
    approvals: TreasuryAuthorizer,
}

impl ConsensusEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            eligibility: EligibilityTracker::new(config.eligibility_capacity),
            proposals: ProposalSelector::new(),
            approvals: TreasuryAuthorizer::with_window_secs(config.approval_window_secs),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Proof of Participation ---

    /// Called by the transaction pool for every accepted transaction sender
    pub fn record_activity(&mut self, sender: Address) -> Option<Address> {
        self.eligibility.record_activity(sender)
    }

    pub fn is_eligible(&self, address: &Address) -> bool {
        self.eligibility.is_eligible(address)
    }

    pub fn list_eligible(&self) -> Vec<Address> {
        self.eligibility.list_eligible()
    }

    pub fn eligibility(&self) -> &EligibilityTracker {
        &self.eligibility
    }

    // --- Pre-submission pool ---

    pub fn submit(&mut self, proposer: Address, payload: Vec<u8>) -> Result<(), SelectorError> {
        self.proposals.submit(&self.eligibility, proposer, payload)
    }

    pub fn select_primary(&mut self) -> Result<&Proposal, SelectorError> {
        self.proposals.select_primary()
    }

    pub fn select_by_seed(&mut self, seed: &Hash) -> Result<&Proposal, SelectorError> {
        self.proposals.select_by_seed(seed)
    }

    /// Leader per configured `SelectionMode`. `seed` is ignored in `Random` mode.
    pub fn select_leader(&mut self, seed: &Hash) -> Result<&Proposal, SelectorError> {
        match self.config.selection {
            SelectionMode::Random => self.proposals.select_primary(),
            SelectionMode::Seeded => self.proposals.select_by_seed(seed),
        }
    }

    pub fn get_fallback(&mut self, current: &Address) -> Result<&Proposal, SelectorError> {
        self.proposals.get_fallback(current)
    }

    /// Re-validate pending proposals against current eligibility
    pub fn retain_eligible(&mut self) -> Vec<Address> {
        self.proposals.retain_eligible(&self.eligibility)
    }

    pub fn clear_round(&mut self) {
        self.proposals.clear_round();
    }

    pub fn proposals(&self) -> &ProposalSelector {
        &self.proposals
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.proposals.phase()
    }

    // --- Treasury approvals ---

    pub fn authorize(&mut self, wallet: Address) -> String {
        self.approvals.authorize(wallet)
    }

    pub fn revoke(&mut self, wallet: &Address) -> bool {
        self.approvals.revoke(wallet)
    }

    pub fn verify(&self, wallet: &Address, token: &str) -> bool {
        self.approvals.verify(wallet, token)
    }

    /// `verify` honoring the configured validity window against the wall clock
    pub fn verify_now(&self, wallet: &Address, token: &str) -> bool {
        self.approvals.verify_at(wallet, token, now_millis())
    }

    /// May the winning proposal skip gas payment?
    pub fn is_sponsored(&self, proposal: &Proposal, token: &str) -> bool {
        self.verify_now(&proposal.proposer, token)
    }

    pub fn approvals(&self) -> &TreasuryAuthorizer {
        &self.approvals
    }

    pub fn approvals_mut(&mut self) -> &mut TreasuryAuthorizer {
        &mut self.approvals
    }
}

/// Cloneable shared handle for collaborators running on separate tasks
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<ConsensusEngine>>,
}

impl EngineHandle {
    pub fn new(engine: ConsensusEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn record_activity(&self, sender: Address) -> Option<Address> {
        self.inner.lock().await.record_activity(sender)
    }

    pub async fn is_eligible(&self, address: &Address) -> bool {
        self.inner.lock().await.is_eligible(address)
    }

    pub async fn list_eligible(&self) -> Vec<Address> {
        self.inner.lock().await.list_eligible()
    }

    pub async fn submit(&self, proposer: Address, payload: Vec<u8>) -> Result<(), SelectorError> {
        self.inner.lock().await.submit(proposer, payload)
    }

    pub async fn select_primary(&self) -> Result<Proposal, SelectorError> {
        self.inner.lock().await.select_primary().cloned()
    }

    pub async fn select_by_seed(&self, seed: &Hash) -> Result<Proposal, SelectorError> {
        self.inner.lock().await.select_by_seed(seed).cloned()
    }

    pub async fn select_leader(&self, seed: &Hash) -> Result<Proposal, SelectorError> {
        self.inner.lock().await.select_leader(seed).cloned()
    }

    pub async fn get_fallback(&self, current: &Address) -> Result<Proposal, SelectorError> {
        self.inner.lock().await.get_fallback(current).cloned()
    }

    pub async fn retain_eligible(&self) -> Vec<Address> {
        self.inner.lock().await.retain_eligible()
    }

    pub async fn clear_round(&self) {
        self.inner.lock().await.clear_round();
    }

    pub async fn authorize(&self, wallet: Address) -> String {
        self.inner.lock().await.authorize(wallet)
    }

    pub async fn revoke(&self, wallet: &Address) -> bool {
        self.inner.lock().await.revoke(wallet)
    }

    pub async fn verify(&self, wallet: &Address, token: &str) -> bool {
        self.inner.lock().await.verify(wallet, token)
    }

    pub async fn verify_now(&self, wallet: &Address, token: &str) -> bool {
        self.inner.lock().await.verify_now(wallet, token)
    }

    /// Run `f` with exclusive access, for multi-step operations that must be atomic
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut ConsensusEngine) -> R) -> R {
        let mut engine = self.inner.lock().await;
        f(&mut engine)
    }
}
