//! Treasury approvals — sponsor-issued tokens for fee-free actions
//!
//! The treasury approves a wallet by issuing a token bound to the wallet
//! address, the issuance time and a per-authorizer issuance counter. The fee
//! path later presents the token and the wallet; the action is funded only if
//! the stored token matches exactly.
//!
//! # Verification outcomes
//!
//! `verify` collapses "never approved", "revoked" and "wrong token" into a
//! single `false`, so the answer leaks nothing about approval history.
//!
//! # Expiry
//!
//! Tokens carry no expiry by themselves. When a validity window is
//! configured, `verify_at` rejects records older than the window. `verify`
//! ignores the window.

use crate::crypto::approval_token;
use crate::types::{now_millis, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Live approval for one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    /// Hex SHA3-256 of `address:issued_at_ms:nonce`
    pub token: String,
    /// Unix milliseconds at issuance
    pub issued_at_ms: u64,
    /// Issuance counter value mixed into the token
    pub nonce: u64,
}

impl AuthorizationRecord {
    /// Record age relative to `now_ms` (0 if the clock went backwards)
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.issued_at_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreasuryAuthorizer {
    approvals: HashMap<Address, AuthorizationRecord>,
    /// Validity window in milliseconds (None = never expires)
    window_ms: Option<u64>,
    /// Monotonic issuance counter, never reused
    next_nonce: u64,
}

impl TreasuryAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorizer whose tokens expire `window_secs` after issuance
    pub fn with_window_secs(window_secs: Option<u64>) -> Self {
        Self {
            approvals: HashMap::new(),
            window_ms: window_secs.map(|s| s.saturating_mul(1000)),
            next_nonce: 0,
        }
    }

    pub fn window_ms(&self) -> Option<u64> {
        self.window_ms
    }

    /// Approve `wallet` now, superseding any earlier approval
    pub fn authorize(&mut self, wallet: Address) -> String {
        self.authorize_at(wallet, now_millis())
    }

    pub fn authorize_at(&mut self, wallet: Address, issued_at_ms: u64) -> String {
        let nonce = self.next_nonce;
        self.next_nonce = self.next_nonce.wrapping_add(1);
        let token = approval_token(&wallet, issued_at_ms, nonce);
        debug!("treasury: approved wallet {}", wallet);
        self.approvals.insert(
            wallet,
            AuthorizationRecord {
                token: token.clone(),
                issued_at_ms,
                nonce,
            },
        );
        token
    }

    /// Remove the approval of `wallet`. Returns false if there was none.
    pub fn revoke(&mut self, wallet: &Address) -> bool {
        let removed = self.approvals.remove(wallet).is_some();
        if removed {
            debug!("treasury: revoked approval for wallet {}", wallet);
        }
        removed
    }

    /// Exact-match check, no expiry
    pub fn verify(&self, wallet: &Address, presented: &str) -> bool {
        self.approvals
            .get(wallet)
            .is_some_and(|record| tokens_match(&record.token, presented))
    }

    /// Exact-match check that also fails once the validity window has elapsed
    pub fn verify_at(&self, wallet: &Address, presented: &str, now_ms: u64) -> bool {
        match self.approvals.get(wallet) {
            Some(record) => {
                tokens_match(&record.token, presented) && self.within_window(record, now_ms)
            }
            None => false,
        }
    }

    /// Drop every record outside the validity window. Returns count removed.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let Some(window_ms) = self.window_ms else {
            return 0;
        };
        let before = self.approvals.len();
        self.approvals
            .retain(|_, record| record.age_ms(now_ms) < window_ms);
        before - self.approvals.len()
    }

    pub fn record(&self, wallet: &Address) -> Option<&AuthorizationRecord> {
        self.approvals.get(wallet)
    }

    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }

    fn within_window(&self, record: &AuthorizationRecord, now_ms: u64) -> bool {
        self.window_ms.is_none_or(|w| record.age_ms(now_ms) < w)
    }
}

/// Constant-time token comparison
fn tokens_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn test_reauthorize_supersedes() {
        let mut auth = TreasuryAuthorizer::new();
        let w = Address::from("W1");
        let old = auth.authorize_at(w.clone(), T0);
        let new = auth.authorize_at(w.clone(), T0 + 1);
        assert_ne!(old, new);
        assert!(!auth.verify(&w, &old));
        assert!(auth.verify(&w, &new));
        assert_eq!(auth.len(), 1);
    }

    #[test]
    fn test_reissue_same_millisecond_invalidates_revoked() {
        let mut auth = TreasuryAuthorizer::new();
        let w = Address::from("W1");
        let revoked = auth.authorize_at(w.clone(), T0);
        auth.revoke(&w);
        let reissued = auth.authorize_at(w.clone(), T0);

        assert_ne!(revoked, reissued);
        assert!(!auth.verify(&w, &revoked));
        assert!(auth.verify(&w, &reissued));
    }

    #[test]
    fn test_revoke_idempotent() {
        let mut auth = TreasuryAuthorizer::new();
        let w = Address::from("W1");
        auth.authorize_at(w.clone(), T0);
        assert!(auth.revoke(&w));
        assert!(!auth.revoke(&w));
        assert!(auth.is_empty());
    }

    #[test]
    fn test_token_bound_to_wallet() {
        let mut auth = TreasuryAuthorizer::new();
        let token = auth.authorize_at("W1".into(), T0);
        auth.authorize_at("W2".into(), T0);
        assert!(!auth.verify(&"W2".into(), &token));
    }

    #[test]
    fn test_window_expiry() {
        let mut auth = TreasuryAuthorizer::with_window_secs(Some(60));
        let w = Address::from("W1");
        let token = auth.authorize_at(w.clone(), T0);

        assert!(auth.verify_at(&w, &token, T0));
        assert!(auth.verify_at(&w, &token, T0 + 59_999));
        assert!(!auth.verify_at(&w, &token, T0 + 60_000));
        // Plain verify never expires
        assert!(auth.verify(&w, &token));
    }

    #[test]
    fn test_no_window_never_expires() {
        let mut auth = TreasuryAuthorizer::new();
        let w = Address::from("W1");
        let token = auth.authorize_at(w.clone(), T0);
        assert!(auth.verify_at(&w, &token, u64::MAX));
        assert_eq!(auth.purge_expired(u64::MAX), 0);
    }

    #[test]
    fn test_purge_expired() {
        let mut auth = TreasuryAuthorizer::with_window_secs(Some(10));
        auth.authorize_at("old".into(), T0);
        auth.authorize_at("new".into(), T0 + 9_000);
        assert_eq!(auth.purge_expired(T0 + 10_000), 1);
        assert!(auth.record(&"old".into()).is_none());
        assert!(auth.record(&"new".into()).is_some());
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abcd", "abcd"));
        assert!(!tokens_match("abcd", "abce"));
        assert!(!tokens_match("abcd", "abc"));
        assert!(!tokens_match("", "a"));
    }
}
