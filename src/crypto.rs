//! Hashing primitives: approval tokens and selection seeds
//!
//! No signatures here. Proposals arrive already authenticated by the block
//! assembly layer.

use crate::types::{Address, Hash, APPROVAL_PREIMAGE_SEPARATOR};
use sha3::{Digest, Sha3_256};

pub fn sha3(data: &[u8]) -> Hash {
    Sha3_256::digest(data).into()
}

pub fn sha3_concat(a: &[u8], b: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}

/// Seed for deterministic leader selection.
///
/// ```text
/// seed = SHA3-256(prev_hash ‖ round_le)
/// ```
///
/// Must be derived from data finalized BEFORE proposals are collected,
/// otherwise a proposer could grind payloads for a favorable draw.
pub fn selection_seed(prev_hash: &Hash, round: u64) -> Hash {
    sha3_concat(prev_hash, &round.to_le_bytes())
}

/// Approval token for a wallet.
///
/// ```text
/// token = hex(SHA3-256(address ":" issued_at_ms ":" nonce))
/// ```
///
/// `nonce` is the issuer's monotonic issuance counter: two approvals within
/// the same millisecond still yield distinct tokens.
pub fn approval_token(wallet: &Address, issued_at_ms: u64, nonce: u64) -> String {
    let preimage = format!(
        "{}{sep}{}{sep}{}",
        wallet,
        issued_at_ms,
        nonce,
        sep = APPROVAL_PREIMAGE_SEPARATOR
    );
    hex::encode(sha3(preimage.as_bytes()))
}

/// Parse a 32-byte hex seed (as given on the command line)
pub fn parse_seed(s: &str) -> Option<Hash> {
    let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
    bytes.try_into().ok()
}
