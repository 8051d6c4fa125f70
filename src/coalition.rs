//! Coalition treasury — pays publisher fees from block reward shares
//!
//! Block reward = generation (9) + Σ fees, split in thirds:
//!
//! | Share     | Destination                     |
//! |-----------|---------------------------------|
//! | 1/3       | Miner                           |
//! | 1/3       | Coalition treasury              |
//! | 1/3 + rem | Burnt (rounding never mints)    |
//!
//! The coalition spends its balance sponsoring fees of approved publishers.

use crate::types::{
    now_millis, Address, BLOCK_GENERATION_REWARD, MAX_TREASURY_LOG_ENTRIES, REWARD_SHARES,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("publisher not approved for sponsorship: {0}")]
    PublisherNotApproved(Address),
    #[error("insufficient treasury funds: required {required}, available {available}")]
    InsufficientFunds { required: u128, available: u128 },
    #[error("treasury amount overflow")]
    Overflow,
}

// =============================================================================
// BLOCK REWARD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    pub miner: u128,
    pub coalition: u128,
    pub burnt: u128,
}

impl RewardSplit {
    pub fn total(&self) -> u128 {
        self.miner + self.coalition + self.burnt
    }
}

/// Split generation reward plus fees between miner, coalition and burn
pub fn split_block_reward(fees: &[u128]) -> Result<RewardSplit, TreasuryError> {
    let total = fees
        .iter()
        .try_fold(BLOCK_GENERATION_REWARD, |acc, fee| acc.checked_add(*fee))
        .ok_or(TreasuryError::Overflow)?;

    let share = total / REWARD_SHARES;
    Ok(RewardSplit {
        miner: share,
        coalition: share,
        burnt: share + total % REWARD_SHARES,
    })
}

// =============================================================================
// LEDGER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasuryTxKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryTx {
    pub kind: TreasuryTxKind,
    pub amount: u128,
    pub purpose: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedPublisher {
    pub address: Address,
    pub name: String,
    pub approved_at_ms: u64,
    /// Fees paid by the coalition on this publisher's behalf
    pub total_sponsored: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStats {
    pub balance: u128,
    pub total_received: u128,
    pub total_spent: u128,
    /// Lifetime ledger entries (including ones dropped from the log)
    pub transaction_count: u64,
}

#[derive(Debug, Clone)]
pub struct CoalitionTreasury {
    balance: u128,
    total_received: u128,
    total_spent: u128,
    tx_count: u64,
    /// Bounded activity log, front = oldest
    log: VecDeque<TreasuryTx>,
    publishers: HashMap<Address, ApprovedPublisher>,
}

impl CoalitionTreasury {
    /// Treasury with a genesis allocation
    pub fn new(initial_balance: u128) -> Self {
        let mut treasury = Self {
            balance: initial_balance,
            total_received: initial_balance,
            total_spent: 0,
            tx_count: 0,
            log: VecDeque::new(),
            publishers: HashMap::new(),
        };
        treasury.push_log(TreasuryTxKind::Deposit, initial_balance, "Genesis allocation".into());
        info!("coalition treasury initialized with balance {}", initial_balance);
        treasury
    }

    pub fn deposit(&mut self, amount: u128, purpose: &str) -> Result<u128, TreasuryError> {
        let balance = self.balance.checked_add(amount).ok_or(TreasuryError::Overflow)?;
        let received = self
            .total_received
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;
        self.balance = balance;
        self.total_received = received;
        self.push_log(TreasuryTxKind::Deposit, amount, purpose.to_string());
        debug!("treasury deposit {} ({}), balance {}", amount, purpose, self.balance);
        Ok(self.balance)
    }

    /// Deposit the coalition third of a block reward. Returns the full split.
    pub fn credit_block_reward(&mut self, fees: &[u128]) -> Result<RewardSplit, TreasuryError> {
        let split = split_block_reward(fees)?;
        self.deposit(split.coalition, "Block Reward Share")?;
        Ok(split)
    }

    pub fn approve_publisher(&mut self, address: Address, name: &str) {
        debug!("publisher approved: {} ({})", name, address);
        self.publishers.insert(
            address.clone(),
            ApprovedPublisher {
                address,
                name: name.to_string(),
                approved_at_ms: now_millis(),
                total_sponsored: 0,
            },
        );
    }

    pub fn remove_publisher(&mut self, address: &Address) -> bool {
        match self.publishers.remove(address) {
            Some(publisher) => {
                debug!("publisher removed: {} ({})", publisher.name, address);
                true
            }
            None => false,
        }
    }

    pub fn is_publisher_approved(&self, address: &Address) -> bool {
        self.publishers.contains_key(address)
    }

    pub fn publisher(&self, address: &Address) -> Option<&ApprovedPublisher> {
        self.publishers.get(address)
    }

    /// Pay `fee` on behalf of an approved publisher. Returns the new balance.
    pub fn sponsor_fee(&mut self, publisher: &Address, fee: u128) -> Result<u128, TreasuryError> {
        let available = self.balance;
        let entry = self
            .publishers
            .get_mut(publisher)
            .ok_or_else(|| TreasuryError::PublisherNotApproved(publisher.clone()))?;

        if available < fee {
            return Err(TreasuryError::InsufficientFunds {
                required: fee,
                available,
            });
        }
        let spent = self.total_spent.checked_add(fee).ok_or(TreasuryError::Overflow)?;
        let sponsored = entry
            .total_sponsored
            .checked_add(fee)
            .ok_or(TreasuryError::Overflow)?;

        entry.total_sponsored = sponsored;
        let purpose = format!("Fee sponsorship for {}", entry.name);
        self.balance = available - fee;
        self.total_spent = spent;
        self.push_log(TreasuryTxKind::Withdrawal, fee, purpose);
        debug!("sponsored fee {} for {}, balance {}", fee, publisher, self.balance);
        Ok(self.balance)
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    pub fn stats(&self) -> TreasuryStats {
        TreasuryStats {
            balance: self.balance,
            total_received: self.total_received,
            total_spent: self.total_spent,
            transaction_count: self.tx_count,
        }
    }

    /// Approved publishers sorted by address
    pub fn publisher_stats(&self) -> Vec<ApprovedPublisher> {
        let mut publishers: Vec<ApprovedPublisher> = self.publishers.values().cloned().collect();
        publishers.sort_by(|a, b| a.address.cmp(&b.address));
        publishers
    }

    /// Last `limit` ledger entries, oldest first
    pub fn recent_activity(&self, limit: usize) -> Vec<TreasuryTx> {
        let start = self.log.len().saturating_sub(limit);
        self.log.iter().skip(start).cloned().collect()
    }

    fn push_log(&mut self, kind: TreasuryTxKind, amount: u128, purpose: String) {
        if self.log.len() >= MAX_TREASURY_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(TreasuryTx {
            kind,
            amount,
            purpose,
            timestamp_ms: now_millis(),
        });
        self.tx_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_no_fees() {
        let split = split_block_reward(&[]).unwrap();
        assert_eq!(split, RewardSplit { miner: 3, coalition: 3, burnt: 3 });
    }

    #[test]
    fn test_split_remainder_is_burnt() {
        // 9 + 2 = 11 → 3 / 3 / 5
        let split = split_block_reward(&[1, 1]).unwrap();
        assert_eq!(split.miner, 3);
        assert_eq!(split.coalition, 3);
        assert_eq!(split.burnt, 5);
        assert_eq!(split.total(), 11);
    }

    #[test]
    fn test_split_overflow() {
        assert_eq!(split_block_reward(&[u128::MAX]), Err(TreasuryError::Overflow));
    }

    #[test]
    fn test_genesis_logged() {
        let treasury = CoalitionTreasury::new(1000);
        let stats = treasury.stats();
        assert_eq!(stats.balance, 1000);
        assert_eq!(stats.total_received, 1000);
        assert_eq!(stats.transaction_count, 1);
        assert_eq!(treasury.recent_activity(10)[0].purpose, "Genesis allocation");
    }

    #[test]
    fn test_log_bounded() {
        let mut treasury = CoalitionTreasury::new(0);
        for _ in 0..MAX_TREASURY_LOG_ENTRIES + 5 {
            treasury.deposit(1, "drip").unwrap();
        }
        assert_eq!(treasury.recent_activity(usize::MAX).len(), MAX_TREASURY_LOG_ENTRIES);
        assert_eq!(treasury.stats().transaction_count, MAX_TREASURY_LOG_ENTRIES as u64 + 6);
    }
}
