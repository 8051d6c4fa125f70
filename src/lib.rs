pub mod coalition;
pub mod config;
pub mod crypto;
pub mod eligibility;
pub mod engine;
pub mod proposal;
pub mod treasury;
pub mod types;

pub use coalition::{split_block_reward, CoalitionTreasury, RewardSplit, TreasuryError, TreasuryStats};
pub use config::{ConfigError, EngineConfig, SelectionMode};
pub use crypto::{approval_token, selection_seed, sha3};
pub use eligibility::EligibilityTracker;
pub use engine::{ConsensusEngine, EngineHandle};
pub use proposal::{Proposal, ProposalSelector, RoundPhase, SelectorError};
pub use treasury::{AuthorizationRecord, TreasuryAuthorizer};
pub use types::*;
