//! Vuser round driver
//!
//! Runs one Proof of Participation round in-process: feeds transaction
//! senders into eligibility, collects proposals, selects a leader and its
//! fallback chain, checks a sponsor approval and splits the block reward.

use clap::Parser;
use vuser::{
    crypto::parse_seed, selection_seed, sha3, Address, CoalitionTreasury, ConsensusEngine,
    EngineConfig, EngineHandle, SelectionMode, DEFAULT_ELIGIBILITY_CAPACITY,
};
use tracing::{error, info, warn};

/// Vuser version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "vuser", version, about = "Vuser: Proof of Participation round driver")]
struct Args {
    /// Eligibility pool size (most recent unique senders)
    #[arg(short, long, default_value_t = DEFAULT_ELIGIBILITY_CAPACITY)]
    capacity: usize,

    /// Transaction senders in arrival order (comma-separated)
    #[arg(short, long, default_value = "Addr1,Addr2,Addr3,Addr4,Addr5")]
    senders: String,

    /// 32-byte hex selection seed; enables seeded leader selection
    #[arg(long)]
    seed: Option<String>,

    /// Seeded selection with a seed derived from --round when --seed is absent
    #[arg(long)]
    seeded: bool,

    /// Round number mixed into the derived seed
    #[arg(short, long, default_value_t = 1)]
    round: u64,

    /// Approval token lifetime in seconds (default: never expires)
    #[arg(short, long)]
    window_secs: Option<u64>,

    /// Wallet to approve for fee-free actions
    #[arg(long)]
    sponsor: Option<String>,

    /// Fees of the transactions in the winning block (comma-separated)
    #[arg(short, long)]
    fees: Option<String>,

    /// Coalition treasury genesis balance
    #[arg(long, default_value_t = 0)]
    treasury_balance: u128,
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Only seeded mode needs a seed
    let seed = match &args.seed {
        Some(s) => Some(parse_seed(s).ok_or("seed must be 32 bytes of hex")?),
        None if args.seeded => Some(selection_seed(&sha3(b"vuser-genesis"), args.round)),
        None => None,
    };

    let config = EngineConfig {
        eligibility_capacity: args.capacity,
        approval_window_secs: args.window_secs,
        selection: if seed.is_some() {
            SelectionMode::Seeded
        } else {
            SelectionMode::Random
        },
    };
    let handle = EngineHandle::new(ConsensusEngine::new(config)?);

    // Transaction pool: every accepted tx refreshes its sender
    for sender in split_list(&args.senders) {
        if let Some(evicted) = handle.record_activity(Address::new(sender)).await {
            info!("Eligibility: {} rotated out", evicted);
        }
    }
    let mut eligible = handle.list_eligible().await;
    eligible.sort();
    info!("Eligible miners ({}): {:?}", eligible.len(), eligible);

    // Pre-submission: each eligible miner proposes once
    for miner in &eligible {
        let payload = format!("Block Data from {}", miner).into_bytes();
        handle.submit(miner.clone(), payload).await?;
    }

    let leader = match &seed {
        Some(seed) => handle.select_by_seed(seed).await?,
        None => handle.select_primary().await?,
    };
    info!("Primary miner: {}", leader.proposer);

    let mut chain = Vec::with_capacity(eligible.len());
    let mut current = leader.proposer.clone();
    for _ in 1..eligible.len() {
        let next = handle.get_fallback(&current).await?;
        current = next.proposer;
        chain.push(current.to_string());
    }
    if !chain.is_empty() {
        info!("Fallback chain: {}", chain.join(" → "));
    }

    if let Some(wallet) = args.sponsor.map(Address::new) {
        let token = handle.authorize(wallet.clone()).await;
        info!("Treasury approved {} with token {}", wallet, token);
        let funded = handle.verify_now(&wallet, &token).await;
        let leader_sponsored = handle
            .with_engine(|e| e.is_sponsored(&leader, &token))
            .await;
        info!("Action funded: {} | leader sponsored: {}", funded, leader_sponsored);
    }

    let fees: Vec<u128> = match &args.fees {
        Some(list) => split_list(list)
            .iter()
            .map(|f| f.parse::<u128>())
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };
    let mut treasury = CoalitionTreasury::new(args.treasury_balance);
    let split = treasury.credit_block_reward(&fees)?;
    info!(
        "Reward: miner {} = {} | coalition = {} | burnt = {}",
        leader.proposer, split.miner, split.coalition, split.burnt
    );
    let stats = treasury.stats();
    info!(
        "Treasury: balance {} | received {} | spent {} | entries {}",
        stats.balance, stats.total_received, stats.total_spent, stats.transaction_count
    );

    handle.clear_round().await;
    info!("Round {} complete", args.round);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vuser=info".parse().expect("static directive")),
        )
        .init();

    let args = Args::parse();

    info!("════════════════════════════════════════════════════════════");
    info!("  Vuser v{} — Proof of Participation", VERSION);
    info!("════════════════════════════════════════════════════════════");
    if args.seed.is_none() && !args.seeded {
        warn!("No --seed given: leader drawn from local RNG, other nodes may disagree");
    }

    if let Err(e) = run(args).await {
        error!("Round failed: {}", e);
        std::process::exit(1);
    }
}
