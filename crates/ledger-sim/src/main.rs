//! Drives the ledger engine: random parties issue transfers, blocks are sealed when
//! the pool fills up or the seal interval passes, and the chain is spot-checked.
use anyhow::{ensure, Context, Result};
use clap::Parser;
use ledger_core::{constants, Chain, CooldownPolicy, LedgerConfig, Party, PartyConfig};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ledger-sim")]
#[command(about = "Single-node proof-of-work ledger simulation")]
struct Args {
    /// Number of parties
    #[arg(long, default_value_t = 5)]
    parties: usize,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    debug: bool,

    /// Seed for every random choice, including keys; fresh entropy when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Leading zero hex digits required of a block hash
    #[arg(long, default_value_t = constants::POW_TARGET_DIFFICULTY)]
    difficulty: usize,

    /// Pool size that triggers sealing
    #[arg(long, default_value_t = constants::MIN_TRANSACTIONS_TO_SEAL)]
    min_transactions: usize,

    #[arg(long, default_value_t = constants::MAX_TRANSACTIONS_PER_BLOCK)]
    max_transactions_per_block: usize,

    /// Stop once the chain holds this many blocks, genesis included
    #[arg(long, default_value_t = constants::MAX_BLOCKS)]
    max_blocks: usize,

    /// Seal even a short pool after this long without a new block
    #[arg(long, default_value_t = constants::SEAL_INTERVAL_SECS)]
    seal_interval_secs: u64,

    /// Time budget for a single proof-of-work search
    #[arg(long, default_value_t = constants::MINING_TIME_BUDGET_SECS)]
    mining_budget_secs: u64,

    /// RSA modulus size
    #[arg(long, default_value_t = constants::RSA_KEY_BITS)]
    key_bits: usize,

    #[arg(long, default_value_t = constants::COOLDOWN_MIN_MS)]
    cooldown_min_ms: u64,

    #[arg(long, default_value_t = constants::COOLDOWN_MAX_MS)]
    cooldown_max_ms: u64,

    /// Bounds of the random pause between ticks
    #[arg(long, default_value_t = 1_000)]
    delay_min_ms: u64,

    #[arg(long, default_value_t = 16_000)]
    delay_max_ms: u64,

    /// Chance per tick of re-validating the whole chain
    #[arg(long, default_value_t = 0.1)]
    validate_probability: f64,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            min_transactions: self.min_transactions,
            seal_interval: Duration::from_secs(self.seal_interval_secs),
            max_transactions_per_block: self.max_transactions_per_block,
            max_blocks: self.max_blocks,
            mining_time_budget: Duration::from_secs(self.mining_budget_secs),
        }
    }

    fn party_config(&self) -> PartyConfig {
        PartyConfig {
            initial_balance: constants::INITIAL_BALANCE,
            key_bits: self.key_bits,
            cooldown: CooldownPolicy {
                min: Duration::from_millis(self.cooldown_min_ms),
                max: Duration::from_millis(self.cooldown_max_ms),
            },
        }
    }

    fn delay(&self, rng: &mut StdRng) -> Duration {
        if self.delay_max_ms <= self.delay_min_ms {
            return Duration::from_millis(self.delay_min_ms);
        }
        Duration::from_millis(rng.gen_range(self.delay_min_ms..=self.delay_max_ms))
    }
}

/// One step of the simulation. Never awaits, so an interrupt can only land between ticks.
fn tick(chain: &mut Chain, rng: &mut StdRng, names: &[String], args: &Args) -> Result<()> {
    let sender = names.choose(rng).context("no parties")?;
    let others: Vec<&String> = names.iter().filter(|n| *n != sender).collect();
    let receiver = others.choose(rng).context("no receiver available")?;
    let value = rng.gen_range(1..=100);

    if let Some(tx) = chain.party_mut(sender)?.create_transaction(receiver, value) {
        chain.admit_to_pool(tx);
    }

    if chain.should_seal() {
        if let Some(block) = chain.seal_next_block(chain.config().mining_time_budget) {
            let index = block.index();
            if chain.admit_block(block) {
                info!(index, height = chain.len(), "block added to chain");
            }
        }
    }

    if rng.gen_bool(args.validate_probability) {
        let (valid, reason) = chain.validate_chain();
        if !valid {
            warn!(%reason, "chain validation failed");
        }
    }
    Ok(())
}

async fn run(chain: &mut Chain, rng: &mut StdRng, args: &Args) -> Result<()> {
    let names: Vec<String> = chain.parties().iter().map(|p| p.name().to_string()).collect();
    while !chain.is_complete() {
        tick(chain, rng, &names, args)?;
        let delay = args.delay(rng);
        debug!(?delay, "waiting");
        tokio::time::sleep(delay).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    ensure!(args.parties >= 2, "at least two parties are required");
    ensure!(
        (0.0..=1.0).contains(&args.validate_probability),
        "validate probability must be between 0 and 1"
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let party_config = args.party_config();
    let parties = (0..args.parties)
        .map(|i| Party::new(format!("Party_{i}"), &party_config, StdRng::seed_from_u64(rng.gen())))
        .collect::<ledger_core::Result<Vec<_>>>()
        .context("failed to create parties")?;
    let mut chain =
        Chain::initialize(parties, args.ledger_config()).context("failed to initialize chain")?;

    info!(parties = args.parties, "starting simulation");
    let started = Instant::now();
    tokio::select! {
        res = run(&mut chain, &mut rng, &args) => res?,
        _ = tokio::signal::ctrl_c() => info!("interrupted by user"),
    }
    info!(elapsed = ?started.elapsed(), "simulation finished");

    let (_, reason) = chain.validate_chain();
    println!("final validation: {reason}");
    println!("total blocks: {}", chain.total_blocks());
    println!("total transactions: {}", chain.total_transactions());
    println!("{}", chain.export_json()?);
    Ok(())
}
