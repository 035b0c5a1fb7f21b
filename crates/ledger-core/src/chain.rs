//! The ledger engine: pending pool, sealed chain and the parties that vouch for it.

use crate::{
    config::LedgerConfig,
    constants::HASH_HEX_SIZE,
    error::{LedgerError, Result},
    mine::{CandidateBlock, SealedBlock},
    party::{exchange_public_keys, Party},
    pow, Transaction,
};
use rayon::prelude::*;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Previous-hash value carried by the genesis block.
pub fn genesis_previous_hash() -> String {
    "0".repeat(HASH_HEX_SIZE)
}

/// Party with the numerically smallest address.
pub fn select_miner(parties: &[Party]) -> Option<&Party> {
    parties.iter().min_by_key(|p| u32::from(p.address()))
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Append-only chain of sealed blocks plus the pool of transactions waiting for one.
///
/// The engine owns the party set and is the single writer for pool, chain and
/// balances; callers drive it one step at a time.
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<SealedBlock>,
    pool: Vec<Transaction>,
    parties: Vec<Party>,
    config: LedgerConfig,
    last_sealed: Instant,
    total_transactions: u64,
    total_blocks: u64,
}

impl Chain {
    /// Exchanges public keys between `parties` and seals the genesis block.
    ///
    /// Failing to seal genesis within the mining budget is fatal.
    pub fn initialize(mut parties: Vec<Party>, config: LedgerConfig) -> Result<Self> {
        exchange_public_keys(&mut parties);
        let genesis = CandidateBlock::new(0, genesis_previous_hash(), vec![], unix_secs())
            .seal(config.difficulty, config.mining_time_budget)
            .map_err(|e| match e {
                LedgerError::MiningTimeout(t) => LedgerError::GenesisSealing(t),
                other => other,
            })?;
        info!(
            parties = parties.len(),
            hash = %genesis.hash(),
            "initialized chain with genesis block"
        );
        Ok(Self {
            blocks: vec![genesis],
            pool: Vec::new(),
            parties,
            config,
            last_sealed: Instant::now(),
            total_transactions: 0,
            total_blocks: 1,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[SealedBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false once initialized; genesis is never removed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&SealedBlock> {
        self.blocks.last()
    }

    pub fn pool(&self) -> &[Transaction] {
        &self.pool
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn party(&self, name: &str) -> Option<&Party> {
        self.parties.iter().find(|p| p.name() == name)
    }

    pub fn party_mut(&mut self, name: &str) -> Result<&mut Party> {
        self.parties
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| LedgerError::UnknownParty(name.to_string()))
    }

    pub fn total_transactions(&self) -> u64 {
        self.total_transactions
    }

    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// The chain has reached `max_blocks` and will not seal further blocks.
    pub fn is_complete(&self) -> bool {
        self.blocks.len() >= self.config.max_blocks
    }

    /// Queues a transaction. Validation is deferred to sealing.
    pub fn admit_to_pool(&mut self, tx: Transaction) {
        debug!(
            sender = tx.sender(),
            receiver = tx.receiver(),
            value = tx.value(),
            pool = self.pool.len() + 1,
            "transaction added to pool"
        );
        self.pool.push(tx);
        self.total_transactions += 1;
    }

    pub fn should_seal(&self) -> bool {
        if self.pool.len() >= self.config.min_transactions {
            debug!(pool = self.pool.len(), "seal triggered by pool size");
            return true;
        }
        if self.last_sealed.elapsed() >= self.config.seal_interval {
            debug!("seal triggered by elapsed time");
            return true;
        }
        false
    }

    pub fn select_miner(&self) -> Option<&Party> {
        select_miner(&self.parties)
    }

    /// Mines the next block from the head of the pool.
    ///
    /// The pool is never modified here; the returned block's transactions leave the
    /// pool on [`Chain::admit_block`]. Returns `None` on timeout, when the sealed block
    /// does not verify, or when the chain is complete.
    pub fn seal_next_block(&self, budget: Duration) -> Option<SealedBlock> {
        if self.is_complete() {
            info!(max_blocks = self.config.max_blocks, "chain reached maximum length");
            return None;
        }
        let tip = self.tip()?;
        let take = self.pool.len().min(self.config.max_transactions_per_block);
        let transactions = self.pool[..take].to_vec();
        let index = self.blocks.len() as u64;

        if let Some(miner) = self.select_miner() {
            info!(
                miner = miner.name(),
                address = %miner.address(),
                index,
                transactions = take,
                "mining block"
            );
        }

        let candidate = CandidateBlock::new(index, tip.hash(), transactions, unix_secs());
        let block = match candidate.seal(self.config.difficulty, budget) {
            Ok(block) => block,
            Err(e) => {
                warn!(index, error = %e, "failed to seal block");
                return None;
            }
        };
        if !self.verify_block(&block) {
            warn!(index, "sealed block failed verification; discarding");
            return None;
        }
        Some(block)
    }

    /// Difficulty, endorsement of every transaction by at least one party, and linkage
    /// to the block preceding it in this chain.
    pub fn verify_block(&self, block: &SealedBlock) -> bool {
        let index = block.index();
        if !pow::meets_difficulty(block.hash(), self.config.difficulty) {
            warn!(index, hash = block.hash(), "block hash does not meet difficulty");
            return false;
        }
        match block.recompute_hash() {
            Ok(hash) if hash == block.hash() => {}
            Ok(_) => {
                warn!(index, "block hash does not match its contents");
                return false;
            }
            Err(e) => {
                warn!(index, error = %e, "could not recompute block hash");
                return false;
            }
        }

        let endorsed = block
            .transactions()
            .par_iter()
            .all(|tx| self.parties.iter().any(|p| p.verify_transaction(tx)));
        if !endorsed {
            warn!(index, "block contains a transaction no party can verify");
            return false;
        }

        if index > 0 {
            let Some(previous) = self.blocks.get(index as usize - 1) else {
                warn!(index, "block has no predecessor in the chain");
                return false;
            };
            if block.previous_hash() != previous.hash() {
                warn!(index, "block is not linked to its predecessor");
                return false;
            }
        }
        debug!(index, "block verified");
        true
    }

    /// Appends a verified block at the tip and purges its transactions from the pool.
    pub fn admit_block(&mut self, block: SealedBlock) -> bool {
        let index = block.index();
        info!(index, "admitting block");
        if !self.verify_block(&block) {
            warn!(index, "block rejected: verification failed");
            return false;
        }
        if index != self.blocks.len() as u64 {
            warn!(index, expected = self.blocks.len(), "block rejected: wrong index");
            return false;
        }
        if index > 0 {
            let tip_hash = self.tip().map(SealedBlock::hash);
            if tip_hash != Some(block.previous_hash()) {
                warn!(index, "block rejected: previous hash does not match tip");
                return false;
            }
        }

        let before = self.pool.len();
        self.pool.retain(|tx| !block.transactions().contains(tx));
        debug!(index, purged = before - self.pool.len(), "pool purged");
        self.blocks.push(block);
        self.total_blocks += 1;
        self.last_sealed = Instant::now();
        info!(index, height = self.blocks.len(), "block admitted");
        true
    }

    /// Re-checks the whole chain in ascending order and reports the first failure.
    pub fn validate_chain(&self) -> (bool, String) {
        debug!(blocks = self.blocks.len(), "validating chain");
        let Some(genesis) = self.blocks.first() else {
            return (false, "chain is empty".to_string());
        };
        if genesis.index() != 0 || genesis.previous_hash() != genesis_previous_hash() {
            return (false, "genesis block is invalid".to_string());
        }
        for (i, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let i = i + 1;
            if current.index() != i as u64 {
                return (false, format!("block {i} has index {}", current.index()));
            }
            if current.previous_hash() != previous.hash() {
                return (false, format!("block {i} previous hash mismatch"));
            }
            if !self.verify_block(current) {
                return (false, format!("block {i} failed verification"));
            }
        }
        info!(blocks = self.blocks.len(), "chain is valid");
        (true, "valid".to_string())
    }

    /// Pretty JSON dump of every block, in chain order.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }
}
