use crate::{
    constants::POW_PROGRESS_INTERVAL,
    error::{MiningTimeout, Result},
    pow, Transaction,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Field order here is the hash contract; do not reorder.
#[derive(Serialize)]
struct HashInput<'a> {
    index: u64,
    previous_hash: &'a str,
    transactions: &'a [Transaction],
    timestamp: u64,
    nonce: u64,
}

fn block_hash(
    index: u64,
    previous_hash: &str,
    transactions: &[Transaction],
    timestamp: u64,
    nonce: u64,
) -> Result<String> {
    let bytes = serde_json::to_vec(&HashInput {
        index,
        previous_hash,
        transactions,
        timestamp,
        nonce,
    })?;
    Ok(pow::sha256_hex(&bytes))
}

/// A block under construction. Only the nonce changes while mining.
#[derive(Clone, Debug)]
pub struct CandidateBlock {
    index: u64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    timestamp: u64,
    nonce: u64,
}

impl CandidateBlock {
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        timestamp: u64,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            transactions,
            timestamp,
            nonce: 0,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> Result<String> {
        block_hash(
            self.index,
            &self.previous_hash,
            &self.transactions,
            self.timestamp,
            self.nonce,
        )
    }

    /// Increments the nonce until the hash starts with `difficulty` zero hex digits.
    ///
    /// Gives up with [`MiningTimeout`] once `budget` has elapsed since this call
    /// started. The nonce wraps on overflow; the deadline bounds the search.
    /// The timeout arrives as [`LedgerError::MiningTimeout`](crate::LedgerError::MiningTimeout);
    /// the only other error is a failed canonical encoding.
    pub fn seal(mut self, difficulty: usize, budget: Duration) -> Result<SealedBlock> {
        let start = Instant::now();
        let mut attempts: u64 = 0;
        loop {
            let elapsed = start.elapsed();
            if elapsed >= budget {
                warn!(index = self.index, attempts, ?elapsed, "mining timed out");
                return Err(MiningTimeout {
                    index: self.index,
                    attempts,
                    elapsed,
                }
                .into());
            }

            let hash = self.hash()?;
            if pow::meets_difficulty(&hash, difficulty) {
                info!(
                    index = self.index,
                    nonce = self.nonce,
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "sealed block {}",
                    &hash[..16]
                );
                return Ok(SealedBlock {
                    index: self.index,
                    previous_hash: self.previous_hash,
                    transactions: self.transactions,
                    timestamp: self.timestamp,
                    nonce: self.nonce,
                    hash,
                });
            }

            self.nonce = self.nonce.wrapping_add(1);
            attempts += 1;
            if attempts % POW_PROGRESS_INTERVAL == 0 {
                debug!(index = self.index, attempts, "mining in progress");
            }
        }
    }
}

/// A block whose hash satisfied the difficulty predicate. Immutable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SealedBlock {
    pub(crate) index: u64,
    pub(crate) previous_hash: String,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) timestamp: u64,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
}

impl SealedBlock {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hash recomputed from the block's current fields.
    pub fn recompute_hash(&self) -> Result<String> {
        block_hash(
            self.index,
            &self.previous_hash,
            &self.transactions,
            self.timestamp,
            self.nonce,
        )
    }
}
