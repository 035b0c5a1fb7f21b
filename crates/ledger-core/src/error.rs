use std::time::Duration;
use thiserror::Error;

/// Proof-of-work search ran out of its time budget before finding a nonce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mining block {index} timed out after {attempts} attempts ({elapsed:?})")]
pub struct MiningTimeout {
    pub index: u64,
    pub attempts: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    MiningTimeout(#[from] MiningTimeout),

    #[error("genesis block could not be sealed: {0}")]
    GenesisSealing(#[source] MiningTimeout),

    #[error("unknown party: {0}")]
    UnknownParty(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
