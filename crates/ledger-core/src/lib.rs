//! Single-node proof-of-work ledger engine.
//!
//! Parties sign value transfers, transactions wait in a pool, and the [`chain::Chain`]
//! seals pooled transactions into hash-linked blocks by brute-force nonce search.
//!
//! # Canonical encoding
//!
//! A transaction is signed over the UTF-8 bytes of `sender ‖ receiver ‖ value ‖ timestamp`
//! (plain concatenation, numbers in their `Display` form). A block hash is the SHA-256 of
//! the compact JSON object `{"index","previous_hash","transactions","timestamp","nonce"}`
//! in exactly that key order, each transaction encoded as
//! `{"sender","receiver","value","timestamp","signature"}` with the signature hex-encoded.
//! This is not the sorted-key, space-separated JSON some other ledgers hash, so digests
//! are not interchangeable with such encodings.

pub mod chain;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod mine;
pub mod party;

pub use chain::Chain;
pub use config::{CooldownPolicy, LedgerConfig, PartyConfig};
pub use crypto::{KeyPair, Signature};
pub use error::{LedgerError, MiningTimeout, Result};
pub use mine::{CandidateBlock, SealedBlock};
pub use party::Party;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// A value transfer. Immutable once signed; equality is structural over every field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender: String,
    receiver: String,
    value: u64,
    timestamp: f64,
    signature: Option<Signature>,
}

impl Transaction {
    /// An unsigned transfer stamped with the current time.
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, value: u64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            value,
            timestamp: unix_time(),
            signature: None,
        }
    }

    /// Attaches a signature over [`Transaction::signing_bytes`].
    pub fn sign(mut self, keys: &KeyPair) -> Result<Self> {
        let signature = keys.sign(&self.signing_bytes())?;
        self.signature = Some(signature);
        Ok(self)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn signing_bytes(&self) -> Vec<u8> {
        format!(
            "{}{}{}{}",
            self.sender, self.receiver, self.value, self.timestamp
        )
        .into_bytes()
    }
}

pub mod pow {
    use sha2::{Digest, Sha256};

    pub fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    /// Number of leading `'0'` characters in a hex digest.
    pub fn count_leading_zero_digits(hash_hex: &str) -> usize {
        hash_hex.bytes().take_while(|b| *b == b'0').count()
    }

    pub fn meets_difficulty(hash_hex: &str, difficulty: usize) -> bool {
        count_leading_zero_digits(hash_hex) >= difficulty
    }
}
