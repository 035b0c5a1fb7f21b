//! Simulated economic actors.

use crate::{
    config::{CooldownPolicy, PartyConfig},
    crypto::{self, KeyPair},
    error::Result,
    Transaction,
};
use rand::{rngs::StdRng, Rng};
use rsa::RsaPublicKey;
use std::{collections::HashMap, net::Ipv4Addr, time::Instant};
use tracing::{debug, info, warn};

/// An identity with a key pair, a balance and a directory of peer public keys.
///
/// The balance is debited when a transaction is created, not when it is mined. A
/// transaction that never makes it into a block is not refunded.
#[derive(Debug)]
pub struct Party {
    name: String,
    keys: KeyPair,
    balance: u64,
    peers: HashMap<String, RsaPublicKey>,
    last_transaction: Option<Instant>,
    address: Ipv4Addr,
    cooldown: CooldownPolicy,
    rng: StdRng,
}

impl Party {
    /// Creates a party whose key pair, address and cooldown draws all come from `rng`.
    pub fn new(name: impl Into<String>, config: &PartyConfig, mut rng: StdRng) -> Result<Self> {
        let name = name.into();
        let keys = KeyPair::generate(&mut rng, config.key_bits)?;
        let address = Ipv4Addr::from(rng.gen::<u32>());
        info!(party = %name, %address, "created party");
        Ok(Self {
            name,
            keys,
            balance: config.initial_balance,
            peers: HashMap::new(),
            last_transaction: None,
            address,
            cooldown: config.cooldown,
            rng,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Simulated network address; only used to pick a miner deterministically.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        self.keys.public_key()
    }

    pub fn add_public_key(&mut self, party: impl Into<String>, key: RsaPublicKey) {
        let party = party.into();
        debug!(party = %self.name, peer = %party, "registered public key");
        self.peers.insert(party, key);
    }

    /// Own key for our own name, otherwise the directory entry.
    pub fn public_key_of(&self, party: &str) -> Option<&RsaPublicKey> {
        if party == self.name {
            Some(self.keys.public_key())
        } else {
            self.peers.get(party)
        }
    }

    /// Issues a signed transfer to `receiver`, debiting `value` immediately.
    ///
    /// Returns `None` while the cooldown since the last issued transaction is running,
    /// for a zero value, a transfer to ourselves or an unaffordable value.
    pub fn create_transaction(&mut self, receiver: &str, value: u64) -> Option<Transaction> {
        let now = Instant::now();
        if let Some(last) = self.last_transaction {
            let threshold = self.cooldown.draw(&mut self.rng);
            if now.duration_since(last) < threshold {
                debug!(party = %self.name, ?threshold, "transaction cooldown still running");
                return None;
            }
        }
        if value == 0 {
            warn!(party = %self.name, value, "invalid transaction value");
            return None;
        }
        if receiver == self.name {
            warn!(party = %self.name, "sender and receiver are the same");
            return None;
        }
        if self.balance < value {
            warn!(
                party = %self.name,
                balance = self.balance,
                value,
                "insufficient balance"
            );
            return None;
        }

        let tx = match Transaction::new(self.name.clone(), receiver, value).sign(&self.keys) {
            Ok(tx) => tx,
            Err(e) => {
                warn!(party = %self.name, error = %e, "failed to sign transaction");
                return None;
            }
        };
        self.last_transaction = Some(now);
        self.balance -= value;
        debug!(
            party = %self.name,
            receiver,
            value,
            balance = self.balance,
            "created transaction"
        );
        Some(tx)
    }

    /// Checks shape, our own affordability when we are the sender, and the signature.
    pub fn verify_transaction(&self, tx: &Transaction) -> bool {
        if tx.sender().is_empty() || tx.receiver().is_empty() {
            warn!(party = %self.name, "transaction is missing sender or receiver");
            return false;
        }
        if tx.sender() == tx.receiver() {
            warn!(party = %self.name, sender = tx.sender(), "transaction sender equals receiver");
            return false;
        }
        let signature = match tx.signature() {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!(party = %self.name, "transaction is missing a signature");
                return false;
            }
        };
        if tx.sender() == self.name && self.balance < tx.value() {
            warn!(
                party = %self.name,
                balance = self.balance,
                value = tx.value(),
                "sender cannot cover transaction"
            );
            return false;
        }
        let Some(key) = self.public_key_of(tx.sender()) else {
            warn!(party = %self.name, sender = tx.sender(), "no public key for sender");
            return false;
        };
        if !crypto::verify(key, &tx.signing_bytes(), signature) {
            warn!(party = %self.name, sender = tx.sender(), "transaction signature rejected");
            return false;
        }
        debug!(
            party = %self.name,
            sender = tx.sender(),
            receiver = tx.receiver(),
            "transaction verified"
        );
        true
    }
}

/// Registers every party's public key with every other party.
pub fn exchange_public_keys(parties: &mut [Party]) {
    let directory: Vec<(String, RsaPublicKey)> = parties
        .iter()
        .map(|p| (p.name.clone(), p.public_key().clone()))
        .collect();
    for party in parties.iter_mut() {
        for (name, key) in &directory {
            if *name != party.name {
                party.add_public_key(name.clone(), key.clone());
            }
        }
    }
}
