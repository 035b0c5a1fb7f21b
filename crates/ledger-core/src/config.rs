//! Tunables for the ledger engine and its parties.

use crate::constants::*;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading `'0'` hex digits a sealed block hash must start with.
    pub difficulty: usize,
    /// Pool size that triggers sealing.
    pub min_transactions: usize,
    /// Time since the last admitted block that triggers sealing regardless of pool size.
    pub seal_interval: Duration,
    pub max_transactions_per_block: usize,
    /// Chain length at which sealing stops.
    pub max_blocks: usize,
    /// Wall-clock budget for a single proof-of-work search.
    pub mining_time_budget: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
            min_transactions: MIN_TRANSACTIONS_TO_SEAL,
            seal_interval: Duration::from_secs(SEAL_INTERVAL_SECS),
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
            max_blocks: MAX_BLOCKS,
            mining_time_budget: Duration::from_secs(MINING_TIME_BUDGET_SECS),
        }
    }
}

/// Randomized minimum spacing between two transactions issued by the same party.
///
/// Each issuance attempt draws a fresh threshold uniformly from `[min, max]`, so whether
/// an attempt passes depends on the party's RNG. With `max <= min` the threshold is
/// fixed at `min`; a zero `min` and `max` disables the cooldown entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CooldownPolicy {
    pub min: Duration,
    pub max: Duration,
}

impl CooldownPolicy {
    pub const fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(COOLDOWN_MIN_MS),
            max: Duration::from_millis(COOLDOWN_MAX_MS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    pub initial_balance: u64,
    pub key_bits: usize,
    pub cooldown: CooldownPolicy,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            initial_balance: INITIAL_BALANCE,
            key_bits: RSA_KEY_BITS,
            cooldown: CooldownPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn cooldown_draw_stays_in_range() {
        let policy = CooldownPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let d = policy.draw(&mut rng);
            assert!(d >= policy.min && d <= policy.max, "{d:?} out of range");
        }
    }

    #[test]
    fn degenerate_cooldown_is_fixed() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(CooldownPolicy::disabled().draw(&mut rng), Duration::ZERO);
        let fixed = CooldownPolicy {
            min: Duration::from_secs(3),
            max: Duration::from_secs(1),
        };
        assert_eq!(fixed.draw(&mut rng), Duration::from_secs(3));
    }

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.difficulty, 2);
        assert_eq!(cfg.min_transactions, 5);
        assert_eq!(cfg.max_transactions_per_block, 20);
        assert_eq!(cfg.max_blocks, 10);
        assert_eq!(PartyConfig::default().initial_balance, 1000);
    }
}
