use ledger_core::{Chain, CooldownPolicy, LedgerConfig, Party, PartyConfig};
use rand::{rngs::StdRng, SeedableRng};

pub fn party_config() -> PartyConfig {
    // Small keys and no cooldown keep the tests fast and deterministic.
    PartyConfig {
        key_bits: 1024,
        cooldown: CooldownPolicy::disabled(),
        ..PartyConfig::default()
    }
}

pub fn create_parties(n: usize) -> Vec<Party> {
    let config = party_config();
    (0..n)
        .map(|i| {
            Party::new(
                format!("Party_{i}"),
                &config,
                StdRng::seed_from_u64(1_000 + i as u64),
            )
            .expect("Failed to create party")
        })
        .collect()
}

pub fn create_chain(n: usize) -> Chain {
    Chain::initialize(create_parties(n), LedgerConfig::default()).expect("Failed to seal genesis")
}
