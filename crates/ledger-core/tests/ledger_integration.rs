mod helpers;

use helpers::{create_chain, create_parties};
use ledger_core::{
    chain::genesis_previous_hash, party::exchange_public_keys, CandidateBlock, Chain,
    LedgerConfig, Transaction,
};
use std::time::Duration;

const BUDGET: Duration = Duration::from_secs(30);

fn issue(chain: &mut Chain, from: &str, to: &str, value: u64) -> Transaction {
    let tx = chain
        .party_mut(from)
        .expect("known party")
        .create_transaction(to, value)
        .expect("transaction should be issued");
    chain.admit_to_pool(tx.clone());
    tx
}

#[test]
fn genesis_only_chain_is_valid() {
    let chain = create_chain(1);
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.validate_chain(), (true, "valid".to_string()));
}

#[test]
fn validate_chain_is_idempotent() {
    let mut chain = create_chain(3);
    issue(&mut chain, "Party_0", "Party_2", 50);
    let block = chain.seal_next_block(BUDGET).expect("block should seal");
    assert!(chain.admit_block(block));
    let first = chain.validate_chain();
    for _ in 0..3 {
        assert_eq!(chain.validate_chain(), first);
    }
    assert!(first.0);
}

#[test]
fn transfer_scenario() {
    let mut parties = create_parties(3);
    exchange_public_keys(&mut parties);
    let tx = parties[0]
        .create_transaction("Party_1", 100)
        .expect("transaction should be issued");
    assert_eq!(parties[0].balance(), 900);
    assert!(parties[1].verify_transaction(&tx));
    assert!(parties[2].verify_transaction(&tx));
}

#[test]
fn zero_value_transaction_is_rejected() {
    let mut parties = create_parties(2);
    exchange_public_keys(&mut parties);
    assert!(parties[0].create_transaction("Party_1", 0).is_none());
    assert_eq!(parties[0].balance(), 1000);
}

#[test]
fn balance_never_goes_negative() {
    let mut parties = create_parties(2);
    exchange_public_keys(&mut parties);
    let mut spent = 0;
    for value in [400, 400, 400, 150, 60, 50] {
        let before = parties[0].balance();
        match parties[0].create_transaction("Party_1", value) {
            Some(_) => {
                spent += value;
                assert_eq!(parties[0].balance(), before - value);
            }
            None => {
                assert!(value > before);
                assert_eq!(parties[0].balance(), before);
            }
        }
    }
    assert_eq!(parties[0].balance(), 1000 - spent);
}

#[test]
fn tampered_transaction_fails_while_original_verifies() {
    let mut parties = create_parties(2);
    exchange_public_keys(&mut parties);
    let tx = parties[0].create_transaction("Party_1", 100).unwrap();
    let mut json = serde_json::to_value(&tx).unwrap();
    json["value"] = serde_json::json!(101);
    let tampered: Transaction = serde_json::from_value(json).unwrap();
    assert!(!parties[1].verify_transaction(&tampered));
    assert!(parties[1].verify_transaction(&tx));
}

#[test]
fn mismatched_previous_hash_is_rejected() {
    let mut chain = create_chain(2);
    let forged = CandidateBlock::new(1, genesis_previous_hash(), vec![], 1_600_000_000)
        .seal(chain.config().difficulty, BUDGET)
        .unwrap();
    assert!(!chain.verify_block(&forged));
    assert!(!chain.admit_block(forged));
    assert_eq!(chain.len(), 1);
}

#[test]
fn sealed_blocks_meet_difficulty_and_link() {
    let mut chain = create_chain(4);
    for round in 0..3 {
        for i in 0..4 {
            let to = format!("Party_{}", (i + 1) % 4);
            issue(&mut chain, &format!("Party_{i}"), &to, 10 + round);
        }
        let block = chain.seal_next_block(BUDGET).expect("block should seal");
        assert!(block.hash().starts_with("00"));
        assert!(chain.admit_block(block));
    }
    assert!(chain.pool().is_empty());
    for (i, pair) in chain.blocks().windows(2).enumerate() {
        assert_eq!(pair[1].index(), i as u64 + 1);
        assert_eq!(pair[1].previous_hash(), pair[0].hash());
    }
    assert_eq!(chain.total_transactions(), 12);
    assert_eq!(chain.total_blocks(), 4);
    assert_eq!(chain.validate_chain(), (true, "valid".to_string()));
}

#[test]
fn pool_is_fifo_and_capped_per_block() {
    let config = LedgerConfig {
        max_transactions_per_block: 2,
        ..LedgerConfig::default()
    };
    let mut chain = Chain::initialize(create_parties(3), config).unwrap();
    let first = issue(&mut chain, "Party_0", "Party_1", 1);
    let second = issue(&mut chain, "Party_1", "Party_2", 2);
    let third = issue(&mut chain, "Party_2", "Party_0", 3);

    let block = chain.seal_next_block(BUDGET).unwrap();
    assert_eq!(block.transactions(), &[first, second]);
    assert!(chain.admit_block(block));
    assert_eq!(chain.pool(), &[third]);
}

#[test]
fn resubmitting_an_admitted_block_is_rejected() {
    let mut chain = create_chain(2);
    issue(&mut chain, "Party_0", "Party_1", 5);
    let block = chain.seal_next_block(BUDGET).unwrap();
    assert!(chain.admit_block(block.clone()));
    assert!(!chain.admit_block(block));
    assert_eq!(chain.len(), 2);
}

#[test]
fn one_endorsement_is_enough_to_admit() {
    let mut chain = create_chain(3);
    let tx = issue(&mut chain, "Party_0", "Party_1", 600);
    let sender = chain.party("Party_0").expect("known party");
    assert_eq!(sender.balance(), 400);
    assert!(!sender.verify_transaction(&tx));
    assert!(chain.party("Party_1").unwrap().verify_transaction(&tx));

    let block = chain.seal_next_block(BUDGET).expect("block should seal");
    assert!(chain.admit_block(block));
    assert!(chain.pool().is_empty());
    assert_eq!(chain.validate_chain(), (true, "valid".to_string()));
}
