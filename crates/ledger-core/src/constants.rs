pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const POW_TARGET_DIFFICULTY: usize = 2;
pub const POW_PROGRESS_INTERVAL: u64 = 1000;
pub const MIN_TRANSACTIONS_TO_SEAL: usize = 5;
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 20;
pub const MAX_BLOCKS: usize = 10;
pub const SEAL_INTERVAL_SECS: u64 = 60;
pub const MINING_TIME_BUDGET_SECS: u64 = 60;
pub const INITIAL_BALANCE: u64 = 1000;
pub const RSA_KEY_BITS: usize = 2048;
pub const COOLDOWN_MIN_MS: u64 = 1_000;
pub const COOLDOWN_MAX_MS: u64 = 16_000;
