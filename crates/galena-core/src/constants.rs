//! Protocol constants shared across the miner.

/// Serialized block header length in bytes.
pub const HEADER_LEN: usize = 80;

/// Header length up to (excluding) the nonce field.
pub const HEADER_PREFIX_LEN: usize = 76;

/// Size of the nonce search space: the nonce is a 32-bit field.
pub const NONCE_SPACE: u64 = 1 << 32;

/// Transaction serialization version.
pub const TX_VERSION: u32 = 1;

/// Arbitrary data appended to the coinbase script-sig after the height push.
pub const COINBASE_TAG: &[u8] = b"galena";

/// Length of a P2PKH public key hash.
pub const PUBKEY_HASH_LEN: usize = 20;

/// scrypt cost factor (log2): N = 1024.
pub const POW_LOG_N: u8 = 10;

/// scrypt block-mixing factor.
pub const POW_R: u32 = 1;

/// scrypt parallelism factor.
pub const POW_P: u32 = 1;
