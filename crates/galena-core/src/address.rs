//! Payout address decoding.
//!
//! Wallet addresses are base58check: a version byte, the 20-byte public
//! key hash, and a 4-byte double-SHA-256 checksum. The miner only needs
//! the public key hash for the coinbase P2PKH output script; the version
//! byte is not pinned to a particular network here.

use crate::constants::PUBKEY_HASH_LEN;
use crate::error::AddressError;

/// Decode a base58check address into its 20-byte public key hash.
///
/// Verifies the checksum and drops the version byte. A malformed address
/// is a fatal input error for the current build attempt; the caller skips
/// the template rather than retrying.
pub fn decode_address(address: &str) -> Result<[u8; PUBKEY_HASH_LEN], AddressError> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| match e {
            bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
            other => AddressError::InvalidBase58(other.to_string()),
        })?;

    // version byte + pubkey hash
    if payload.len() != 1 + PUBKEY_HASH_LEN {
        return Err(AddressError::InvalidLength(payload.len()));
    }

    let mut hash = [0u8; PUBKEY_HASH_LEN];
    hash.copy_from_slice(&payload[1..]);
    Ok(hash)
}
