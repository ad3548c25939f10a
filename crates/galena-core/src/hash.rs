//! Hashing primitives: double SHA-256, the scrypt proof-of-work hash, and
//! little-endian 256-bit magnitude comparison.

use scrypt::Params;
use sha2::{Digest, Sha256};

use crate::constants::{HEADER_LEN, POW_LOG_N, POW_P, POW_R};

/// Double SHA-256: `sha256(sha256(data))`.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// The memory-hard proof-of-work hash of an 80-byte serialized header.
///
/// scrypt with N=1024, r=1, p=1 and a 32-byte output, using the header as
/// both password and salt. The output is interpreted as a little-endian
/// 256-bit magnitude for target comparison.
pub fn scrypt_pow(header: &[u8; HEADER_LEN]) -> [u8; 32] {
    let params = Params::new(POW_LOG_N, POW_R, POW_P, 32).expect("fixed scrypt params are valid");
    let mut out = [0u8; 32];
    scrypt::scrypt(header, header, &params, &mut out).expect("32-byte output is valid");
    out
}

/// Compare two 32-byte little-endian magnitudes; true iff `a ≤ b`.
///
/// The wire encoding is little-endian while the target comparison is
/// numeric, so bytes are compared from the most significant (index 31)
/// downward.
pub fn leq_le(a: &[u8; 32], b: &[u8; 32]) -> bool {
    for i in (0..32).rev() {
        if a[i] != b[i] {
            return a[i] < b[i];
        }
    }
    true
}
