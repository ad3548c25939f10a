//! Merkle root over transaction ids.
//!
//! Pairs adjacent ids and hashes each pair with `sha256d(left ‖ right)`,
//! duplicating the last id when a layer has an odd count. Ids must already
//! be in internal (little-endian) byte order.

use crate::hash::sha256d;
use crate::types::Hash256;

/// Compute the merkle root from an ordered list of transaction ids.
///
/// A single id is its own root. The list is never empty in practice (the
/// coinbase id is always present); an empty list yields [`Hash256::ZERO`].
pub fn merkle_root(ids: &[Hash256]) -> Hash256 {
    if ids.is_empty() {
        return Hash256::ZERO;
    }

    let mut current = ids.to_vec();
    while current.len() > 1 {
        current = next_layer(&current);
    }
    current[0]
}

/// Compute the next layer of the tree, duplicating the last element when
/// the layer has an odd number of entries.
fn next_layer(layer: &[Hash256]) -> Vec<Hash256> {
    let mut next = Vec::with_capacity(layer.len().div_ceil(2));
    let mut i = 0;
    while i < layer.len() {
        let left = &layer[i];
        let right = if i + 1 < layer.len() {
            &layer[i + 1]
        } else {
            left
        };
        let mut pair = [0u8; 64];
        pair[..32].copy_from_slice(left.as_bytes());
        pair[32..].copy_from_slice(right.as_bytes());
        next.push(Hash256(sha256d(&pair)));
        i += 2;
    }
    next
}
