//! Candidate block assembly: coinbase serialization, merkle root, header
//! prefix, and nonce splicing.
//!
//! A [`CandidateBlock`] is an immutable snapshot of one template: every
//! header field except the nonce is fixed for the lifetime of the template,
//! and the nonce is a 4-byte slot the search engine rewrites per candidate.

use crate::address::decode_address;
use crate::codec::{compact_size, le_bytes};
use crate::constants::{COINBASE_TAG, HEADER_LEN, HEADER_PREFIX_LEN, PUBKEY_HASH_LEN, TX_VERSION};
use crate::error::AddressError;
use crate::hash::sha256d;
use crate::merkle::merkle_root;
use crate::types::{BlockTemplate, Hash256};

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// A fully assembled block minus its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBlock {
    /// Header bytes up to the nonce: version ‖ prev ‖ merkle ‖ time ‖ bits,
    /// all in little-endian wire order.
    header_prefix: [u8; HEADER_PREFIX_LEN],
    /// Everything after the header: compact-size tx count, coinbase bytes,
    /// then each template transaction's raw bytes.
    transactions: Vec<u8>,
    /// The 256-bit target, little-endian.
    target_le: [u8; 32],
    /// Block height, for reporting.
    height: u64,
}

impl CandidateBlock {
    /// The fixed header portion preceding the nonce slot.
    pub fn header_prefix(&self) -> &[u8; HEADER_PREFIX_LEN] {
        &self.header_prefix
    }

    /// The target in little-endian byte order.
    pub fn target_le(&self) -> &[u8; 32] {
        &self.target_le
    }

    /// Block height this candidate was built for.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The full 80-byte header with `nonce` spliced into its slot.
    pub fn header(&self, nonce: u32) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[..HEADER_PREFIX_LEN].copy_from_slice(&self.header_prefix);
        header[HEADER_PREFIX_LEN..].copy_from_slice(&nonce.to_le_bytes());
        header
    }

    /// The submittable block as a hex string, with `nonce` spliced in.
    pub fn block_hex(&self, nonce: u32) -> String {
        let mut block = Vec::with_capacity(HEADER_LEN + self.transactions.len());
        block.extend_from_slice(&self.header(nonce));
        block.extend_from_slice(&self.transactions);
        hex::encode(block)
    }
}

/// Serialize the coinbase transaction for a template.
///
/// One null input whose script-sig pushes the 3 low little-endian bytes of
/// the block height followed by [`COINBASE_TAG`], and one P2PKH output
/// paying the template's full coinbase value to `pubkey_hash`.
pub fn build_coinbase(template: &BlockTemplate, pubkey_hash: &[u8; PUBKEY_HASH_LEN]) -> Vec<u8> {
    let height_le = le_bytes(template.height, 8);
    let mut script_sig = Vec::with_capacity(4 + COINBASE_TAG.len());
    script_sig.push(3);
    script_sig.extend_from_slice(&height_le[..3]);
    script_sig.extend_from_slice(COINBASE_TAG);

    let mut script_pubkey = Vec::with_capacity(5 + PUBKEY_HASH_LEN);
    script_pubkey.extend_from_slice(&[OP_DUP, OP_HASH160, PUBKEY_HASH_LEN as u8]);
    script_pubkey.extend_from_slice(pubkey_hash);
    script_pubkey.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);

    let mut tx = Vec::with_capacity(96 + script_sig.len());
    tx.extend_from_slice(&TX_VERSION.to_le_bytes());
    tx.push(1); // input count
    tx.extend_from_slice(&[0u8; 32]); // null previous txid
    tx.extend_from_slice(&[0xff; 4]); // previous output index
    tx.push(script_sig.len() as u8);
    tx.extend_from_slice(&script_sig);
    tx.extend_from_slice(&[0xff; 4]); // sequence
    tx.push(1); // output count
    tx.extend_from_slice(&template.coinbase_value.to_le_bytes());
    tx.push(script_pubkey.len() as u8);
    tx.extend_from_slice(&script_pubkey);
    tx.extend_from_slice(&[0u8; 4]); // locktime
    tx
}

/// Assemble a [`CandidateBlock`] from a template and a payout address.
///
/// The merkle root covers the coinbase txid followed by each template
/// transaction's id converted to internal byte order; with no template
/// transactions the root is the coinbase txid alone. The nonce slot starts
/// at zero. A malformed wallet address fails the build.
pub fn build_block(
    template: &BlockTemplate,
    wallet_address: &str,
) -> Result<CandidateBlock, AddressError> {
    let pubkey_hash = decode_address(wallet_address)?;
    let coinbase = build_coinbase(template, &pubkey_hash);
    let coinbase_txid = Hash256(sha256d(&coinbase));

    let mut txids = Vec::with_capacity(1 + template.transactions.len());
    txids.push(coinbase_txid);
    txids.extend(template.transactions.iter().map(|tx| tx.txid.reversed()));
    let root = merkle_root(&txids);

    let mut prefix = [0u8; HEADER_PREFIX_LEN];
    prefix[0..4].copy_from_slice(&template.version.to_le_bytes());
    prefix[4..36].copy_from_slice(template.prev_hash.reversed().as_bytes());
    prefix[36..68].copy_from_slice(root.as_bytes());
    prefix[68..72].copy_from_slice(&template.cur_time.to_le_bytes());
    let mut bits = template.bits;
    bits.reverse();
    prefix[72..76].copy_from_slice(&bits);

    let mut transactions = compact_size(template.transactions.len() as u64 + 1);
    transactions.extend_from_slice(&coinbase);
    for tx in &template.transactions {
        transactions.extend_from_slice(&tx.data);
    }

    Ok(CandidateBlock {
        header_prefix: prefix,
        transactions,
        target_le: template.target_le(),
        height: template.height,
    })
}
