//! Core types: hashes and block templates.
//!
//! Template fields arrive from the node as JSON with hex strings in
//! big-endian display order. [`RawBlockTemplate`] is the serde shape of
//! the `getblocktemplate` result; [`BlockTemplate`] is its typed form with
//! every field parsed into a fixed-width integer or fixed-length byte value
//! at ingestion. Endianness flips happen at serialization time, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TemplateError;

/// A 32-byte hash value.
///
/// Byte order is contextual: the node's JSON carries hashes in big-endian
/// display order, while hashing and header serialization use the reversed
/// (internal, little-endian) order. [`reversed`](Self::reversed) flips
/// between the two.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes). Used for the coinbase previous outpoint.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The same hash with its byte order reversed (big-endian display order
    /// to internal little-endian order, or back).
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0;
        bytes.reverse();
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One pending transaction in the raw `getblocktemplate` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTemplateTx {
    /// Transaction id, big-endian hex.
    pub txid: String,
    /// Full serialized transaction, hex.
    pub data: String,
}

/// The `getblocktemplate` result as it appears on the wire.
///
/// Field names match the node's JSON keys. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlockTemplate {
    pub version: u32,
    pub previousblockhash: String,
    #[serde(default)]
    pub transactions: Vec<RawTemplateTx>,
    pub coinbasevalue: u64,
    pub curtime: u32,
    #[serde(default)]
    pub mintime: u32,
    pub bits: String,
    pub target: String,
    pub height: u64,
}

/// A pending transaction, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTx {
    /// Transaction id, big-endian (as received).
    pub txid: Hash256,
    /// Full serialized transaction bytes.
    pub data: Vec<u8>,
}

/// A block template with every field parsed into its typed form.
///
/// Immutable once parsed; a newer template fully replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub version: u32,
    /// Previous block hash, big-endian (as received).
    pub prev_hash: Hash256,
    pub transactions: Vec<TemplateTx>,
    /// Total coinbase payout in base units (subsidy + fees).
    pub coinbase_value: u64,
    pub cur_time: u32,
    pub min_time: u32,
    /// Compact difficulty target, big-endian (as received).
    pub bits: [u8; 4],
    /// Expanded 256-bit target, big-endian (as received).
    pub target: Hash256,
    pub height: u64,
}

impl BlockTemplate {
    /// Parse a raw template, converting every hex field to bytes.
    ///
    /// Malformed hex or a wrong-length field is a [`TemplateError`]; the
    /// caller skips the template rather than crashing.
    pub fn from_raw(raw: RawBlockTemplate) -> Result<Self, TemplateError> {
        let prev_hash = parse_hash("previousblockhash", &raw.previousblockhash)?;
        let target = parse_hash("target", &raw.target)?;

        let bits_bytes = parse_hex("bits", &raw.bits)?;
        let bits: [u8; 4] = bits_bytes.as_slice().try_into().map_err(|_| {
            TemplateError::InvalidLength {
                field: "bits",
                expected: 4,
                got: bits_bytes.len(),
            }
        })?;

        let transactions = raw
            .transactions
            .into_iter()
            .map(|tx| {
                Ok(TemplateTx {
                    txid: parse_hash("txid", &tx.txid)?,
                    data: parse_hex("data", &tx.data)?,
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(Self {
            version: raw.version,
            prev_hash,
            transactions,
            coinbase_value: raw.coinbasevalue,
            cur_time: raw.curtime,
            min_time: raw.mintime,
            bits,
            target,
            height: raw.height,
        })
    }

    /// The 256-bit target in little-endian byte order, ready for magnitude
    /// comparison against a proof-of-work hash.
    pub fn target_le(&self) -> [u8; 32] {
        self.target.reversed().0
    }
}

fn parse_hex(field: &'static str, s: &str) -> Result<Vec<u8>, TemplateError> {
    hex::decode(s).map_err(|e| TemplateError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

fn parse_hash(field: &'static str, s: &str) -> Result<Hash256, TemplateError> {
    let bytes = parse_hex(field, s)?;
    let arr: [u8; 32] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| TemplateError::InvalidLength {
                field,
                expected: 32,
                got: bytes.len(),
            })?;
    Ok(Hash256(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_template() -> RawBlockTemplate {
        RawBlockTemplate {
            version: 0x00620004,
            previousblockhash: "665d4156095a7726a9f754bcedffa3f07c9a8cc2ca237c59452b4dd617f48523"
                .to_string(),
            transactions: vec![RawTemplateTx {
                txid: "ca8e9210796796d8626865e4d9260a02f505e5e8cd2e64c40703c0b83b212cc5"
                    .to_string(),
                data: "deadbeef".to_string(),
            }],
            coinbasevalue: 5_000_000_000,
            curtime: 0x5fea14da,
            mintime: 0x5fea14d0,
            bits: "1e0fffff".to_string(),
            target: "00000fffff000000000000000000000000000000000000000000000000000000"
                .to_string(),
            height: 868,
        }
    }

    #[test]
    fn parses_typed_fields() {
        let template = BlockTemplate::from_raw(raw_template()).unwrap();
        assert_eq!(template.version, 0x00620004);
        assert_eq!(template.prev_hash.0[0], 0x66);
        assert_eq!(template.prev_hash.0[31], 0x23);
        assert_eq!(template.bits, [0x1e, 0x0f, 0xff, 0xff]);
        assert_eq!(template.coinbase_value, 5_000_000_000);
        assert_eq!(template.height, 868);
        assert_eq!(template.transactions.len(), 1);
        assert_eq!(template.transactions[0].data, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn parses_from_json() {
        let json = serde_json::json!({
            "version": 536870912u32,
            "previousblockhash": "665d4156095a7726a9f754bcedffa3f07c9a8cc2ca237c59452b4dd617f48523",
            "transactions": [],
            "coinbasevalue": 5000000000u64,
            "curtime": 1609176282u32,
            "bits": "1e0fffff",
            "target": "00000fffff000000000000000000000000000000000000000000000000000000",
            "height": 868u64,
            "capabilities": ["proposal"],
        });
        let raw: RawBlockTemplate = serde_json::from_value(json).unwrap();
        let template = BlockTemplate::from_raw(raw).unwrap();
        assert!(template.transactions.is_empty());
        // mintime is optional on the wire
        assert_eq!(template.min_time, 0);
    }

    #[test]
    fn target_le_is_reversed() {
        let template = BlockTemplate::from_raw(raw_template()).unwrap();
        let le = template.target_le();
        assert_eq!(le[31], 0x00);
        assert_eq!(le[29], 0x0f);
        assert_eq!(le[28], 0xff);
        assert_eq!(le[0], 0x00);
    }

    #[test]
    fn rejects_bad_hex() {
        let mut raw = raw_template();
        raw.bits = "xyzw".to_string();
        assert!(matches!(
            BlockTemplate::from_raw(raw),
            Err(TemplateError::InvalidHex { field: "bits", .. })
        ));
    }

    #[test]
    fn rejects_wrong_length_hash() {
        let mut raw = raw_template();
        raw.previousblockhash = "aabb".to_string();
        assert_eq!(
            BlockTemplate::from_raw(raw).unwrap_err(),
            TemplateError::InvalidLength {
                field: "previousblockhash",
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn hash256_display_and_reverse() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        let hash = Hash256(bytes);
        assert!(hash.to_string().starts_with("ab00"));
        assert_eq!(hash.reversed().0[31], 0xab);
        assert_eq!(hash.reversed().reversed(), hash);
    }
}
