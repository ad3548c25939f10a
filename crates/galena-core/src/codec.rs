//! Fixed-width integer and compact-size wire encodings.
//!
//! The block wire format writes integers little-endian; hex display order is
//! big-endian. Both orderings are provided so callers pick at the use site.

/// Encode `value` as exactly `width` big-endian bytes.
///
/// # Panics
///
/// Panics if `width > 8` or if `value` does not fit in `width` bytes. An
/// out-of-range value for a fixed-width wire field is a programmer error,
/// not a recoverable condition.
pub fn be_bytes(value: u64, width: usize) -> Vec<u8> {
    assert!(width <= 8, "width {width} exceeds 8 bytes");
    assert!(
        width == 8 || value < 1u64 << (width * 8),
        "value {value} does not fit in {width} bytes"
    );
    value.to_be_bytes()[8 - width..].to_vec()
}

/// Encode `value` as exactly `width` little-endian bytes (wire order).
///
/// Same panics as [`be_bytes`].
pub fn le_bytes(value: u64, width: usize) -> Vec<u8> {
    let mut bytes = be_bytes(value, width);
    bytes.reverse();
    bytes
}

/// Encode `n` as a compact-size unsigned integer.
///
/// One byte for `n ≤ 252`; otherwise a marker byte (`0xfd`/`0xfe`/`0xff`)
/// followed by 2, 4, or 8 little-endian bytes.
pub fn compact_size(n: u64) -> Vec<u8> {
    match n {
        0..=252 => vec![n as u8],
        253..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(n as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(n as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&n.to_le_bytes());
            out
        }
    }
}
