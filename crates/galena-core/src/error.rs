//! Error types for the Galena miner core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid payload length: {0}")] InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("invalid hex in {field}: {reason}")] InvalidHex { field: &'static str, reason: String },
    #[error("{field} must be {expected} bytes, got {got}")] InvalidLength { field: &'static str, expected: usize, got: usize },
}
