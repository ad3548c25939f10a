//! # galena-core
//! Pure mining logic for the Galena scrypt miner: wire codec, hashing
//! primitives, merkle root, payout address decoding, and candidate block
//! assembly. No I/O and no async; the concurrent half lives in
//! `galena-engine`.

pub mod address;
pub mod block;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod types;
