//! # galena-engine
//! The concurrent half of the Galena miner: the node-client seam, the
//! parallel nonce-space search engine, the template polling feed, and the
//! orchestrator that wires them into the mine-and-submit loop.

pub mod client;
pub mod feed;
pub mod orchestrator;
pub mod search;
