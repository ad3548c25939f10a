//! The node-client seam.
//!
//! The engine depends only on these two calls; transport, authentication,
//! and JSON-RPC framing live behind the trait (the binary provides an HTTP
//! implementation, tests provide mocks).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use galena_core::error::TemplateError;
use galena_core::types::BlockTemplate;

/// Errors from the node client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The HTTP call itself failed (connection refused, timeout, bad body).
    #[error("transport: {0}")]
    Transport(String),
    /// The node answered with a JSON-RPC error or an unusable result.
    #[error("node: {0}")]
    Rpc(String),
    /// The template arrived but one of its fields would not parse.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// The node's answer to `submitblock`.
///
/// A `null` result means the block was accepted; anything else is the
/// node's rejection reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub result: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
}

impl SubmitResponse {
    /// True when the node reported neither a result payload nor an error.
    pub fn accepted(&self) -> bool {
        self.result.is_none() && self.error.is_none()
    }
}

/// A full node reachable over JSON-RPC.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Fetch the current block template (`getblocktemplate`).
    async fn get_block_template(&self) -> Result<BlockTemplate, ClientError>;

    /// Submit a serialized block (`submitblock` with the hex as sole
    /// parameter).
    async fn submit_block(&self, block_hex: String) -> Result<SubmitResponse, ClientError>;
}
