//! Galena miner: standalone scrypt mining binary using RPC.
//!
//! Connects to a node's JSON-RPC port, polls `getblocktemplate`, searches
//! the nonce space across worker threads, and submits mined blocks with
//! `submitblock`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use serde_json::{Value, json};
use tracing::{info, warn};

use galena_core::address::decode_address;
use galena_core::types::{BlockTemplate, RawBlockTemplate};
use galena_engine::client::{ClientError, NodeClient, SubmitResponse};
use galena_engine::feed::TemplateFeed;
use galena_engine::orchestrator::Orchestrator;
use galena_engine::search::SearchEngine;

/// CLI arguments for the miner.
#[derive(Debug, Parser)]
#[command(name = "galena-miner")]
#[command(about = "Galena standalone miner", long_about = None)]
struct Args {
    /// Node JSON-RPC endpoint.
    #[arg(long, default_value = "http://127.0.0.1:9332")]
    rpc_endpoint: String,

    /// RPC username.
    #[arg(long)]
    rpc_user: String,

    /// RPC password.
    #[arg(long)]
    rpc_password: String,

    /// Base58check address to receive block rewards (required).
    #[arg(long)]
    wallet_address: String,

    /// Number of mining threads.
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Template polling interval in milliseconds.
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// JSON-RPC 1.0 client with HTTP basic auth, the dialect bitcoind-family
/// nodes speak.
struct HttpNodeClient {
    http: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

impl HttpNodeClient {
    fn new(endpoint: String, user: String, password: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            user,
            password,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<SubmitResponse, ClientError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "galena-miner",
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        // Nodes report RPC errors with non-2xx statuses and a JSON body, so
        // parse the body before judging the status.
        let status = response.status();
        let payload: SubmitResponse = response
            .json()
            .await
            .map_err(|_| ClientError::Transport(format!("unparseable response, http {status}")))?;
        Ok(payload)
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get_block_template(&self) -> Result<BlockTemplate, ClientError> {
        let payload = self.call("getblocktemplate", json!([])).await?;
        if let Some(error) = payload.error.filter(|e| !e.is_null()) {
            return Err(ClientError::Rpc(error.to_string()));
        }
        let raw: RawBlockTemplate = match payload.result {
            Some(result) => serde_json::from_value(result)
                .map_err(|e| ClientError::Rpc(format!("malformed template: {e}")))?,
            None => return Err(ClientError::Rpc("empty getblocktemplate result".to_string())),
        };
        Ok(BlockTemplate::from_raw(raw)?)
    }

    async fn submit_block(&self, block_hex: String) -> Result<SubmitResponse, ClientError> {
        self.call("submitblock", json!([block_hex])).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("galena-miner v{}", env!("CARGO_PKG_VERSION"));
    info!("RPC endpoint: {}", args.rpc_endpoint);
    info!("Wallet address: {}", args.wallet_address);
    info!("Mining threads: {}", args.threads);

    // Catch a bad payout address now rather than on every template.
    decode_address(&args.wallet_address).context("invalid wallet address")?;

    let client: Arc<dyn NodeClient> = Arc::new(HttpNodeClient::new(
        args.rpc_endpoint,
        args.rpc_user,
        args.rpc_password,
    ));

    let (template_tx, template_rx) = tokio::sync::watch::channel(None);
    let feed = TemplateFeed::new(
        Arc::clone(&client),
        Duration::from_millis(args.poll_interval_ms),
    );
    let orchestrator = Orchestrator::new(
        Arc::clone(&client),
        SearchEngine::new(args.threads),
        args.wallet_address,
    );

    let feed_task = tokio::spawn(feed.run(template_tx));
    let mine_task = tokio::spawn(orchestrator.run(template_rx));

    tokio::signal::ctrl_c().await.ok();
    warn!("received SIGINT, shutting down...");
    feed_task.abort();
    mine_task.abort();

    info!("miner shutdown complete");
    Ok(())
}
