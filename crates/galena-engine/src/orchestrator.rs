//! The mine-and-submit loop.
//!
//! One search runs at a time, always against the latest template. When the
//! feed publishes a newer template mid-search, the running search is
//! cancelled and its outcome discarded, even a late hit: a stale block
//! would be rejected anyway. A golden nonce is submitted and the loop goes
//! back to waiting; an exhausted nonce space refetches the template
//! directly, since the feed would suppress a same-height refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::client::NodeClient;
use crate::search::{SearchEngine, SearchOutcome, Solution};
use galena_core::block::{CandidateBlock, build_block};
use galena_core::types::BlockTemplate;

pub struct Orchestrator {
    client: Arc<dyn NodeClient>,
    engine: SearchEngine,
    wallet: String,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn NodeClient>, engine: SearchEngine, wallet: String) -> Self {
        Self {
            client,
            engine,
            wallet,
        }
    }

    /// Drive the mining loop until the template feed goes away.
    pub async fn run(self, mut templates: watch::Receiver<Option<BlockTemplate>>) {
        let mut current: Option<BlockTemplate> = None;
        loop {
            let template = match current.take() {
                Some(template) => template,
                None => {
                    if templates.changed().await.is_err() {
                        return;
                    }
                    match templates.borrow_and_update().clone() {
                        Some(template) => template,
                        None => continue,
                    }
                }
            };

            let candidate = match build_block(&template, &self.wallet) {
                Ok(candidate) => candidate,
                Err(e) => {
                    error!("candidate build failed at height {}: {e}", template.height);
                    continue;
                }
            };

            info!(
                height = candidate.height(),
                workers = self.engine.workers(),
                "mining candidate block"
            );
            let cancel = Arc::new(AtomicBool::new(false));
            let search = self.engine.search(
                *candidate.header_prefix(),
                *candidate.target_le(),
                Arc::clone(&cancel),
            );
            tokio::pin!(search);

            tokio::select! {
                outcome = &mut search => match outcome {
                    SearchOutcome::Found(solution) => {
                        self.submit(&candidate, solution).await;
                    }
                    SearchOutcome::Exhausted => {
                        info!(
                            height = candidate.height(),
                            "nonce space exhausted, refetching template"
                        );
                        match self.client.get_block_template().await {
                            Ok(template) => current = Some(template),
                            Err(e) => warn!("template refetch failed: {e}"),
                        }
                    }
                    SearchOutcome::Cancelled => {}
                },
                changed = templates.changed() => {
                    cancel.store(true, Ordering::Relaxed);
                    // Drain the cancelled search; a hit that lands after
                    // supersession is for a stale template and is dropped.
                    let _ = (&mut search).await;
                    match changed {
                        Ok(()) => {
                            debug!(height = candidate.height(), "search superseded");
                            current = templates.borrow_and_update().clone();
                        }
                        Err(_) => return,
                    }
                }
            }
        }
    }

    async fn submit(&self, candidate: &CandidateBlock, solution: Solution) {
        info!(
            height = candidate.height(),
            nonce = solution.nonce,
            hash = %solution.hash.reversed(),
            "submitting mined block"
        );
        match self.client.submit_block(candidate.block_hex(solution.nonce)).await {
            Ok(response) if response.accepted() => {
                info!(height = candidate.height(), "block accepted")
            }
            Ok(response) => warn!(
                "block rejected at height {}: result={:?} error={:?}",
                candidate.height(),
                response.result,
                response.error,
            ),
            Err(e) => error!("block submission failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::client::{ClientError, SubmitResponse};
    use galena_core::constants::HEADER_LEN;
    use galena_core::hash::{leq_le, scrypt_pow};
    use galena_core::types::{RawBlockTemplate, RawTemplateTx};

    // base58check of version 0x30 + pubkey hash 0x10..0x23
    const WALLET: &str = "LLguXNLLGu7qnPgDSWfkV6hMDuoJnnMNHe";
    const EASY: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
    const IMPOSSIBLE: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn template(height: u64, prev_byte: char, target: &str) -> BlockTemplate {
        BlockTemplate::from_raw(RawBlockTemplate {
            version: 0x20000000,
            previousblockhash: prev_byte.to_string().repeat(64),
            transactions: Vec::<RawTemplateTx>::new(),
            coinbasevalue: 5_000_000_000,
            curtime: 1_600_000_000,
            mintime: 0,
            bits: "1e0fffff".to_string(),
            target: target.to_string(),
            height,
        })
        .unwrap()
    }

    /// Records submissions; refetches serve a fixed template.
    struct MockClient {
        refetch: Option<BlockTemplate>,
        submissions: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn new(refetch: Option<BlockTemplate>) -> Arc<Self> {
            Arc::new(Self {
                refetch,
                submissions: Mutex::new(Vec::new()),
            })
        }

        fn submissions(&self) -> Vec<String> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NodeClient for MockClient {
        async fn get_block_template(&self) -> Result<BlockTemplate, ClientError> {
            self.refetch
                .clone()
                .ok_or_else(|| ClientError::Transport("no template".to_string()))
        }

        async fn submit_block(&self, block_hex: String) -> Result<SubmitResponse, ClientError> {
            self.submissions.lock().unwrap().push(block_hex);
            Ok(SubmitResponse::default())
        }
    }

    async fn wait_for_submissions(client: &MockClient, count: usize) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                let submissions = client.submissions();
                if submissions.len() >= count {
                    return submissions;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no block was submitted in time")
    }

    #[tokio::test]
    async fn mines_and_submits_a_valid_block() {
        let client = MockClient::new(None);
        let orchestrator = Orchestrator::new(
            Arc::clone(&client) as Arc<dyn NodeClient>,
            SearchEngine::new(2),
            WALLET.to_string(),
        );
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(orchestrator.run(rx));

        let template = template(1, '1', EASY);
        tx.send(Some(template.clone())).unwrap();

        let submissions = wait_for_submissions(&client, 1).await;
        let block = hex::decode(&submissions[0]).unwrap();
        assert!(block.len() > HEADER_LEN);

        // The submitted header must carry the template's fields and a nonce
        // whose hash actually meets the target.
        let header: [u8; HEADER_LEN] = block[..HEADER_LEN].try_into().unwrap();
        assert_eq!(
            header[4..36],
            *template.prev_hash.reversed().as_bytes()
        );
        assert!(leq_le(&scrypt_pow(&header), &template.target_le()));
        task.abort();
    }

    #[tokio::test]
    async fn newer_template_supersedes_running_search() {
        let client = MockClient::new(None);
        let orchestrator = Orchestrator::new(
            Arc::clone(&client) as Arc<dyn NodeClient>,
            SearchEngine::new(2),
            WALLET.to_string(),
        );
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(orchestrator.run(rx));

        // Unwinnable search first, then a winnable replacement.
        tx.send(Some(template(1, '1', IMPOSSIBLE))).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(Some(template(2, '2', EASY))).unwrap();

        let submissions = wait_for_submissions(&client, 1).await;
        assert_eq!(submissions.len(), 1);
        // prev hash occupies header bytes 4..36 → hex chars 8..72
        assert_eq!(&submissions[0][8..72], &"2".repeat(64));
        task.abort();
    }

    #[tokio::test]
    async fn bad_wallet_skips_template_without_submitting() {
        let client = MockClient::new(None);
        let orchestrator = Orchestrator::new(
            Arc::clone(&client) as Arc<dyn NodeClient>,
            SearchEngine::new(1),
            "not-a-wallet-address".to_string(),
        );
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(orchestrator.run(rx));

        tx.send(Some(template(1, '1', EASY))).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(client.submissions().is_empty());
        assert!(!task.is_finished(), "loop must survive a bad address");
        task.abort();
    }

    #[tokio::test]
    async fn exhaustion_refetches_and_mines_the_fresh_template() {
        // The refetched template is winnable; the published one is not and
        // has a tiny nonce space, so it exhausts immediately.
        let client = MockClient::new(Some(template(2, '2', EASY)));
        let orchestrator = Orchestrator::new(
            Arc::clone(&client) as Arc<dyn NodeClient>,
            SearchEngine::new(2).with_space(32),
            WALLET.to_string(),
        );
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(orchestrator.run(rx));

        tx.send(Some(template(1, '1', IMPOSSIBLE))).unwrap();

        let submissions = wait_for_submissions(&client, 1).await;
        assert_eq!(&submissions[0][8..72], &"2".repeat(64));
        task.abort();
    }

    #[tokio::test]
    async fn stops_when_feed_is_gone() {
        let client = MockClient::new(None);
        let orchestrator = Orchestrator::new(
            Arc::clone(&client) as Arc<dyn NodeClient>,
            SearchEngine::new(1),
            WALLET.to_string(),
        );
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(orchestrator.run(rx));
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("orchestrator should return once the sender is dropped")
            .unwrap();
    }
}
