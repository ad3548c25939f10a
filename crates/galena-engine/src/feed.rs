//! Template polling feed.
//!
//! Polls the node on a fixed interval and publishes templates into a
//! single-slot `watch` channel, so downstream always sees only the latest
//! template with no backlog. Templates that differ only in advisory fields
//! (`curtime` moving forward, say) are suppressed; a height change or a
//! transaction-set change is published promptly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::client::NodeClient;
use galena_core::types::BlockTemplate;

/// True when two templates describe the same unit of work.
///
/// Same height and same transaction count means the difference is advisory
/// only, and restarting the search would waste completed work.
pub fn same_work(a: &BlockTemplate, b: &BlockTemplate) -> bool {
    a.height == b.height && a.transactions.len() == b.transactions.len()
}

/// Polls `getblocktemplate` and emits deduplicated templates.
pub struct TemplateFeed {
    client: Arc<dyn NodeClient>,
    interval: Duration,
}

impl TemplateFeed {
    pub fn new(client: Arc<dyn NodeClient>, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Poll forever, publishing each meaningfully-new template into `out`.
    ///
    /// Fetch failures are logged and retried on the next tick; the fixed
    /// interval is the only retry mechanism. Returns when every receiver
    /// has been dropped.
    pub async fn run(self, out: watch::Sender<Option<BlockTemplate>>) {
        let mut last: Option<BlockTemplate> = None;
        loop {
            tokio::time::sleep(self.interval).await;

            let template = match self.client.get_block_template().await {
                Ok(template) => template,
                Err(e) => {
                    warn!("template fetch failed: {e}");
                    continue;
                }
            };

            if last.as_ref().is_some_and(|prev| same_work(prev, &template)) {
                continue;
            }

            info!(
                height = template.height,
                transactions = template.transactions.len(),
                "new block template"
            );
            last = Some(template.clone());
            if out.send(Some(template)).is_err() {
                return;
            }
        }
    }
}
