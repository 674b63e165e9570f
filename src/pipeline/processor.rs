use std::path::PathBuf;
use std::sync::Arc;

use super::cutter::SegmentCutter;
use super::retry::RetryPolicy;
use crate::fetch::Fetcher;
use crate::ledger::{ItemStatus, ProgressLedger};
use crate::manifest::WorkItem;
use crate::output::SegmentResult;

/// Terminal outcome of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// All segments were attempted and the ledger records completion
    Completed,
    /// Every fetch attempt failed; the item never reached cutting
    FetchFailed,
}

/// Drives one work item through fetch, cut, cleanup, and ledger update
///
/// This is the unit of retry and of worker scheduling. An item interrupted
/// mid-flight leaves no `Completed` ledger record and is retried on the next
/// run; deterministic output naming makes that retry idempotent.
pub struct ItemProcessor {
    fetcher: Arc<dyn Fetcher>,
    cutter: SegmentCutter,
    ledger: Arc<ProgressLedger>,
    retry: RetryPolicy,
    download_dir: PathBuf,
}

impl ItemProcessor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cutter: SegmentCutter,
        ledger: Arc<ProgressLedger>,
        retry: RetryPolicy,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            cutter,
            ledger,
            retry,
            download_dir,
        }
    }

    /// Process one item to a terminal outcome
    ///
    /// Never returns an error: per-item failures are contained here so one
    /// bad item cannot stall the batch.
    pub async fn process(&self, item: &WorkItem) -> (ItemOutcome, Vec<SegmentResult>) {
        if let Err(e) = self.ledger.append(&item.id, ItemStatus::Processing).await {
            tracing::warn!(item_id = %item.id, error = %e, "failed to record Processing");
        }

        tracing::info!(item_id = %item.id, segments = item.segments.len(), "fetching");
        let local_path = match self.fetch_with_retry(item).await {
            Some(path) => path,
            None => {
                tracing::error!(
                    item_id = %item.id,
                    attempts = self.retry.max_attempts,
                    "fetch attempts exhausted, skipping item"
                );
                return (ItemOutcome::FetchFailed, Vec::new());
            }
        };

        tracing::info!(item_id = %item.id, path = %local_path.display(), "cutting");
        let results = self.cutter.cut(&local_path, item).await;

        // The fetched file is ephemeral, even when every segment failed
        if let Err(e) = fs_err::remove_file(&local_path) {
            tracing::warn!(
                item_id = %item.id,
                path = %local_path.display(),
                error = %e,
                "failed to delete intermediate file"
            );
        }

        if let Err(e) = self.ledger.append(&item.id, ItemStatus::Completed).await {
            tracing::warn!(item_id = %item.id, error = %e, "failed to record Completed");
        }

        tracing::info!(item_id = %item.id, segments = results.len(), "item completed");
        (ItemOutcome::Completed, results)
    }

    async fn fetch_with_retry(&self, item: &WorkItem) -> Option<PathBuf> {
        for attempt in 1..=self.retry.max_attempts {
            match self.fetcher.fetch(&item.id, &self.download_dir).await {
                Ok(path) => return Some(path),
                Err(e) => {
                    tracing::warn!(
                        item_id = %item.id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "fetch attempt failed"
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                    }
                }
            }
        }
        None
    }
}
