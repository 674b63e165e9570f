use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch, Mutex};

use crate::config::Config;
use crate::fetch::{CatalogFetcher, Fetcher};
use crate::ledger::ProgressLedger;
use crate::manifest::{self, WorkItem};
use crate::output::ResultAggregator;
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::utils;

pub mod cutter;
pub mod processor;
pub mod retry;

pub use cutter::SegmentCutter;
pub use processor::{ItemOutcome, ItemProcessor};
pub use retry::RetryPolicy;

/// What one worker reports back for one item
struct ItemReport {
    outcome: ItemOutcome,
    results: Vec<crate::output::SegmentResult>,
}

/// Summary of one batch run
#[derive(Debug)]
pub struct RunSummary {
    /// Items in the manifest after the limit was applied
    pub total: usize,
    /// Items skipped because the ledger already records them Completed
    pub skipped: usize,
    /// Items that reached Completed this run
    pub completed: usize,
    /// Items whose fetch attempts were exhausted
    pub fetch_failed: usize,
    /// Segment files produced
    pub segments_written: usize,
    /// Segments that failed or timed out
    pub segments_failed: usize,
    /// Whether the run was interrupted before dispatching everything
    pub interrupted: bool,
    /// Where the consolidated mapping was written
    pub csv_path: PathBuf,
}

/// The batch pipeline: task source, worker pool, and result aggregation
///
/// Owns the collaborators and the progress ledger. The fallback download
/// directory is a TempDir tied to the pipeline's lifetime, so fetched media
/// vanishes with it even when per-item cleanup failed.
pub struct HarvestPipeline {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    transcoder: Arc<dyn Transcoder>,
    ledger: Arc<ProgressLedger>,
    download_dir: PathBuf,
    _temp_dir: Option<TempDir>,
}

impl HarvestPipeline {
    /// Create a pipeline with the real yt-dlp/ffmpeg collaborators
    pub fn new(config: Config) -> crate::Result<Self> {
        Self::with_collaborators(
            config,
            Arc::new(CatalogFetcher::new()),
            Arc::new(FfmpegTranscoder::new()),
        )
    }

    /// Create a pipeline with injected collaborators
    pub fn with_collaborators(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> crate::Result<Self> {
        fs_err::create_dir_all(&config.paths.output_dir)
            .context("Failed to create output directory")?;

        let ledger = Arc::new(
            ProgressLedger::open(&config.paths.progress_log_path)
                .context("Failed to open progress log")?,
        );

        let (download_dir, temp_dir) = match &config.paths.input_dir {
            Some(dir) => {
                fs_err::create_dir_all(dir).context("Failed to create input directory")?;
                (dir.clone(), None)
            }
            None => {
                let temp = TempDir::new().context("Failed to create temporary directory")?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        Ok(Self {
            config,
            fetcher,
            transcoder,
            ledger,
            download_dir,
            _temp_dir: temp_dir,
        })
    }

    /// Run the whole batch: load, filter, dispatch, aggregate, write CSV
    ///
    /// Only a manifest problem aborts the run; every other failure is
    /// contained at the item or segment level.
    pub async fn run(&self) -> crate::Result<RunSummary> {
        let start = std::time::Instant::now();

        let mut items = manifest::load(&self.config.paths.manifest_path)?;
        if let Some(limit) = self.config.batch.limit {
            items.truncate(limit);
        }
        let total = items.len();

        let completed_set = self
            .ledger
            .load_completed_set()
            .context("Failed to read progress log")?;
        let pending = manifest::filter_pending(items, &completed_set);
        let skipped = total - pending.len();

        tracing::info!(
            total,
            skipped,
            pending = pending.len(),
            concurrency = self.config.batch.concurrency,
            "starting batch"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, letting in-flight items finish");
                let _ = shutdown_tx.send(true);
            }
        });

        let (completed, fetch_failed, aggregator) =
            self.run_items(pending, shutdown_rx.clone()).await;

        let csv_path = self.config.paths.output_dir.join("segments_mapping.csv");
        aggregator
            .write_csv(&csv_path)
            .context("Failed to write segment mapping")?;

        let summary = RunSummary {
            total,
            skipped,
            completed,
            fetch_failed,
            segments_written: aggregator.success_count(),
            segments_failed: aggregator.failure_count(),
            interrupted: *shutdown_rx.borrow(),
            csv_path,
        };

        tracing::info!(
            completed = summary.completed,
            fetch_failed = summary.fetch_failed,
            segments_written = summary.segments_written,
            elapsed = %utils::format_duration(start.elapsed().as_secs_f64()),
            "batch finished"
        );

        Ok(summary)
    }

    /// Dispatch pending items to a fixed-size worker pool
    ///
    /// Workers pull from a single shared queue and report results over a
    /// channel; the ledger is the only other shared write resource. After a
    /// shutdown signal no new items are dispatched.
    async fn run_items(
        &self,
        pending: Vec<WorkItem>,
        shutdown: watch::Receiver<bool>,
    ) -> (usize, usize, ResultAggregator) {
        let cutter = SegmentCutter::new(
            self.transcoder.clone(),
            self.config.paths.output_dir.clone(),
            Duration::from_secs(self.config.batch.segment_timeout_secs),
        );
        let retry = RetryPolicy::new(
            self.config.batch.fetch_retries,
            Duration::from_secs(self.config.batch.retry_delay_secs),
        );
        let processor = Arc::new(ItemProcessor::new(
            self.fetcher.clone(),
            cutter,
            self.ledger.clone(),
            retry,
            self.download_dir.clone(),
        ));

        let progress = ProgressBar::new(pending.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(pending)));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<ItemReport>();

        let mut workers = Vec::with_capacity(self.config.batch.concurrency);
        for worker_id in 0..self.config.batch.concurrency {
            let queue = queue.clone();
            let report_tx = report_tx.clone();
            let processor = processor.clone();
            let shutdown = shutdown.clone();
            let progress = progress.clone();

            workers.push(tokio::spawn(async move {
                tracing::debug!(worker_id, "worker started");
                loop {
                    if *shutdown.borrow() {
                        tracing::debug!(worker_id, "worker stopping on shutdown");
                        break;
                    }

                    let item = { queue.lock().await.pop_front() };
                    let Some(item) = item else { break };

                    progress.set_message(item.id.clone());
                    let (outcome, results) = processor.process(&item).await;
                    progress.inc(1);

                    // Receiver only drops after all workers are done
                    let _ = report_tx.send(ItemReport { outcome, results });
                }
                tracing::debug!(worker_id, "worker finished");
            }));
        }
        drop(report_tx);

        let mut aggregator = ResultAggregator::new();
        let mut completed = 0usize;
        let mut fetch_failed = 0usize;
        while let Some(report) = report_rx.recv().await {
            match report.outcome {
                ItemOutcome::Completed => completed += 1,
                ItemOutcome::FetchFailed => fetch_failed += 1,
            }
            aggregator.extend(report.results);
        }

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "worker task panicked");
            }
        }
        progress.finish_and_clear();

        (completed, fetch_failed, aggregator)
    }
}
