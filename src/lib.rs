//! Segment Harvester - A Rust CLI tool for batch media harvesting
//!
//! This library downloads catalog media items (YouTube ids or direct URLs),
//! slices each one into labeled time-range segments with ffmpeg, and keeps an
//! append-only progress ledger so an interrupted batch can resume without
//! redoing completed items.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod ledger;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod transcode;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use fetch::{CatalogFetcher, FetchError, Fetcher};
pub use ledger::{ItemStatus, ProgressLedger};
pub use manifest::{ManifestError, SegmentSpec, WorkItem};
pub use output::{ResultAggregator, SegmentOutcome, SegmentResult};
pub use pipeline::HarvestPipeline;
pub use transcode::{TranscodeError, Transcoder};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
