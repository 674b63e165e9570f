use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "harvester",
    about = "Segment Harvester - Batch-download catalog media and slice it into labeled segments",
    version,
    long_about = "A CLI tool that walks a segment manifest, fetches each catalog item (YouTube id or direct URL), cuts the labeled time ranges with ffmpeg, and writes a consolidated segment mapping. Progress is logged so an interrupted batch resumes where it left off."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the batch: fetch pending items and cut their segments
    Run {
        /// Segment manifest path
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Directory for segment outputs and the mapping CSV
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Directory for fetched media (temporary directory if not set)
        #[arg(long, value_name = "DIR")]
        input_dir: Option<PathBuf>,

        /// Progress log path
        #[arg(long, value_name = "FILE")]
        progress_log: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short, long, value_name = "COUNT")]
        concurrency: Option<usize>,

        /// Total fetch attempts per item
        #[arg(long, value_name = "COUNT")]
        fetch_retries: Option<u32>,

        /// Per-segment transcode budget in seconds
        #[arg(long, value_name = "SECONDS")]
        segment_timeout: Option<u64>,

        /// Process only the first N manifest items
        #[arg(short, long, value_name = "COUNT")]
        limit: Option<usize>,
    },

    /// Show batch progress from the progress log and manifest
    Status {
        /// Segment manifest path
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Progress log path
        #[arg(long, value_name = "FILE")]
        progress_log: Option<PathBuf>,
    },

    /// Configure paths and batch settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}
