use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segment_harvester::cli::{Cli, Commands};
use segment_harvester::config::Config;
use segment_harvester::ledger::ProgressLedger;
use segment_harvester::pipeline::HarvestPipeline;
use segment_harvester::{manifest, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "segment_harvester=debug,harvester=debug"
    } else {
        "segment_harvester=info,harvester=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Run {
            manifest,
            output_dir,
            input_dir,
            progress_log,
            concurrency,
            fetch_retries,
            segment_timeout,
            limit,
        } => {
            // Check for required external tools (non-fatal in Docker)
            let missing_deps = utils::check_dependencies().await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            if let Some(path) = manifest {
                config.paths.manifest_path = path;
            }
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            if let Some(dir) = input_dir {
                config.paths.input_dir = Some(dir);
            }
            if let Some(path) = progress_log {
                config.paths.progress_log_path = path;
            }
            if let Some(count) = concurrency {
                config.batch.concurrency = count;
            }
            if let Some(count) = fetch_retries {
                config.batch.fetch_retries = count;
            }
            if let Some(secs) = segment_timeout {
                config.batch.segment_timeout_secs = secs;
            }
            if let Some(count) = limit {
                config.batch.limit = Some(count);
            }
            config.validate()?;

            tracing::info!(manifest = %config.paths.manifest_path.display(), "starting harvest");

            let pipeline = HarvestPipeline::new(config)?;
            let summary = pipeline.run().await?;

            let note = if summary.interrupted {
                " (interrupted)"
            } else {
                ""
            };
            println!("Batch finished{}", note);
            println!(
                "  Items: {} completed, {} fetch-failed, {} already done",
                summary.completed, summary.fetch_failed, summary.skipped
            );
            println!(
                "  Segments: {} written, {} failed",
                summary.segments_written, summary.segments_failed
            );
            println!("Segment mapping saved to: {}", summary.csv_path.display());
        }
        Commands::Status {
            manifest,
            progress_log,
        } => {
            if let Some(path) = manifest {
                config.paths.manifest_path = path;
            }
            if let Some(path) = progress_log {
                config.paths.progress_log_path = path;
            }

            let items = manifest::load(&config.paths.manifest_path)?;
            let ledger = ProgressLedger::open(&config.paths.progress_log_path)?;
            let completed_set = ledger.load_completed_set()?;

            let completed = items
                .iter()
                .filter(|item| completed_set.contains(&item.id))
                .count();

            println!("Batch status:");
            println!("  Manifest items: {}", items.len());
            println!("  Completed: {}", completed);
            println!("  Pending: {}", items.len() - completed);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  (a default file is created on first run)");
                config.display();
            }
        }
    }

    Ok(())
}
