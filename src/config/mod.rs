use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File and directory locations
    pub paths: PathsConfig,

    /// Batch scheduling settings
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Segment manifest describing the catalog
    pub manifest_path: PathBuf,

    /// Directory for segment outputs and the final mapping CSV
    pub output_dir: PathBuf,

    /// Directory for fetched media; a temporary directory when unset
    pub input_dir: Option<PathBuf>,

    /// Append-only progress log enabling resume
    pub progress_log_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker pool size
    pub concurrency: usize,

    /// Total fetch attempts per item
    pub fetch_retries: u32,

    /// Base pause between fetch attempts, in seconds
    pub retry_delay_secs: u64,

    /// Per-segment transcode budget, in seconds
    pub segment_timeout_secs: u64,

    /// Process only the first N manifest items
    pub limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                manifest_path: PathBuf::from("video_segments.json"),
                output_dir: PathBuf::from("segments"),
                input_dir: None,
                progress_log_path: PathBuf::from("progress.log"),
            },
            batch: BatchConfig {
                concurrency: 1,
                fetch_retries: 2,
                retry_delay_secs: 2,
                segment_timeout_secs: 600,
                limit: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("segment-harvester").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if self.batch.fetch_retries == 0 {
            anyhow::bail!("fetch_retries must be at least 1");
        }
        if self.batch.segment_timeout_secs == 0 {
            anyhow::bail!("segment_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Manifest: {}", self.paths.manifest_path.display());
        println!("  Output Dir: {}", self.paths.output_dir.display());
        match &self.paths.input_dir {
            Some(dir) => println!("  Input Dir: {}", dir.display()),
            None => println!("  Input Dir: (temporary)"),
        }
        println!("  Progress Log: {}", self.paths.progress_log_path.display());
        println!("  Concurrency: {}", self.batch.concurrency);
        println!("  Fetch Retries: {}", self.batch.fetch_retries);
        println!("  Segment Timeout: {}s", self.batch.segment_timeout_secs);
        if let Some(limit) = self.batch.limit {
            println!("  Limit: {}", limit);
        }
    }
}
