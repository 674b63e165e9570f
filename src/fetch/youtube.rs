use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::FetchError;

/// YouTube fetcher using yt-dlp
///
/// Catalog ids are bare video ids; the watch URL is built here. Video and
/// audio are fetched at best quality and merged into an mp4 named after the
/// video id, so reruns land on the same path.
pub struct YtDlpFetcher {
    yt_dlp_path: String,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Override the yt-dlp binary location
    pub fn with_path(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    pub async fn fetch(&self, video_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dest_dir.join(format!("{}.%(ext)s", video_id));
        let output_path = dest_dir.join(format!("{}.mp4", video_id));

        tracing::debug!(video_id, url = %url, "invoking yt-dlp");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &template.to_string_lossy(),
                "--format",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
                "--no-playlist",
                "--newline",
                &url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::ProcessFailed(stderr.trim().to_string()));
        }

        // yt-dlp can exit zero without writing the merged file
        if !output_path.exists() {
            return Err(FetchError::MissingOutput(output_path));
        }

        Ok(output_path)
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
