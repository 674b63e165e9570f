use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Errors raised while cutting one segment
#[derive(thiserror::Error, Debug)]
pub enum TranscodeError {
    #[error("ffmpeg exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Trait for cutting a time range out of a local media file
///
/// Encoding parameters are the implementation's business; callers only see
/// success or a typed failure. The per-segment time budget is applied by the
/// caller, not here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Cut `[start_sec, end_sec)` of `source` into `dest`
    async fn cut(
        &self,
        source: &Path,
        start_sec: f64,
        end_sec: f64,
        dest: &Path,
    ) -> Result<(), TranscodeError>;
}

/// ffmpeg-based transcoder
///
/// The video stream is copied as-is; audio is re-encoded to AAC at 128k so
/// OPUS sources stay playable inside mp4. `-y` overwrites existing outputs,
/// which keeps reruns of a resumed batch idempotent.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Override the ffmpeg binary location
    pub fn with_path(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn cut(
        &self,
        source: &Path,
        start_sec: f64,
        end_sec: f64,
        dest: &Path,
    ) -> Result<(), TranscodeError> {
        tracing::debug!(
            source = %source.display(),
            start_sec,
            end_sec,
            dest = %dest.display(),
            "invoking ffmpeg"
        );

        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                &source.to_string_lossy(),
                "-ss",
                &start_sec.to_string(),
                "-to",
                &end_sec.to_string(),
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-y",
                &dest.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(TranscodeError::ProcessFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}
