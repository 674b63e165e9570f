use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::manifest::WorkItem;
use crate::output::{SegmentOutcome, SegmentResult};
use crate::transcode::Transcoder;
use crate::utils;

/// Cuts every segment of one fetched media file
///
/// Each segment is attempted exactly once under its own time budget; a
/// failure or timeout at segment i never prevents segments i+1..N. One
/// result is returned per segment, success or not.
pub struct SegmentCutter {
    transcoder: Arc<dyn Transcoder>,
    output_dir: PathBuf,
    segment_timeout: Duration,
}

impl SegmentCutter {
    pub fn new(transcoder: Arc<dyn Transcoder>, output_dir: PathBuf, segment_timeout: Duration) -> Self {
        Self {
            transcoder,
            output_dir,
            segment_timeout,
        }
    }

    pub async fn cut(&self, source: &Path, item: &WorkItem) -> Vec<SegmentResult> {
        let mut results = Vec::with_capacity(item.segments.len());

        for (i, segment) in item.segments.iter().enumerate() {
            let segment_index = i + 1;
            let dest = utils::segment_path(&self.output_dir, &item.id, segment_index, &segment.label);

            let outcome = match tokio::time::timeout(
                self.segment_timeout,
                self.transcoder.cut(source, segment.start, segment.end, &dest),
            )
            .await
            {
                Ok(Ok(())) => {
                    tracing::info!(
                        item_id = %item.id,
                        segment_index,
                        dest = %dest.display(),
                        "segment cut"
                    );
                    SegmentOutcome::Success
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        item_id = %item.id,
                        segment_index,
                        error = %e,
                        "segment transcode failed"
                    );
                    SegmentOutcome::Failed
                }
                Err(_) => {
                    tracing::warn!(
                        item_id = %item.id,
                        segment_index,
                        timeout_secs = self.segment_timeout.as_secs(),
                        "segment transcode timed out"
                    );
                    SegmentOutcome::TimedOut
                }
            };

            results.push(SegmentResult {
                item_id: item.id.clone(),
                segment_index,
                output_path: dest,
                label: segment.label.clone(),
                start: segment.start,
                end: segment.end,
                outcome,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SegmentSpec;
    use crate::transcode::{MockTranscoder, TranscodeError};
    use async_trait::async_trait;

    fn item_with_segments(n: usize) -> WorkItem {
        WorkItem {
            id: "vid1".to_string(),
            segments: (0..n)
                .map(|i| SegmentSpec {
                    start: i as f64 * 10.0,
                    end: i as f64 * 10.0 + 5.0,
                    label: format!("label {}", i),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_all_segments_succeed() {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_cut().times(3).returning(|_, _, _, _| Ok(()));

        let cutter = SegmentCutter::new(
            Arc::new(transcoder),
            PathBuf::from("/out"),
            Duration::from_secs(600),
        );
        let results = cutter.cut(Path::new("/in/vid1.mp4"), &item_with_segments(3)).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.outcome == SegmentOutcome::Success));
        // 1-based indices in order
        let indices: Vec<usize> = results.iter().map(|r| r.segment_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_segment() {
        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_cut()
            .times(3)
            .returning(|_, start, _, _| {
                // second segment starts at 10.0
                if start == 10.0 {
                    Err(TranscodeError::ProcessFailed {
                        status: "exit status: 1".to_string(),
                        stderr: "bad stream".to_string(),
                    })
                } else {
                    Ok(())
                }
            });

        let cutter = SegmentCutter::new(
            Arc::new(transcoder),
            PathBuf::from("/out"),
            Duration::from_secs(600),
        );
        let results = cutter.cut(Path::new("/in/vid1.mp4"), &item_with_segments(3)).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, SegmentOutcome::Success);
        assert_eq!(results[1].outcome, SegmentOutcome::Failed);
        assert_eq!(results[2].outcome, SegmentOutcome::Success);
    }

    /// Transcoder that never finishes, for exercising the time budget
    struct StalledTranscoder;

    #[async_trait]
    impl Transcoder for StalledTranscoder {
        async fn cut(
            &self,
            _source: &Path,
            _start_sec: f64,
            _end_sec: f64,
            _dest: &Path,
        ) -> Result<(), TranscodeError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeout_yields_timed_out_and_continues() {
        let cutter = SegmentCutter::new(
            Arc::new(StalledTranscoder),
            PathBuf::from("/out"),
            Duration::from_millis(10),
        );
        let results = cutter.cut(Path::new("/in/vid1.mp4"), &item_with_segments(2)).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.outcome == SegmentOutcome::TimedOut));
    }

    #[tokio::test]
    async fn test_output_paths_are_deterministic() {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_cut().returning(|_, _, _, _| Ok(()));

        let cutter = SegmentCutter::new(
            Arc::new(transcoder),
            PathBuf::from("/out"),
            Duration::from_secs(600),
        );
        let item = item_with_segments(1);
        let first = cutter.cut(Path::new("/in/vid1.mp4"), &item).await;
        let second = cutter.cut(Path::new("/in/vid1.mp4"), &item).await;

        assert_eq!(first[0].output_path, second[0].output_path);
        assert_eq!(
            first[0].output_path,
            PathBuf::from("/out/vid1_segment_1_label_0.mp4")
        );
    }
}
