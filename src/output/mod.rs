use std::path::{Path, PathBuf};

/// Terminal outcome of one segment cut attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Output file was produced
    Success,
    /// Transcoder reported an error
    Failed,
    /// Per-segment time budget exceeded
    TimedOut,
}

impl std::fmt::Display for SegmentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentOutcome::Success => write!(f, "success"),
            SegmentOutcome::Failed => write!(f, "failed"),
            SegmentOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// One row of the final mapping, produced per attempted segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentResult {
    pub item_id: String,
    /// 1-based position within the item
    pub segment_index: usize,
    pub output_path: PathBuf,
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub outcome: SegmentOutcome,
}

/// Collects segment results from all workers and writes the final CSV
///
/// Rows arrive per item in segment order; cross-item order follows whichever
/// worker finished first. Only successful segments end up in the CSV; failed
/// and timed-out attempts are visible in the logs instead.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    rows: Vec<SegmentResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: SegmentResult) {
        self.rows.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = SegmentResult>) {
        self.rows.extend(results);
    }

    pub fn results(&self) -> &[SegmentResult] {
        &self.rows
    }

    pub fn success_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome == SegmentOutcome::Success)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.rows.len() - self.success_count()
    }

    /// Write the consolidated mapping, one row per produced segment
    pub fn write_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut content = String::from("VideoID,SegmentFile,SegmentText,Start,End\n");

        for row in &self.rows {
            if row.outcome != SegmentOutcome::Success {
                continue;
            }
            let file_name = row
                .output_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            content.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(&row.item_id),
                csv_field(&file_name),
                csv_field(&row.label),
                row.start,
                row.end,
            ));
        }

        fs_err::write(path, content)?;
        tracing::info!(path = %path.display(), rows = self.success_count(), "wrote segment mapping");
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(item: &str, index: usize, label: &str, outcome: SegmentOutcome) -> SegmentResult {
        SegmentResult {
            item_id: item.to_string(),
            segment_index: index,
            output_path: PathBuf::from(format!("/out/{}_segment_{}_{}.mp4", item, index, label)),
            label: label.to_string(),
            start: index as f64 * 10.0,
            end: index as f64 * 10.0 + 5.0,
            outcome,
        }
    }

    #[test]
    fn test_write_csv_only_successes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");

        let mut agg = ResultAggregator::new();
        agg.push(result("vid1", 1, "a", SegmentOutcome::Success));
        agg.push(result("vid1", 2, "b", SegmentOutcome::Failed));
        agg.push(result("vid1", 3, "c", SegmentOutcome::TimedOut));
        agg.write_csv(&path).unwrap();

        let content = fs_err::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "VideoID,SegmentFile,SegmentText,Start,End");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "vid1,vid1_segment_1_a.mp4,a,10,15");
    }

    #[test]
    fn test_write_csv_preserves_segment_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");

        let mut agg = ResultAggregator::new();
        agg.extend([
            result("vid1", 1, "a", SegmentOutcome::Success),
            result("vid1", 2, "b", SegmentOutcome::Success),
            result("vid2", 1, "c", SegmentOutcome::Success),
        ]);
        agg.write_csv(&path).unwrap();

        let content = fs_err::read_to_string(&path).unwrap();
        let indices: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(indices, vec!["vid1", "vid1", "vid2"]);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_counts() {
        let mut agg = ResultAggregator::new();
        agg.push(result("vid1", 1, "a", SegmentOutcome::Success));
        agg.push(result("vid1", 2, "b", SegmentOutcome::TimedOut));
        assert_eq!(agg.success_count(), 1);
        assert_eq!(agg.failure_count(), 1);
        assert_eq!(agg.results().len(), 2);
    }
}
