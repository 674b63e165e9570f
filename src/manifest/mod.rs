use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One labeled time range within an item's media
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Label text, used for output naming and the final manifest
    pub label: String,
}

/// One catalog item and its ordered segment list
///
/// Identity is `id`, unique across a run. Immutable once created.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: String,
    pub segments: Vec<SegmentSpec>,
}

/// Errors raised while loading the segment manifest
///
/// These are the only errors that abort a run before dispatch.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("item {id}: start/end/text arrays have mismatched lengths ({start}/{end}/{text})")]
    MismatchedLengths {
        id: String,
        start: usize,
        end: usize,
        text: usize,
    },

    #[error("item {id}, segment {index}: start {start} is not before end {end}")]
    InvalidRange {
        id: String,
        index: usize,
        start: f64,
        end: f64,
    },
}

/// Raw per-item entry as it appears in the manifest file
#[derive(Debug, Deserialize)]
struct RawSegments {
    start: Vec<f64>,
    end: Vec<f64>,
    text: Vec<String>,
}

/// Load the segment manifest into ordered work items
///
/// The manifest is a JSON object mapping item id to index-aligned
/// `start`/`end`/`text` arrays. Manifest order is preserved.
pub fn load(path: &Path) -> Result<Vec<WorkItem>, ManifestError> {
    let content = fs_err::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;

    let mut items = Vec::with_capacity(raw.len());
    for (id, value) in raw {
        let entry: RawSegments = serde_json::from_value(value)?;

        if entry.start.len() != entry.end.len() || entry.start.len() != entry.text.len() {
            return Err(ManifestError::MismatchedLengths {
                id,
                start: entry.start.len(),
                end: entry.end.len(),
                text: entry.text.len(),
            });
        }

        let mut segments = Vec::with_capacity(entry.start.len());
        for (index, ((start, end), label)) in entry
            .start
            .iter()
            .zip(entry.end.iter())
            .zip(entry.text.into_iter())
            .enumerate()
        {
            if start >= end {
                return Err(ManifestError::InvalidRange {
                    id,
                    index: index + 1,
                    start: *start,
                    end: *end,
                });
            }
            segments.push(SegmentSpec {
                start: *start,
                end: *end,
                label,
            });
        }

        items.push(WorkItem { id, segments });
    }

    Ok(items)
}

/// Drop items whose id is already in the completed set, preserving order
pub fn filter_pending(items: Vec<WorkItem>, completed: &HashSet<String>) -> Vec<WorkItem> {
    items
        .into_iter()
        .filter(|item| !completed.contains(&item.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_preserves_order_and_segments() {
        let file = write_manifest(
            r#"{
                "zebra": {"start": [0.0, 10.0], "end": [5.0, 15.0], "text": ["a", "b"]},
                "alpha": {"start": [1.5], "end": [2.5], "text": ["c"]}
            }"#,
        );

        let items = load(file.path()).unwrap();
        assert_eq!(items.len(), 2);
        // Manifest order, not alphabetical
        assert_eq!(items[0].id, "zebra");
        assert_eq!(items[1].id, "alpha");
        assert_eq!(items[0].segments.len(), 2);
        assert_eq!(
            items[0].segments[1],
            SegmentSpec {
                start: 10.0,
                end: 15.0,
                label: "b".to_string()
            }
        );
    }

    #[test]
    fn test_load_rejects_mismatched_lengths() {
        let file = write_manifest(
            r#"{"vid1": {"start": [0.0, 1.0], "end": [5.0], "text": ["a", "b"]}}"#,
        );

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ManifestError::MismatchedLengths { .. }));
    }

    #[test]
    fn test_load_rejects_missing_field() {
        let file = write_manifest(r#"{"vid1": {"start": [0.0], "end": [5.0]}}"#);

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_inverted_range() {
        let file = write_manifest(r#"{"vid1": {"start": [5.0], "end": [2.0], "text": ["a"]}}"#);

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRange { index: 1, .. }));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let file = write_manifest("not json at all");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_filter_pending_excludes_completed() {
        let items = vec![
            WorkItem {
                id: "a".to_string(),
                segments: vec![],
            },
            WorkItem {
                id: "b".to_string(),
                segments: vec![],
            },
            WorkItem {
                id: "c".to_string(),
                segments: vec![],
            },
        ];
        let completed: HashSet<String> = ["b".to_string()].into_iter().collect();

        let pending = filter_pending(items, &completed);
        let ids: Vec<&str> = pending.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
