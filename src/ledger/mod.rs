use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Mutex;

/// Header written when the progress log is first created; ignored on read
const HEADER: &str = "# segment-harvester progress log";

/// Lifecycle status of one catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Item was picked up by a worker
    Processing,
    /// Item finished slicing and cleanup
    Completed,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Processing => write!(f, "Processing"),
            ItemStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(ItemStatus::Processing),
            "Completed" => Ok(ItemStatus::Completed),
            _ => Err(()),
        }
    }
}

/// One lifecycle event, as appended to the log
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub item_id: String,
    pub status: ItemStatus,
    pub timestamp: DateTime<Utc>,
}

impl ProgressRecord {
    /// Wire format: one `"<Status>: <item_id>"` line
    fn line(&self) -> String {
        format!("{}: {}", self.status, self.item_id)
    }
}

/// Append-only, crash-resilient log of per-item lifecycle events
///
/// The log is the durable state that makes a batch resumable: an item counts
/// as done only when its most recent line is `Completed`. Appends from
/// concurrent workers are serialized behind a mutex so lines never interleave.
pub struct ProgressLedger {
    path: PathBuf,
    file: Mutex<fs_err::File>,
}

impl ProgressLedger {
    /// Open the log for appending, creating it with a header if absent
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let existed = path.exists();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let mut file = fs_err::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        if !existed {
            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one lifecycle event
    ///
    /// Safe under concurrent callers; each call writes exactly one line.
    pub async fn append(&self, item_id: &str, status: ItemStatus) -> std::io::Result<()> {
        let record = ProgressRecord {
            item_id: item_id.to_string(),
            status,
            timestamp: Utc::now(),
        };

        let mut file = self.file.lock().await;
        writeln!(file, "{}", record.line())?;
        file.flush()?;

        tracing::debug!(
            item_id = %record.item_id,
            status = %record.status,
            timestamp = %record.timestamp,
            "ledger append"
        );
        Ok(())
    }

    /// Read the log and return the ids whose latest status is `Completed`
    ///
    /// Malformed lines (including the header) are skipped. Called once before
    /// dispatch begins.
    pub fn load_completed_set(&self) -> std::io::Result<HashSet<String>> {
        let content = fs_err::read_to_string(&self.path)?;

        let mut latest: std::collections::HashMap<String, ItemStatus> =
            std::collections::HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some((id, status)) => {
                    latest.insert(id, status);
                }
                None => {
                    // A leading header line is permitted; anything else is noise
                    if line_no > 0 {
                        tracing::warn!(line = %line, "skipping malformed progress log line");
                    }
                }
            }
        }

        Ok(latest
            .into_iter()
            .filter(|(_, status)| *status == ItemStatus::Completed)
            .map(|(id, _)| id)
            .collect())
    }
}

/// Parse one `"<Status>: <item_id>"` line
fn parse_line(line: &str) -> Option<(String, ItemStatus)> {
    let (status, id) = line.split_once(": ")?;
    let status = ItemStatus::from_str(status).ok()?;
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), status))
}
