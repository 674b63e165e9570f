use std::path::{Path, PathBuf};

/// Maximum length of a sanitized label, in characters
const MAX_LABEL_LEN: usize = 50;

/// Characters that are never allowed in output filenames
const DISALLOWED: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Sanitize label text for safe filesystem usage
///
/// Removes disallowed characters, replaces whitespace with underscores, and
/// caps the result at 50 characters. Applying it twice yields the same value.
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| !DISALLOWED.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(MAX_LABEL_LEN)
        .collect()
}

/// Build the deterministic output filename for one segment
///
/// The index is 1-based to match segment numbering in the output manifest.
pub fn segment_filename(item_id: &str, segment_index: usize, label: &str) -> String {
    format!(
        "{}_segment_{}_{}.mp4",
        item_id,
        segment_index,
        sanitize_label(label)
    )
}

/// Build the full output path for one segment
pub fn segment_path(output_dir: &Path, item_id: &str, segment_index: usize, label: &str) -> PathBuf {
    output_dir.join(segment_filename(item_id, segment_index, label))
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    // Check for yt-dlp
    if !check_command_available("yt-dlp").await {
        missing.push("yt-dlp - required for fetching catalog videos".to_string());
    }

    // Check for ffmpeg
    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - required for segment cutting".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label_removes_disallowed() {
        let out = sanitize_label(r#"a\b/c*d?e:f"g<h>i|j"#);
        for c in DISALLOWED {
            assert!(!out.contains(*c), "found {:?} in {:?}", c, out);
        }
        assert_eq!(out, "abcdefghij");
    }

    #[test]
    fn test_sanitize_label_whitespace() {
        assert_eq!(sanitize_label("hello world"), "hello_world");
        assert_eq!(sanitize_label("  padded  "), "padded");
        assert_eq!(sanitize_label("tab\tsep"), "tab_sep");
    }

    #[test]
    fn test_sanitize_label_length_bound() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_label(&long).chars().count(), 50);
    }

    #[test]
    fn test_sanitize_label_idempotent() {
        let inputs = [
            "plain",
            "with spaces and * stars",
            "  trim:me?  ",
            "日本語のラベルがとても長い場合でも安全に切り詰められるべきです、五十文字を超えたら",
        ];
        for input in inputs {
            let once = sanitize_label(input);
            assert_eq!(sanitize_label(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_segment_filename_deterministic() {
        let a = segment_filename("vid1", 3, "some label");
        let b = segment_filename("vid1", 3, "some label");
        assert_eq!(a, b);
        assert_eq!(a, "vid1_segment_3_some_label.mp4");
    }

    #[test]
    fn test_segment_filename_distinct_per_index() {
        assert_ne!(
            segment_filename("vid1", 1, "same"),
            segment_filename("vid1", 2, "same")
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }
}
