//! Human-readable activity log housekeeping.
//!
//! The binary appends formatted tracing output to the log file; this module
//! opens that file and drops lines older than the retention window.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

/// Open the activity log for appending, creating it and its parent directory.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Remove lines whose leading timestamp is before `cutoff`.
///
/// Lines that do not start with an RFC 3339 timestamp (continuations,
/// hand-written notes) are kept. The file is only rewritten when something is
/// dropped. Returns the number of dropped lines; a missing file counts as zero.
pub fn prune_log_file(path: &Path, cutoff: DateTime<Utc>) -> io::Result<usize> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut kept = String::with_capacity(content.len());
    let mut dropped = 0;
    for line in content.lines() {
        match line_timestamp(line) {
            Some(ts) if ts < cutoff => dropped += 1,
            _ => {
                kept.push_str(line);
                kept.push('\n');
            }
        }
    }

    if dropped > 0 {
        fs::write(path, kept)?;
    }
    Ok(dropped)
}

fn line_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let token = line.split_whitespace().next()?;
    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    fn stamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    #[test]
    fn test_prune_drops_only_old_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log");
        let now = Utc::now();

        let content = format!(
            "{}  INFO sweeper_core: old run\n\
             continuation without timestamp\n\
             {}  INFO sweeper_core: recent run\n",
            stamp(now - Duration::days(40)),
            stamp(now - Duration::days(1)),
        );
        fs::write(&path, content).unwrap();

        let dropped = prune_log_file(&path, now - Duration::days(30)).unwrap();
        assert_eq!(dropped, 1);

        let remaining = fs::read_to_string(&path).unwrap();
        assert!(!remaining.contains("old run"));
        assert!(remaining.contains("continuation without timestamp"));
        assert!(remaining.contains("recent run"));
    }

    #[test]
    fn test_prune_missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let dropped = prune_log_file(&dir.path().join("missing.log"), Utc::now()).unwrap();
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("activity.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
