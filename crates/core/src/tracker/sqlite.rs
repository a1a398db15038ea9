use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::torrent_client::TorrentId;

use super::{Decision, ProcessedRecord, ProcessedStore, TrackerError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processed_torrents (
    torrent_id TEXT PRIMARY KEY,
    torrent_name TEXT NOT NULL,
    decision TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    policy_fingerprint TEXT NOT NULL,
    dry_run INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_processed_torrents_timestamp ON processed_torrents(timestamp);
"#;

const SELECT_COLUMNS: &str =
    "torrent_id, torrent_name, decision, timestamp, policy_fingerprint, dry_run";

/// SQLite-backed processed-set store
///
/// Every `record` is a single auto-committed statement, so a record is either
/// fully on disk or absent.
pub struct SqliteProcessedStore {
    conn: Mutex<Connection>,
}

impl SqliteProcessedStore {
    /// Open (or create) the store at `path`
    pub fn new(path: &Path) -> Result<Self, TrackerError> {
        let conn = Connection::open(path).map_err(|e| TrackerError::Database(e.to_string()))?;
        Self::init(conn)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, TrackerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TrackerError::Database(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, TrackerError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| TrackerError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TrackerError> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::Database("connection mutex poisoned".to_string()))
    }
}

/// Fixed-width UTC timestamps so string order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

type RawRow = (String, String, String, String, String, bool);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawRow) -> Result<ProcessedRecord, TrackerError> {
    let (torrent_id, torrent_name, decision, timestamp, policy_fingerprint, dry_run) = raw;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| TrackerError::InvalidRecord(format!("Invalid timestamp: {}", e)))?
        .into();

    Ok(ProcessedRecord {
        torrent_id: TorrentId::new(torrent_id),
        torrent_name,
        decision: decision.parse::<Decision>()?,
        timestamp,
        policy_fingerprint,
        dry_run,
    })
}

impl ProcessedStore for SqliteProcessedStore {
    fn get(&self, id: &TorrentId) -> Result<Option<ProcessedRecord>, TrackerError> {
        let conn = self.conn()?;

        let sql = format!(
            "SELECT {} FROM processed_torrents WHERE torrent_id = ?",
            SELECT_COLUMNS
        );
        let raw = conn
            .query_row(&sql, params![id.as_str()], read_row)
            .optional()
            .map_err(|e| TrackerError::Database(e.to_string()))?;

        raw.map(into_record).transpose()
    }

    fn record(&self, record: &ProcessedRecord) -> Result<(), TrackerError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT OR REPLACE INTO processed_torrents (torrent_id, torrent_name, decision, timestamp, policy_fingerprint, dry_run) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.torrent_id.as_str(),
                record.torrent_name,
                record.decision.as_str(),
                format_timestamp(&record.timestamp),
                record.policy_fingerprint,
                record.dry_run,
            ],
        )
        .map_err(|e| TrackerError::Database(e.to_string()))?;

        Ok(())
    }

    fn prune(&self, older_than: DateTime<Utc>) -> Result<usize, TrackerError> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM processed_torrents WHERE timestamp < ?",
            params![format_timestamp(&older_than)],
        )
        .map_err(|e| TrackerError::Database(e.to_string()))
    }

    fn list(&self, limit: usize) -> Result<Vec<ProcessedRecord>, TrackerError> {
        let conn = self.conn()?;

        let sql = format!(
            "SELECT {} FROM processed_torrents ORDER BY timestamp DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TrackerError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], read_row)
            .map_err(|e| TrackerError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let raw = row_result.map_err(|e| TrackerError::Database(e.to_string()))?;
            records.push(into_record(raw)?);
        }

        Ok(records)
    }

    fn count(&self) -> Result<usize, TrackerError> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM processed_torrents", [], |row| {
                row.get(0)
            })
            .map_err(|e| TrackerError::Database(e.to_string()))?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_store() -> SqliteProcessedStore {
        SqliteProcessedStore::in_memory().unwrap()
    }

    fn create_record(id: &str, decision: Decision) -> ProcessedRecord {
        ProcessedRecord {
            torrent_id: TorrentId::new(id),
            torrent_name: format!("Torrent {}", id),
            decision,
            timestamp: Utc::now(),
            policy_fingerprint: "fp".to_string(),
            dry_run: false,
        }
    }

    #[test]
    fn test_record_and_get() {
        let store = create_test_store();
        let record = create_record("1", Decision::Unselected);

        assert!(!store.is_processed(&TorrentId::new("1")).unwrap());
        store.record(&record).unwrap();

        let stored = store.get(&TorrentId::new("1")).unwrap().unwrap();
        assert_eq!(stored.decision, Decision::Unselected);
        assert_eq!(stored.torrent_name, "Torrent 1");
        assert_eq!(stored.policy_fingerprint, "fp");
        assert!(!stored.dry_run);
        assert_eq!(
            stored.timestamp.timestamp_micros(),
            record.timestamp.timestamp_micros()
        );
        assert!(store.is_processed(&TorrentId::new("1")).unwrap());
        assert!(!store.is_processed(&TorrentId::new("2")).unwrap());
    }

    #[test]
    fn test_record_overwrites_previous_entry() {
        let store = create_test_store();
        store
            .record(&create_record("1", Decision::SkippedNoAction))
            .unwrap();

        let mut revisited = create_record("1", Decision::Unselected);
        revisited.dry_run = true;
        store.record(&revisited).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get(&TorrentId::new("1")).unwrap().unwrap();
        assert_eq!(stored.decision, Decision::Unselected);
        assert!(stored.dry_run);
    }

    #[test]
    fn test_prune_removes_only_old_records() {
        let store = create_test_store();
        let now = Utc::now();

        let mut old = create_record("old", Decision::Removed);
        old.timestamp = now - Duration::days(40);
        store.record(&old).unwrap();
        store.record(&create_record("new", Decision::Removed)).unwrap();

        let pruned = store.prune(now - Duration::days(30)).unwrap();
        assert_eq!(pruned, 1);
        assert!(!store.is_processed(&TorrentId::new("old")).unwrap());
        assert!(store.is_processed(&TorrentId::new("new")).unwrap());

        assert_eq!(store.prune(now - Duration::days(30)).unwrap(), 0);
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let store = create_test_store();
        let now = Utc::now();

        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let mut record = create_record(id, Decision::SkippedNoAction);
            record.timestamp = now - Duration::minutes(10 - i as i64);
            store.record(&record).unwrap();
        }

        let records = store.list(2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].torrent_id.as_str(), "c");
        assert_eq!(records[1].torrent_id.as_str(), "b");
    }

    #[test]
    fn test_file_based_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("sweeper.db");

        {
            let store = SqliteProcessedStore::new(&db_path).unwrap();
            store.record(&create_record("42", Decision::Removed)).unwrap();
        }

        assert!(db_path.exists());
        let reopened = SqliteProcessedStore::new(&db_path).unwrap();
        let stored = reopened.get(&TorrentId::new("42")).unwrap().unwrap();
        assert_eq!(stored.decision, Decision::Removed);
    }
}
