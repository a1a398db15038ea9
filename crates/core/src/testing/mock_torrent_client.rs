//! Mock torrent client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentId, TorrentSnapshot};

/// A recorded mutating call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    SetFilesWanted {
        id: TorrentId,
        file_indices: Vec<usize>,
        wanted: bool,
    },
    Remove {
        id: TorrentId,
        delete_data: bool,
    },
}

impl RecordedWrite {
    pub fn torrent_id(&self) -> &TorrentId {
        match self {
            RecordedWrite::SetFilesWanted { id, .. } | RecordedWrite::Remove { id, .. } => id,
        }
    }
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Pre-populate torrents and their files
/// - Record every write call, successful or not
/// - Simulate failures of the next list or write call
///
/// Successful writes are applied to the stored snapshots, so a second
/// `list_torrents` sees the effect of the first run.
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Current torrents in client order.
    torrents: Arc<RwLock<Vec<TorrentSnapshot>>>,
    /// Recorded write calls.
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
    /// Number of `list_torrents` calls.
    list_calls: Arc<RwLock<usize>>,
    /// If set, the next `list_torrents` call fails with this error.
    next_list_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// If set, the next write call fails with this error.
    next_write_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client with no torrents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a torrent.
    pub async fn add_torrent(&self, snapshot: TorrentSnapshot) {
        self.torrents.write().await.push(snapshot);
    }

    /// Drop a torrent as if it left the client between calls.
    pub async fn forget_torrent(&self, id: &str) {
        self.torrents.write().await.retain(|t| t.id.as_str() != id);
    }

    /// Current state of a torrent.
    pub async fn torrent(&self, id: &str) -> Option<TorrentSnapshot> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.id.as_str() == id)
            .cloned()
    }

    pub async fn has_torrent(&self, id: &str) -> bool {
        self.torrent(id).await.is_some()
    }

    /// Get all recorded write calls.
    pub async fn write_calls(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    /// Write calls addressed to one torrent.
    pub async fn write_calls_for(&self, id: &str) -> Vec<RecordedWrite> {
        self.writes
            .read()
            .await
            .iter()
            .filter(|w| w.torrent_id().as_str() == id)
            .cloned()
            .collect()
    }

    pub async fn list_call_count(&self) -> usize {
        *self.list_calls.read().await
    }

    /// Configure the next `list_torrents` call to fail with the given error.
    pub async fn set_next_list_error(&self, error: TorrentClientError) {
        *self.next_list_error.write().await = Some(error);
    }

    /// Configure the next write call to fail with the given error.
    pub async fn set_next_write_error(&self, error: TorrentClientError) {
        *self.next_write_error.write().await = Some(error);
    }

    async fn take_write_error(&self) -> Option<TorrentClientError> {
        self.next_write_error.write().await.take()
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, TorrentClientError> {
        *self.list_calls.write().await += 1;

        if let Some(err) = self.next_list_error.write().await.take() {
            return Err(err);
        }

        Ok(self.torrents.read().await.clone())
    }

    async fn set_files_wanted(
        &self,
        id: &TorrentId,
        file_indices: &[usize],
        wanted: bool,
    ) -> Result<(), TorrentClientError> {
        self.writes.write().await.push(RecordedWrite::SetFilesWanted {
            id: id.clone(),
            file_indices: file_indices.to_vec(),
            wanted,
        });

        if let Some(err) = self.take_write_error().await {
            return Err(err);
        }

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(id.to_string()))?;

        for file in torrent
            .files
            .iter_mut()
            .filter(|f| file_indices.contains(&f.index))
        {
            file.selected = wanted;
        }
        Ok(())
    }

    async fn remove_torrent(
        &self,
        id: &TorrentId,
        delete_data: bool,
    ) -> Result<(), TorrentClientError> {
        self.writes.write().await.push(RecordedWrite::Remove {
            id: id.clone(),
            delete_data,
        });

        if let Some(err) = self.take_write_error().await {
            return Err(err);
        }

        let mut torrents = self.torrents.write().await;
        let before = torrents.len();
        torrents.retain(|t| &t.id != id);
        if torrents.len() == before {
            Err(TorrentClientError::TorrentNotFound(id.to_string()))
        } else {
            Ok(())
        }
    }
}
