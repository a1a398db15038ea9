//! Types for torrent client operations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::extension_of;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Client unavailable: {0}")]
    ClientUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("transmission-remote binary not found (tried: {0})")]
    BinaryNotFound(String),

    #[error("Request timeout")]
    Timeout,
}

impl TorrentClientError {
    /// The torrent has left the client.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TorrentClientError::TorrentNotFound(_))
    }

    /// Anything else means the client could not be used right now;
    /// the work is retried on the next run.
    pub fn is_transient(&self) -> bool {
        !self.is_not_found()
    }
}

/// Client-assigned torrent identity (numeric id or info hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TorrentId(String);

impl TorrentId {
    pub fn new(id: impl Into<String>) -> Self {
        TorrentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TorrentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TorrentId {
    fn from(id: &str) -> Self {
        TorrentId::new(id)
    }
}

impl From<u64> for TorrentId {
    fn from(id: u64) -> Self {
        TorrentId::new(id.to_string())
    }
}

/// A file inside a torrent as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Client-reported position; selection commands address files by it.
    pub index: usize,
    /// Full relative path.
    pub path: String,
    /// Lower-cased suffix of the filename, without the dot.
    pub extension: Option<String>,
    /// Whether the client currently wants this file.
    pub selected: bool,
    /// Size in bytes (informational).
    pub size: u64,
}

impl FileEntry {
    /// Create an entry, deriving the extension from the path.
    pub fn new(index: usize, path: impl Into<String>, selected: bool, size: u64) -> Self {
        let path = path.into();
        Self {
            index,
            extension: extension_of(&path),
            path,
            selected,
            size,
        }
    }
}

/// A torrent and its file list at the time of the fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    pub id: TorrentId,
    /// Display name, used for logging and notifications only.
    pub name: String,
    /// Files in client order.
    pub files: Vec<FileEntry>,
}

impl TorrentSnapshot {
    pub fn new(id: impl Into<TorrentId>, name: impl Into<String>, files: Vec<FileEntry>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            files,
        }
    }
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch every torrent together with its file list.
    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, TorrentClientError>;

    /// Set the wanted flag of the given files in one command.
    async fn set_files_wanted(
        &self,
        id: &TorrentId,
        file_indices: &[usize],
        wanted: bool,
    ) -> Result<(), TorrentClientError>;

    /// Remove a torrent.
    /// If `delete_data` is true, also delete downloaded files.
    async fn remove_torrent(&self, id: &TorrentId, delete_data: bool)
        -> Result<(), TorrentClientError>;
}
