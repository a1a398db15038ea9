//! Testing utilities and mock implementations.
//!
//! Mocks of the client and notifier boundaries, so a full cleanup run can be
//! exercised without a Transmission daemon or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use sweeper_core::testing::{fixtures, MockNotifier, MockTorrentClient};
//!
//! let client = MockTorrentClient::new();
//! client
//!     .add_torrent(fixtures::torrent("1", "Movie", &[("a.mkv", true), ("b.jpg", true)]))
//!     .await;
//!
//! // Run the orchestrator, then inspect what it did
//! let writes = client.write_calls().await;
//! ```

mod mock_notifier;
mod mock_torrent_client;

pub use mock_notifier::MockNotifier;
pub use mock_torrent_client::{MockTorrentClient, RecordedWrite};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::policy::ExtensionPolicy;
    use crate::torrent_client::{FileEntry, TorrentSnapshot};

    /// Create a snapshot from `(path, selected)` pairs, indexed in order.
    pub fn torrent(id: &str, name: &str, files: &[(&str, bool)]) -> TorrentSnapshot {
        TorrentSnapshot::new(
            id,
            name,
            files
                .iter()
                .enumerate()
                .map(|(index, (path, selected))| FileEntry::new(index, *path, *selected, 1024))
                .collect(),
        )
    }

    /// unwanted = [jpg, txt], allowed = [mkv]
    pub fn policy() -> ExtensionPolicy {
        ExtensionPolicy::new(["jpg", "txt"], ["mkv"])
    }
}
