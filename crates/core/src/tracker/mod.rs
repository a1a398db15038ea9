//! Processed-set tracker.
//!
//! Durable ledger of torrents that reached a terminal decision, consulted at
//! the start of every run so they are neither re-evaluated nor re-notified.

mod sqlite;
mod store;

pub use sqlite::SqliteProcessedStore;
pub use store::*;
