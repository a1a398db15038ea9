//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait that the cleanup core depends
//! on, with two Transmission transports behind it (JSON-RPC and the
//! `transmission-remote` command line tool).

mod remote;
mod transmission;
mod types;

pub use remote::TransmissionRemoteClient;
pub use transmission::TransmissionRpcClient;
pub use types::*;

use std::sync::Arc;

use crate::config::{ClientBackend, ClientConfig, ConfigError};

/// Build the client selected by the configuration.
pub fn create_torrent_client(
    config: &ClientConfig,
) -> Result<Arc<dyn TorrentClient>, ConfigError> {
    match config.backend {
        ClientBackend::Rpc => {
            let rpc = config.rpc.clone().ok_or_else(|| {
                ConfigError::ValidationError("[client.rpc] section is missing".to_string())
            })?;
            let client = TransmissionRpcClient::new(rpc)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            Ok(Arc::new(client))
        }
        ClientBackend::Remote => {
            let remote = config.remote.clone().ok_or_else(|| {
                ConfigError::ValidationError("[client.remote] section is missing".to_string())
            })?;
            Ok(Arc::new(TransmissionRemoteClient::new(remote)))
        }
    }
}
