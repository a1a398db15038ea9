//! Transmission JSON-RPC client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RpcConfig;

use super::{FileEntry, TorrentClient, TorrentClientError, TorrentId, TorrentSnapshot};

/// Header carrying Transmission's CSRF token.
const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Fields requested for a full snapshot.
const SNAPSHOT_FIELDS: [&str; 5] = ["id", "hashString", "name", "files", "fileStats"];

/// Transmission RPC client implementation.
///
/// Torrents are addressed by info hash, which survives daemon restarts.
pub struct TransmissionRpcClient {
    client: Client,
    config: RpcConfig,
    /// Session id handed out by the daemon (refreshed on 409).
    session: Arc<RwLock<Option<String>>>,
}

impl TransmissionRpcClient {
    /// Create a new Transmission RPC client.
    pub fn new(config: RpcConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                TorrentClientError::ClientUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Send one request, attaching credentials and the current session id.
    async fn send(&self, body: &Value) -> Result<reqwest::Response, TorrentClientError> {
        let mut request = self.client.post(&self.config.url).json(body);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }
        if let Some(session_id) = self.session.read().await.as_ref() {
            request = request.header(SESSION_HEADER, session_id);
        }

        request.send().await.map_err(map_request_error)
    }

    /// Call an RPC method and return its `arguments` object.
    async fn call(&self, method: &str, arguments: Value) -> Result<Value, TorrentClientError> {
        let body = json!({ "method": method, "arguments": arguments });

        let mut response = self.send(&body).await?;

        if response.status() == StatusCode::CONFLICT {
            // Missing or stale session id, retry once with the new one
            let session_id = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    TorrentClientError::InvalidResponse(
                        "409 response without a session id".to_string(),
                    )
                })?;
            debug!("Transmission session id refreshed");
            *self.session.write().await = Some(session_id);

            response = self.send(&body).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TorrentClientError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        if status == StatusCode::CONFLICT {
            warn!("Transmission rejected the refreshed session id");
        }
        if !status.is_success() {
            return Err(TorrentClientError::ClientUnavailable(format!(
                "HTTP {}",
                status
            )));
        }

        let text = response.text().await.map_err(map_request_error)?;
        let reply: RpcReply = serde_json::from_str(&text).map_err(|e| {
            TorrentClientError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        if reply.result != "success" {
            return Err(TorrentClientError::InvalidResponse(format!(
                "{} failed: {}",
                method, reply.result
            )));
        }

        Ok(reply.arguments)
    }

    /// Fail with `TorrentNotFound` if the torrent is no longer in the client.
    async fn ensure_exists(&self, id: &TorrentId) -> Result<(), TorrentClientError> {
        let arguments = self
            .call(
                "torrent-get",
                json!({ "ids": [id.as_str()], "fields": ["id"] }),
            )
            .await?;

        let torrents = arguments
            .get("torrents")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                TorrentClientError::InvalidResponse("torrent-get without torrents".to_string())
            })?;

        if torrents.is_empty() {
            Err(TorrentClientError::TorrentNotFound(id.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Envelope of every RPC response.
#[derive(Debug, Deserialize)]
struct RpcReply {
    result: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct TorrentGetArguments {
    torrents: Vec<RpcTorrent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTorrent {
    hash_string: String,
    name: String,
    #[serde(default)]
    files: Vec<RpcFile>,
    #[serde(default)]
    file_stats: Vec<RpcFileStat>,
}

#[derive(Debug, Deserialize)]
struct RpcFile {
    name: String,
    length: u64,
}

#[derive(Debug, Deserialize)]
struct RpcFileStat {
    wanted: bool,
}

impl RpcTorrent {
    fn into_snapshot(self) -> TorrentSnapshot {
        let files = self
            .files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                // fileStats is index-aligned with files; treat a missing stat as wanted
                let selected = self
                    .file_stats
                    .get(index)
                    .map(|stat| stat.wanted)
                    .unwrap_or(true);
                FileEntry::new(index, file.name, selected, file.length)
            })
            .collect();

        TorrentSnapshot {
            id: TorrentId::new(self.hash_string.to_lowercase()),
            name: self.name,
            files,
        }
    }
}

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else {
        TorrentClientError::ClientUnavailable(e.to_string())
    }
}

#[async_trait]
impl TorrentClient for TransmissionRpcClient {
    fn name(&self) -> &str {
        "transmission-rpc"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, TorrentClientError> {
        let arguments = self
            .call("torrent-get", json!({ "fields": SNAPSHOT_FIELDS }))
            .await?;

        let parsed: TorrentGetArguments = serde_json::from_value(arguments).map_err(|e| {
            TorrentClientError::InvalidResponse(format!("Failed to parse torrents: {}", e))
        })?;

        Ok(parsed
            .torrents
            .into_iter()
            .map(RpcTorrent::into_snapshot)
            .collect())
    }

    async fn set_files_wanted(
        &self,
        id: &TorrentId,
        file_indices: &[usize],
        wanted: bool,
    ) -> Result<(), TorrentClientError> {
        if file_indices.is_empty() {
            return Ok(());
        }
        self.ensure_exists(id).await?;

        let key = if wanted { "files-wanted" } else { "files-unwanted" };
        let mut arguments = json!({ "ids": [id.as_str()] });
        arguments[key] = json!(file_indices);

        self.call("torrent-set", arguments).await?;
        Ok(())
    }

    async fn remove_torrent(
        &self,
        id: &TorrentId,
        delete_data: bool,
    ) -> Result<(), TorrentClientError> {
        self.ensure_exists(id).await?;

        self.call(
            "torrent-remove",
            json!({ "ids": [id.as_str()], "delete-local-data": delete_data }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(url: String) -> TransmissionRpcClient {
        TransmissionRpcClient::new(RpcConfig {
            url,
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_rpc_torrent_conversion() {
        let torrent: RpcTorrent = serde_json::from_value(json!({
            "id": 3,
            "hashString": "ABCDEF0123",
            "name": "Some.Release",
            "files": [
                { "name": "Some.Release/movie.mkv", "length": 1000, "bytesCompleted": 0 },
                { "name": "Some.Release/cover.jpg", "length": 20, "bytesCompleted": 0 },
                { "name": "Some.Release/info.nfo", "length": 5, "bytesCompleted": 0 }
            ],
            "fileStats": [
                { "wanted": true, "priority": 0, "bytesCompleted": 0 },
                { "wanted": false, "priority": 0, "bytesCompleted": 0 }
            ]
        }))
        .unwrap();

        let snapshot = torrent.into_snapshot();
        assert_eq!(snapshot.id.as_str(), "abcdef0123");
        assert_eq!(snapshot.name, "Some.Release");
        assert_eq!(snapshot.files.len(), 3);
        assert_eq!(snapshot.files[0].extension.as_deref(), Some("mkv"));
        assert!(snapshot.files[0].selected);
        assert!(!snapshot.files[1].selected);
        assert_eq!(snapshot.files[1].index, 1);
        // Missing stat defaults to wanted
        assert!(snapshot.files[2].selected);
    }

    #[tokio::test]
    async fn test_list_torrents() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(200).json_body(json!({
                    "result": "success",
                    "arguments": {
                        "torrents": [{
                            "id": 1,
                            "hashString": "aaaa",
                            "name": "First",
                            "files": [{ "name": "First/a.mkv", "length": 10, "bytesCompleted": 0 }],
                            "fileStats": [{ "wanted": true, "priority": 0, "bytesCompleted": 0 }]
                        }]
                    }
                }));
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let torrents = client.list_torrents().await.unwrap();

        mock.assert_async().await;
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].id.as_str(), "aaaa");
        assert_eq!(torrents[0].files[0].path, "First/a.mkv");
    }

    #[tokio::test]
    async fn test_session_id_handshake() {
        let server = MockServer::start_async().await;
        let handshake = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/transmission/rpc")
                    .header_missing(SESSION_HEADER);
                then.status(409).header(SESSION_HEADER, "token-1");
            })
            .await;
        let accepted = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/transmission/rpc")
                    .header(SESSION_HEADER, "token-1");
                then.status(200)
                    .json_body(json!({ "result": "success", "arguments": { "torrents": [] } }));
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        assert!(client.list_torrents().await.unwrap().is_empty());
        assert_eq!(handshake.hits_async().await, 1);
        assert_eq!(accepted.hits_async().await, 1);

        // The session id is reused for later calls
        assert!(client.list_torrents().await.unwrap().is_empty());
        assert_eq!(handshake.hits_async().await, 1);
        assert_eq!(accepted.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_repeated_conflict_is_an_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(409).header(SESSION_HEADER, "token-1");
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let err = client.list_torrents().await.unwrap_err();

        assert!(matches!(err, TorrentClientError::ClientUnavailable(_)));
        // One retry, no loop
        assert_eq!(mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_conflict_without_session_id_is_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(409);
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let err = client.list_torrents().await.unwrap_err();
        assert!(matches!(err, TorrentClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(401);
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let err = client.list_torrents().await.unwrap_err();
        assert!(matches!(err, TorrentClientError::AuthenticationFailed(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rpc_failure_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(200)
                    .json_body(json!({ "result": "invalid argument", "arguments": {} }));
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let err = client.list_torrents().await.unwrap_err();
        assert!(matches!(err, TorrentClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_remove_vanished_torrent_is_not_found() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(200)
                    .json_body(json!({ "result": "success", "arguments": { "torrents": [] } }));
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        let err = client
            .remove_torrent(&TorrentId::new("gone"), true)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        // Only the existence check was sent
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_set_files_wanted_checks_presence_then_sets() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/transmission/rpc");
                then.status(200).json_body(json!({
                    "result": "success",
                    "arguments": { "torrents": [{ "id": 1 }] }
                }));
            })
            .await;

        let client = client_for(server.url("/transmission/rpc"));
        client
            .set_files_wanted(&TorrentId::new("aaaa"), &[1, 2], false)
            .await
            .unwrap();

        assert_eq!(mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_set_files_wanted_with_no_files_is_a_no_op() {
        // Nothing listens here; any request would fail
        let client = client_for("http://127.0.0.1:9/transmission/rpc".to_string());
        client
            .set_files_wanted(&TorrentId::new("aaaa"), &[], false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_transient() {
        let client = client_for("http://127.0.0.1:9/transmission/rpc".to_string());
        let err = client.list_torrents().await.unwrap_err();
        assert!(err.is_transient());
    }
}
