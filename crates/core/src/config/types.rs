use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub client: ClientConfig,
    pub extensions: ExtensionsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Torrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Which transport talks to Transmission
    pub backend: ClientBackend,
    /// JSON-RPC settings (required when backend = "rpc")
    #[serde(default)]
    pub rpc: Option<RpcConfig>,
    /// transmission-remote settings (required when backend = "remote")
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

/// Available client transports
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientBackend {
    /// Native Transmission JSON-RPC over HTTP.
    Rpc,
    /// The `transmission-remote` command line tool.
    Remote,
}

/// Transmission JSON-RPC configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcConfig {
    /// RPC endpoint (e.g., "http://localhost:9091/transmission/rpc")
    #[serde(default = "default_rpc_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            username: None,
            password: None,
            timeout_secs: default_client_timeout(),
        }
    }
}

/// transmission-remote configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_host")]
    pub host: String,
    #[serde(default = "default_remote_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Candidate locations of the binary, tried in order.
    /// Bare names are looked up on PATH.
    #[serde(default = "default_binary_paths")]
    pub binary_paths: Vec<String>,
    /// Per-invocation timeout in seconds (default: 30)
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            port: default_remote_port(),
            username: None,
            password: None,
            binary_paths: default_binary_paths(),
            timeout_secs: default_client_timeout(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://localhost:9091/transmission/rpc".to_string()
}

fn default_remote_host() -> String {
    "localhost".to_string()
}

fn default_remote_port() -> u16 {
    9091
}

fn default_binary_paths() -> Vec<String> {
    vec![
        "transmission-remote".to_string(),
        "/usr/bin/transmission-remote".to_string(),
        "/usr/local/bin/transmission-remote".to_string(),
    ]
}

fn default_client_timeout() -> u32 {
    30
}

/// Extension policy configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtensionsConfig {
    /// Extensions whose files are never downloaded.
    #[serde(default)]
    pub unwanted: Vec<String>,
    /// Extensions whose presence justifies keeping a torrent.
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// Per-run behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Evaluate, record and notify without touching the client.
    #[serde(default)]
    pub dry_run: bool,
    /// Leave torrents without a file list alone until metadata arrives.
    /// When false they are removed.
    #[serde(default = "default_true")]
    pub skip_zero_file_torrents: bool,
    /// Delete downloaded data together with a removed torrent.
    #[serde(default = "default_true")]
    pub delete_data: bool,
    /// Lock file guarding against overlapping runs.
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_zero_file_torrents: true,
            delete_data: true,
            lock_file: default_lock_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("sweeper.lock")
}

/// Processed-set tracker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_path")]
    pub path: PathBuf,
    /// Records older than this are pruned at the start of each run.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Re-evaluate torrents kept without action once the extension policy changes.
    #[serde(default = "default_true")]
    pub revisit_skipped_on_policy_change: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            path: default_tracker_path(),
            retention_days: default_retention_days(),
            revisit_skipped_on_policy_change: true,
        }
    }
}

fn default_tracker_path() -> PathBuf {
    PathBuf::from("sweeper.db")
}

fn default_retention_days() -> u32 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Activity log file. Console only when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Default filter directive, overridden by RUST_LOG.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            retention_days: default_retention_days(),
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub send_on_unselect: bool,
    #[serde(default = "default_true")]
    pub send_on_remove: bool,
    #[serde(default)]
    pub send_on_skip: bool,
    #[serde(default)]
    pub send_on_keep: bool,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub pushbullet: PushbulletConfig,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            send_on_unselect: true,
            send_on_remove: true,
            send_on_skip: false,
            send_on_keep: false,
            webhook: WebhookConfig::default(),
            pushbullet: PushbulletConfig::default(),
        }
    }
}

/// Webhook transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL; the action name is appended as the last path segment.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u32,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_notify_timeout() -> u32 {
    10
}

/// Pushbullet transport configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PushbulletConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    /// Target a single device instead of all of them.
    #[serde(default)]
    pub device_iden: Option<String>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub client: SanitizedClientConfig,
    pub extensions: ExtensionsConfig,
    pub run: RunConfig,
    pub tracker: TrackerConfig,
    pub logging: LoggingConfig,
    pub notifications: SanitizedNotificationsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientConfig {
    pub backend: ClientBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotificationsConfig {
    pub send_on_unselect: bool,
    pub send_on_remove: bool,
    pub send_on_skip: bool,
    pub send_on_keep: bool,
    pub webhook: WebhookConfig,
    pub pushbullet_enabled: bool,
    pub pushbullet_token_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushbullet_device_iden: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let (endpoint, username, password) = match config.client.backend {
            ClientBackend::Rpc => config
                .client
                .rpc
                .as_ref()
                .map(|r| (Some(r.url.clone()), r.username.clone(), r.password.is_some()))
                .unwrap_or((None, None, false)),
            ClientBackend::Remote => config
                .client
                .remote
                .as_ref()
                .map(|r| {
                    (
                        Some(format!("{}:{}", r.host, r.port)),
                        r.username.clone(),
                        r.password.is_some(),
                    )
                })
                .unwrap_or((None, None, false)),
        };

        let notifications = &config.notifications;
        Self {
            client: SanitizedClientConfig {
                backend: config.client.backend,
                endpoint,
                username,
                password_configured: password,
            },
            extensions: config.extensions.clone(),
            run: config.run.clone(),
            tracker: config.tracker.clone(),
            logging: config.logging.clone(),
            notifications: SanitizedNotificationsConfig {
                send_on_unselect: notifications.send_on_unselect,
                send_on_remove: notifications.send_on_remove,
                send_on_skip: notifications.send_on_skip,
                send_on_keep: notifications.send_on_keep,
                webhook: notifications.webhook.clone(),
                pushbullet_enabled: notifications.pushbullet.enabled,
                pushbullet_token_configured: !notifications.pushbullet.access_token.is_empty(),
                pushbullet_device_iden: notifications.pushbullet.device_iden.clone(),
            },
        }
    }
}
