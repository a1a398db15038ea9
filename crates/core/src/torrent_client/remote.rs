//! `transmission-remote` command line client implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RemoteConfig;

use super::{FileEntry, TorrentClient, TorrentClientError, TorrentId, TorrentSnapshot};

/// One row of `transmission-remote -t <id> -f`:
/// `  0: 100% Normal   Yes   1.29 GB  Release/movie.mkv`
static FILE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+):\s+\d+%\s+\S+\s+(Yes|No)\s+(None|[\d.]+\s+\S+)\s+(.+?)\s*$")
        .unwrap_or_else(|e| panic!("invalid file line pattern: {}", e))
});

/// Client that shells out to `transmission-remote`.
///
/// Torrents are addressed by the daemon's numeric id.
pub struct TransmissionRemoteClient {
    config: RemoteConfig,
}

impl TransmissionRemoteClient {
    /// Create a new client. The binary is located lazily on first use.
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    /// Find the first usable binary among the configured candidates.
    fn find_binary(&self) -> Result<PathBuf, TorrentClientError> {
        for candidate in &self.config.binary_paths {
            let path = Path::new(candidate);
            if path.components().count() > 1 {
                if is_executable(path) {
                    return Ok(path.to_path_buf());
                }
            } else if let Some(found) = search_path(candidate) {
                return Ok(found);
            }
        }
        Err(TorrentClientError::BinaryNotFound(
            self.config.binary_paths.join(", "),
        ))
    }

    /// Run `transmission-remote` with the given arguments and return stdout.
    async fn run(&self, args: &[String]) -> Result<String, TorrentClientError> {
        let binary = self.find_binary()?;

        let mut command = Command::new(&binary);
        command
            .arg(format!("{}:{}", self.config.host, self.config.port))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(username) = &self.config.username {
            let password = self.config.password.as_deref().unwrap_or_default();
            command.arg(format!("--auth={}:{}", username, password));
        }
        command.args(args);

        debug!(binary = %binary.display(), ?args, "Running transmission-remote");

        let timeout = Duration::from_secs(self.config.timeout_secs as u64);
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| TorrentClientError::Timeout)?
            .map_err(|e| {
                TorrentClientError::ClientUnavailable(format!(
                    "failed to run {}: {}",
                    binary.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // stdout echoes torrent and file names verbatim; only stderr carries
        // the tool's own error messages.
        if !output.status.success() || stderr.contains("Error:") {
            return Err(classify_failure(&stdout, &stderr));
        }

        Ok(stdout)
    }

    async fn torrent_files(&self, id: &TorrentId) -> Result<Vec<FileEntry>, TorrentClientError> {
        let output = self
            .run(&["-t".to_string(), id.to_string(), "-f".to_string()])
            .await?;
        Ok(parse_file_list(&output))
    }
}

#[async_trait]
impl TorrentClient for TransmissionRemoteClient {
    fn name(&self) -> &str {
        "transmission-remote"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, TorrentClientError> {
        let output = self.run(&["-l".to_string()]).await?;
        let listed = parse_torrent_list(&output)?;

        let mut snapshots = Vec::with_capacity(listed.len());
        for (id, name) in listed {
            let id = TorrentId::from(id);
            match self.torrent_files(&id).await {
                Ok(files) => snapshots.push(TorrentSnapshot { id, name, files }),
                Err(e) if e.is_not_found() => {
                    warn!(
                        torrent_id = %id,
                        torrent_name = %name,
                        error = %e,
                        "Torrent disappeared while listing files, skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(snapshots)
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

        let indices = file_indices
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let flag = if wanted { "-g" } else { "-G" };

        self.run(&["-t".to_string(), id.to_string(), flag.to_string(), indices])
            .await?;
        Ok(())
    }

    async fn remove_torrent(
        &self,
        id: &TorrentId,
        delete_data: bool,
    ) -> Result<(), TorrentClientError> {
        let flag = if delete_data {
            "--remove-and-delete"
        } else {
            "--remove"
        };
        self.run(&["-t".to_string(), id.to_string(), flag.to_string()])
            .await?;
        Ok(())
    }
}

/// Map a failed invocation to an error based on what the tool printed.
fn classify_failure(stdout: &str, stderr: &str) -> TorrentClientError {
    let message = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    let lower = message.to_lowercase();

    if lower.contains("non-existent torrent") || lower.contains("no such torrent") {
        TorrentClientError::TorrentNotFound(message.to_string())
    } else if lower.contains("unauthorized") || lower.contains("401") {
        TorrentClientError::AuthenticationFailed(message.to_string())
    } else {
        TorrentClientError::ClientUnavailable(message.to_string())
    }
}

/// Parse `transmission-remote -l` into `(id, name)` pairs.
///
/// The name column is located from the header, since earlier columns
/// (ETA, status) may themselves contain spaces.
fn parse_torrent_list(output: &str) -> Result<Vec<(u64, String)>, TorrentClientError> {
    let mut lines = output.lines();
    let header = lines
        .by_ref()
        .find(|line| line.trim_start().starts_with("ID"))
        .ok_or_else(|| {
            TorrentClientError::InvalidResponse("torrent list without header".to_string())
        })?;
    let name_col = header.find("Name").ok_or_else(|| {
        TorrentClientError::InvalidResponse("torrent list header without Name".to_string())
    })?;

    let mut torrents = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("Sum:") {
            continue;
        }
        let Some(id) = trimmed
            .split_whitespace()
            .next()
            .map(|token| token.trim_end_matches('*'))
            .and_then(|token| token.parse::<u64>().ok())
        else {
            continue;
        };
        let name = line.get(name_col..).unwrap_or_default().trim().to_string();
        torrents.push((id, name));
    }
    Ok(torrents)
}

/// Parse `transmission-remote -t <id> -f`.
fn parse_file_list(output: &str) -> Vec<FileEntry> {
    output
        .lines()
        .filter_map(|line| {
            let caps = FILE_LINE.captures(line)?;
            let index = caps.get(1)?.as_str().parse::<usize>().ok()?;
            let selected = caps.get(2)?.as_str() == "Yes";
            let size = parse_size(caps.get(3)?.as_str());
            let path = caps.get(4)?.as_str();
            Some(FileEntry::new(index, path, selected, size))
        })
        .collect()
}

/// Parse a human readable size such as `1.29 GB`. Unknown forms are 0.
fn parse_size(text: &str) -> u64 {
    let mut parts = text.split_whitespace();
    let (Some(value), Some(unit)) = (parts.next(), parts.next()) else {
        return 0;
    };
    let Ok(value) = value.parse::<f64>() else {
        return 0;
    };
    let multiplier: f64 = match unit {
        "B" | "bytes" => 1.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return 0,
    };
    (value * multiplier) as u64
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
