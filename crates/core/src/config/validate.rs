use crate::policy::normalize_extension;

use super::{types::Config, ClientBackend, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Extension entries are bare suffixes and at least one list is non-empty
/// - The selected client backend has its section
/// - Enabled notifiers are usable
/// - Timeouts and retention windows are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Extension policy
    let extensions = &config.extensions;
    if extensions.unwanted.is_empty() && extensions.allowed.is_empty() {
        return Err(ConfigError::ValidationError(
            "extensions.unwanted and extensions.allowed cannot both be empty".to_string(),
        ));
    }
    for (list, entries) in [
        ("unwanted", &extensions.unwanted),
        ("allowed", &extensions.allowed),
    ] {
        for raw in entries {
            validate_extension(list, raw)?;
        }
    }

    // Client validation
    match config.client.backend {
        ClientBackend::Rpc => {
            let rpc = config.client.rpc.as_ref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "client.backend is \"rpc\" but [client.rpc] is missing".to_string(),
                )
            })?;
            if !is_http_url(&rpc.url) {
                return Err(ConfigError::ValidationError(format!(
                    "client.rpc.url must be an http(s) URL, got \"{}\"",
                    rpc.url
                )));
            }
            if rpc.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "client.rpc.timeout_secs cannot be 0".to_string(),
                ));
            }
        }
        ClientBackend::Remote => {
            let remote = config.client.remote.as_ref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "client.backend is \"remote\" but [client.remote] is missing".to_string(),
                )
            })?;
            if remote.binary_paths.is_empty() {
                return Err(ConfigError::ValidationError(
                    "client.remote.binary_paths cannot be empty".to_string(),
                ));
            }
            if remote.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "client.remote.timeout_secs cannot be 0".to_string(),
                ));
            }
        }
    }

    // Notifier validation
    let webhook = &config.notifications.webhook;
    if webhook.enabled {
        if !is_http_url(&webhook.url) {
            return Err(ConfigError::ValidationError(format!(
                "notifications.webhook.url must be an http(s) URL, got \"{}\"",
                webhook.url
            )));
        }
        if webhook.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.webhook.timeout_secs cannot be 0".to_string(),
            ));
        }
    }
    let pushbullet = &config.notifications.pushbullet;
    if pushbullet.enabled && pushbullet.access_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "notifications.pushbullet.access_token is required when pushbullet is enabled"
                .to_string(),
        ));
    }

    // Retention
    if config.tracker.retention_days == 0 {
        return Err(ConfigError::ValidationError(
            "tracker.retention_days cannot be 0".to_string(),
        ));
    }
    if config.logging.retention_days == 0 {
        return Err(ConfigError::ValidationError(
            "logging.retention_days cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_extension(list: &str, raw: &str) -> Result<(), ConfigError> {
    let ext = normalize_extension(raw);
    let malformed = ext.is_empty()
        || ext
            .chars()
            .any(|c| c == '.' || c == '/' || c == '\\' || c.is_whitespace());
    if malformed {
        return Err(ConfigError::ValidationError(format!(
            "extensions.{} contains an invalid extension: \"{}\"",
            list, raw
        )));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
