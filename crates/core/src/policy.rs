//! Extension policy and filename classification.
//!
//! Classification is purely by filename suffix. Nothing here touches the
//! client or the filesystem.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ExtensionsConfig;

/// How a single file is treated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Should never be downloaded.
    Unwanted,
    /// Justifies keeping the torrent while selected.
    Allowed,
    /// In neither set; left untouched.
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Unwanted => "unwanted",
            Classification::Allowed => "allowed",
            Classification::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured unwanted/allowed extension sets.
///
/// Entries are stored lower-cased and without a leading dot. The sets may
/// overlap; `classify` resolves the conflict in favour of `Unwanted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionPolicy {
    unwanted: BTreeSet<String>,
    allowed: BTreeSet<String>,
}

impl ExtensionPolicy {
    /// Build a policy, normalising every entry.
    pub fn new<U, A, S>(unwanted: U, allowed: A) -> Self
    where
        U: IntoIterator<Item = S>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalize_all = |items: Vec<S>| -> BTreeSet<String> {
            items
                .iter()
                .map(|s| normalize_extension(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect()
        };

        Self {
            unwanted: normalize_all(unwanted.into_iter().collect()),
            allowed: normalize_all(allowed.into_iter().collect()),
        }
    }

    pub fn unwanted(&self) -> &BTreeSet<String> {
        &self.unwanted
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    /// Extensions configured as both unwanted and allowed.
    pub fn overlap(&self) -> Vec<String> {
        self.unwanted.intersection(&self.allowed).cloned().collect()
    }

    /// Stable digest of the normalised policy.
    ///
    /// Two policies with the same sets produce the same fingerprint regardless
    /// of the order or spelling (case, leading dot) of the configured entries.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"unwanted:");
        for ext in &self.unwanted {
            hasher.update(ext.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b";allowed:");
        for ext in &self.allowed {
            hasher.update(ext.as_bytes());
            hasher.update(b",");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl From<&ExtensionsConfig> for ExtensionPolicy {
    fn from(config: &ExtensionsConfig) -> Self {
        ExtensionPolicy::new(&config.unwanted, &config.allowed)
    }
}

/// Normalise a configured extension: trimmed, one leading dot removed, lower-cased.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_lowercase()
}

/// Extension of the last path component, lower-cased, without the dot.
///
/// Returns `None` when the filename has no dot or ends with one.
pub fn extension_of(path: &str) -> Option<String> {
    let filename = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Classify a filename against the policy. Total: never fails.
pub fn classify(filename: &str, policy: &ExtensionPolicy) -> Classification {
    match extension_of(filename) {
        Some(ext) => classify_extension(Some(&ext), policy),
        None => Classification::Unknown,
    }
}

/// Classify an already extracted extension.
pub fn classify_extension(extension: Option<&str>, policy: &ExtensionPolicy) -> Classification {
    let Some(ext) = extension else {
        return Classification::Unknown;
    };
    if policy.unwanted.contains(ext) {
        Classification::Unwanted
    } else if policy.allowed.contains(ext) {
        Classification::Allowed
    } else {
        Classification::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ExtensionPolicy {
        ExtensionPolicy::new(["jpg", "txt"], ["mkv"])
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.mkv"), Some("mkv".to_string()));
        assert_eq!(extension_of("Movie.Name.2019.MKV"), Some("mkv".to_string()));
        assert_eq!(extension_of("Show/Season.1/ep01.srt"), Some("srt".to_string()));
        assert_eq!(extension_of("Show\\cover.JPG"), Some("jpg".to_string()));
        assert_eq!(extension_of(".nfo"), Some("nfo".to_string()));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("Release.v2/README"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of(""), None);
    }

    #[test]
    fn test_classify_basic() {
        let p = policy();
        assert_eq!(classify("a.mkv", &p), Classification::Allowed);
        assert_eq!(classify("b.jpg", &p), Classification::Unwanted);
        assert_eq!(classify("c.TXT", &p), Classification::Unwanted);
        assert_eq!(classify("d.srt", &p), Classification::Unknown);
        assert_eq!(classify("no_extension", &p), Classification::Unknown);
    }

    #[test]
    fn test_classify_is_total_on_odd_input() {
        let p = policy();
        for name in ["", ".", "..", "/", "a/", "a/.", "   ", "ü.日本"] {
            assert_eq!(classify(name, &p), Classification::Unknown, "{:?}", name);
        }
    }

    #[test]
    fn test_conflicting_extension_resolves_to_unwanted() {
        let p = ExtensionPolicy::new(["jpg", "mkv"], ["mkv"]);
        assert_eq!(classify("a.mkv", &p), Classification::Unwanted);
        assert_eq!(p.overlap(), vec!["mkv".to_string()]);
    }

    #[test]
    fn test_policy_normalizes_entries() {
        let p = ExtensionPolicy::new([".JPG", " txt ", ""], ["MKV"]);
        assert!(p.unwanted().contains("jpg"));
        assert!(p.unwanted().contains("txt"));
        assert_eq!(p.unwanted().len(), 2);
        assert!(p.allowed().contains("mkv"));
        assert_eq!(classify("x.jpg", &p), Classification::Unwanted);
    }

    #[test]
    fn test_fingerprint_is_order_and_case_insensitive() {
        let a = ExtensionPolicy::new(["jpg", "txt"], ["mkv"]);
        let b = ExtensionPolicy::new(["TXT", ".jpg"], ["mkv"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = ExtensionPolicy::new(["jpg", "txt", "nfo"], ["mkv"]);
        assert_ne!(a.fingerprint(), c.fingerprint());

        // Moving an extension between sets changes the policy.
        let d = ExtensionPolicy::new(["jpg"], ["mkv", "txt"]);
        assert_ne!(a.fingerprint(), d.fingerprint());
    }

    #[test]
    fn test_policy_from_config() {
        let config = ExtensionsConfig {
            unwanted: vec!["exe".to_string()],
            allowed: vec!["mp4".to_string()],
        };
        let p = ExtensionPolicy::from(&config);
        assert_eq!(classify("setup.exe", &p), Classification::Unwanted);
        assert_eq!(classify("movie.mp4", &p), Classification::Allowed);
    }
}
