//! Environment-driven configuration.
//!
//! Everything is read from `STASH_*` variables at startup. Validation happens
//! once, up front: a configuration that asks for periodic sync without git
//! tracking refuses to start rather than limping along with a half-wired
//! poller.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::{Effect, Transience};

const DEFAULT_CONTENT_ROOT: &str = "/data/content";
const DEFAULT_AUTHOR: &str = "stash <stash@local>";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_TXN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TXN_LOCK_WAIT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the content working tree.
    pub content_root: PathBuf,
    pub log_level: String,

    /// Whether the content root is treated as a git repository at all.
    /// Off by default; every git-facing surface requires it.
    pub git_tracking: bool,

    pub sync_enabled: bool,
    pub sync_remote: String,
    pub sync_branch: String,
    pub sync_interval: Duration,
    pub sync_recursive: bool,
    pub sync_token: Option<String>,

    /// Clone-on-first-run source. When set and the content root holds no
    /// repository yet, `stashd` clones it before anything else starts.
    pub clone_url: Option<String>,
    pub clone_branch: String,
    pub clone_token: Option<String>,

    /// Committer identity applied when the repository has none, in
    /// `"Name <address>"` form.
    pub author_default: String,

    pub txn_timeout: Duration,
    pub txn_lock_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from(DEFAULT_CONTENT_ROOT),
            log_level: "info".to_string(),
            git_tracking: false,
            sync_enabled: false,
            sync_remote: "origin".to_string(),
            sync_branch: "main".to_string(),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            sync_recursive: false,
            sync_token: None,
            clone_url: None,
            clone_branch: "main".to_string(),
            clone_token: None,
            author_default: DEFAULT_AUTHOR.to_string(),
            txn_timeout: Duration::from_secs(DEFAULT_TXN_TIMEOUT_SECS),
            txn_lock_wait: Duration::from_secs(DEFAULT_TXN_LOCK_WAIT_SECS),
        }
    }
}

impl Config {
    /// Load from process environment and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. `from_env` is this over
    /// `std::env::var`; tests pass a map instead of mutating process state.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();

        if let Some(root) = lookup("STASH_CONTENT_ROOT") {
            cfg.content_root = PathBuf::from(root);
        }
        if let Some(level) = lookup("STASH_LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.git_tracking = parse_bool(&lookup, "STASH_GIT_TRACKING", cfg.git_tracking)?;
        cfg.sync_enabled = parse_bool(&lookup, "STASH_GIT_SYNC_ENABLED", cfg.sync_enabled)?;
        if let Some(remote) = lookup("STASH_GIT_SYNC_REMOTE") {
            cfg.sync_remote = remote;
        }
        if let Some(branch) = lookup("STASH_GIT_SYNC_BRANCH") {
            cfg.sync_branch = branch;
        }
        cfg.sync_interval = parse_secs(&lookup, "STASH_GIT_SYNC_INTERVAL", cfg.sync_interval)?;
        cfg.sync_recursive =
            parse_bool(&lookup, "STASH_GIT_SYNC_RECURSIVE", cfg.sync_recursive)?;
        cfg.sync_token = lookup("STASH_GIT_SYNC_TOKEN").filter(|t| !t.is_empty());

        cfg.clone_url = lookup("STASH_GIT_CLONE_URL").filter(|u| !u.is_empty());
        if let Some(branch) = lookup("STASH_GIT_CLONE_BRANCH") {
            cfg.clone_branch = branch;
        }
        cfg.clone_token = lookup("STASH_GIT_CLONE_TOKEN").filter(|t| !t.is_empty());

        if let Some(author) = lookup("STASH_GIT_AUTHOR_DEFAULT") {
            cfg.author_default = author;
        }

        cfg.txn_timeout = parse_secs(&lookup, "STASH_TRANSACTION_TIMEOUT", cfg.txn_timeout)?;
        cfg.txn_lock_wait =
            parse_secs(&lookup, "STASH_TRANSACTION_LOCK_WAIT", cfg.txn_lock_wait)?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_enabled && !self.git_tracking {
            return Err(ConfigError::SyncWithoutTracking);
        }
        Ok(())
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(
        "STASH_GIT_SYNC_ENABLED requires STASH_GIT_TRACKING; \
         enable tracking or disable periodic sync"
    )]
    SyncWithoutTracking,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = Config::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(cfg.content_root, PathBuf::from("/data/content"));
        assert!(!cfg.git_tracking);
        assert!(!cfg.sync_enabled);
        assert_eq!(cfg.sync_remote, "origin");
        assert_eq!(cfg.sync_branch, "main");
        assert_eq!(cfg.txn_timeout, Duration::from_secs(300));
        assert_eq!(cfg.txn_lock_wait, Duration::from_secs(10));
    }

    #[test]
    fn sync_without_tracking_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("STASH_GIT_SYNC_ENABLED", "true")]))
            .expect_err("must reject sync without tracking");
        assert!(matches!(err, ConfigError::SyncWithoutTracking));
        assert_eq!(err.transience(), Transience::Permanent);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("STASH_CONTENT_ROOT", "/srv/notes"),
            ("STASH_GIT_TRACKING", "true"),
            ("STASH_GIT_SYNC_ENABLED", "yes"),
            ("STASH_GIT_SYNC_REMOTE", "upstream"),
            ("STASH_GIT_SYNC_INTERVAL", "30"),
            ("STASH_TRANSACTION_TIMEOUT", "60"),
            ("STASH_GIT_SYNC_TOKEN", "s3cret"),
        ]))
        .expect("valid config");
        assert_eq!(cfg.content_root, PathBuf::from("/srv/notes"));
        assert!(cfg.sync_enabled);
        assert_eq!(cfg.sync_remote, "upstream");
        assert_eq!(cfg.sync_interval, Duration::from_secs(30));
        assert_eq!(cfg.txn_timeout, Duration::from_secs(60));
        assert_eq!(cfg.sync_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("STASH_GIT_SYNC_INTERVAL", "soon")]))
            .expect_err("must reject non-numeric interval");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "STASH_GIT_SYNC_INTERVAL",
                ..
            }
        ));
    }
}
