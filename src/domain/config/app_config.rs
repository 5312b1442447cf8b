//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::duration::Duration;
use crate::domain::history::DEFAULT_HISTORY_SIZE;

/// Callers with a uid above this may not read diagnostic dumps
pub const DEFAULT_DUMP_UID_THRESHOLD: u32 = 10_000;

/// Default log filter directive
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub socket_path: Option<String>,
    pub init_retry_interval: Option<String>,
    pub init_max_attempts: Option<u32>,
    pub history_size: Option<usize>,
    pub dump_uid_threshold: Option<u32>,
    pub uids_per_session: Option<u32>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values.
    /// `socket_path` and `init_max_attempts` stay unset: the runtime-dir
    /// socket and unbounded retries are the defaults.
    pub fn defaults() -> Self {
        Self {
            socket_path: None,
            init_retry_interval: Some(Duration::default_init_retry().to_string()),
            init_max_attempts: None,
            history_size: Some(DEFAULT_HISTORY_SIZE),
            dump_uid_threshold: Some(DEFAULT_DUMP_UID_THRESHOLD),
            uids_per_session: Some(1),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            socket_path: other.socket_path.or(self.socket_path),
            init_retry_interval: other.init_retry_interval.or(self.init_retry_interval),
            init_max_attempts: other.init_max_attempts.or(self.init_max_attempts),
            history_size: other.history_size.or(self.history_size),
            dump_uid_threshold: other.dump_uid_threshold.or(self.dump_uid_threshold),
            uids_per_session: other.uids_per_session.or(self.uids_per_session),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get the retry interval, or default if not set/invalid
    pub fn init_retry_interval_or_default(&self) -> Duration {
        self.init_retry_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_init_retry)
    }

    pub fn history_size_or_default(&self) -> usize {
        self.history_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_HISTORY_SIZE)
    }

    pub fn dump_uid_threshold_or_default(&self) -> u32 {
        self.dump_uid_threshold.unwrap_or(DEFAULT_DUMP_UID_THRESHOLD)
    }

    /// Width of the uid range mapped to one session; never 0
    pub fn uids_per_session_or_default(&self) -> u32 {
        self.uids_per_session.filter(|n| *n > 0).unwrap_or(1)
    }

    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}
