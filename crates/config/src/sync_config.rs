//! Bookmark sync configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_INTERVAL_SECS: u64 = 60;
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// How and when bookmarks are synchronized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Run periodic sync at all
    pub enabled: bool,

    /// Seconds between periodic syncs
    pub interval_secs: u64,

    /// Seconds before the first periodic sync
    pub initial_delay_secs: u64,

    /// Keep local changes when the server rejects a create or delete
    pub ignore_remote_failures: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            initial_delay_secs: 0,
            ignore_remote_failures: false,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl ConfigSection for SyncConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(
                self.interval_secs,
                MIN_INTERVAL_SECS,
                MAX_INTERVAL_SECS,
                "sync.interval_secs",
            ),
            Validator::in_range(
                self.initial_delay_secs,
                0,
                MAX_INTERVAL_SECS,
                "sync.initial_delay_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        *self = other;
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}
