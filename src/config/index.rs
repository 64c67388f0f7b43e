//! Index nemesis timing and suppression configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default pattern suppressed while waiting for a build.
pub const BUILD_WAIT_PATTERN: &str = ".*view - Error applying view update to.*";
/// Default pattern suppressed around `DROP INDEX`.
pub const DROP_INDEX_PATTERN: &str = ".*view - Error applying view update to.*";
/// Default pattern suppressed around `DROP MATERIALIZED VIEW`.
pub const DROP_VIEW_PATTERN: &str = ".*Error applying view update.*";

/// Per-call-site suppression patterns.
///
/// Kept separate even where the defaults coincide so each site can be
/// narrowed independently.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SuppressionPatterns {
    pub build_wait: String,
    pub drop_index: String,
    pub drop_view: String,
}

impl Default for SuppressionPatterns {
    fn default() -> Self {
        Self {
            build_wait: BUILD_WAIT_PATTERN.to_string(),
            drop_index: DROP_INDEX_PATTERN.to_string(),
            drop_view: DROP_VIEW_PATTERN.to_string(),
        }
    }
}

/// Index/view lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexNemesisConfig {
    /// Maximum time to wait for a build to finish.
    pub build_timeout_secs: u64,
    /// Sleep between build status polls.
    pub poll_interval_secs: u64,
    /// How long a suppression window stays open after its scope exits.
    pub filter_grace_secs: u64,
    /// Row limit of the verification query.
    pub verify_row_limit: u32,
    pub patterns: SuppressionPatterns,
}

impl Default for IndexNemesisConfig {
    fn default() -> Self {
        Self {
            build_timeout_secs: 300,
            poll_interval_secs: 30,
            filter_grace_secs: 180,
            verify_row_limit: 100,
            patterns: SuppressionPatterns::default(),
        }
    }
}

impl IndexNemesisConfig {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn filter_grace(&self) -> Duration {
        Duration::from_secs(self.filter_grace_secs)
    }
}

/// Process-backed admin command configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodetoolConfig {
    /// Command prefix; the subcommand is appended as further arguments.
    ///
    /// Example: `["ssh", "db-node-1", "nodetool"]`
    pub command: Vec<String>,
}

impl Default for NodetoolConfig {
    fn default() -> Self {
        Self {
            command: vec!["nodetool".to_string()],
        }
    }
}
