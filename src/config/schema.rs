/// Configuration schema and defaults for botdash.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[cache]`, `[dashboard]` and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::history::TrendWindow;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level botdash configuration.
///
/// Maps directly to the `~/.botdash/config.toml` and `.botdash.toml` file
/// schemas. All sections and fields are optional — missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotdashConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Where the bot-monitoring web service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the web service; `/api/...` paths are appended.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` leaves the HTTP client's own
    /// defaults in place.
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [cache]
// ---------------------------------------------------------------------------

/// Local task-history cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Minutes a cached task history stays fresh.
    pub ttl_minutes: u64,
    /// Maximum number of task records kept.
    pub max_records: usize,
    /// `limit` sent to `/api/get_recent_tasks` when the cache is refilled.
    pub fetch_limit: usize,
    /// Storage file override. Defaults to `~/.botdash/storage.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            max_records: 200,
            fetch_limit: 200,
            storage_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard rendering and refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Seconds between refresh cycles in `botdash watch`.
    pub refresh_secs: u64,
    /// Trend window used when none is given: `7d`, `30d` or `90d`.
    pub default_window: TrendWindow,
    /// Number of entries in the recent-activity timeline.
    pub activity_limit: usize,
    /// Seconds to wait after a restart before re-reading the bot status.
    pub restart_delay_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 30,
            default_window: TrendWindow::Week,
            activity_limit: 5,
            restart_delay_secs: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"warn"` or `"botdash=debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "off".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default config file content
// ---------------------------------------------------------------------------

impl BotdashConfig {
    /// Return the annotated default configuration as a TOML string.
    ///
    /// Written by `botdash config init`.
    pub fn default_toml() -> String {
        r#"# botdash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (BOTDASH_*)
#   2. Project config (.botdash.toml in current directory)
#   3. User global config (~/.botdash/config.toml)
#   4. Built-in defaults

[server]
base_url = "http://127.0.0.1:5000"
timeout_ms = 0                        # 0 = no client-side timeout

[cache]
ttl_minutes = 30
max_records = 200
fetch_limit = 200
# storage_path = "/path/to/storage.json"

[dashboard]
refresh_secs = 30
default_window = "7d"                 # 7d | 30d | 90d
activity_limit = 5
restart_delay_secs = 3

[logging]
level = "off"                         # RUST_LOG overrides
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
