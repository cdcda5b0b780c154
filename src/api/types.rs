//! Wire types for the bot-monitoring web service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::history::TaskTimestamp;

/// Value of the `status` field that marks a successful call.
pub const STATUS_SUCCESS: &str = "success";

// ---------------------------------------------------------------------------
// Bot status
// ---------------------------------------------------------------------------

/// Response body of `GET /api/get_bot_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotStatus {
    pub status: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub state_description: Option<String>,
    /// Icon name from the server's icon set (e.g. `play-circle`).
    #[serde(default)]
    pub state_icon: Option<String>,
    /// One of `success`, `warning`, `danger`, `secondary`.
    #[serde(default)]
    pub state_color: Option<String>,
    #[serde(default)]
    pub timestamp: Option<TaskTimestamp>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BotStatus {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn bot_state(&self) -> BotState {
        self.state.as_deref().map(BotState::parse).unwrap_or_default()
    }

    pub fn color(&self) -> StateColor {
        StateColor::parse(self.state_color.as_deref().unwrap_or_default())
    }
}

/// Lifecycle state of the bot process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BotState {
    Running,
    Paused,
    ShuttingDown,
    /// Any state this client doesn't know about, kept verbatim.
    Other(String),
    #[default]
    Unknown,
}

impl BotState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "shutting_down" => Self::ShuttingDown,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Which control actions make sense in this state.
    pub fn controls(&self) -> Controls {
        match self {
            Self::Running => Controls {
                pause: true,
                resume: false,
                shutdown: true,
            },
            Self::Paused => Controls {
                pause: false,
                resume: true,
                shutdown: true,
            },
            Self::ShuttingDown => Controls::NONE,
            Self::Other(_) | Self::Unknown => Controls::ALL,
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Other(raw) => f.write_str(raw),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Control actions currently offered for the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub pause: bool,
    pub resume: bool,
    pub shutdown: bool,
}

impl Controls {
    pub const ALL: Self = Self {
        pause: true,
        resume: true,
        shutdown: true,
    };
    pub const NONE: Self = Self {
        pause: false,
        resume: false,
        shutdown: false,
    };
}

/// Severity colour the server attaches to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateColor {
    Success,
    Warning,
    Danger,
    Secondary,
}

impl StateColor {
    /// Unknown colours render as `Secondary`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            _ => Self::Secondary,
        }
    }
}

// ---------------------------------------------------------------------------
// Control actions
// ---------------------------------------------------------------------------

/// Response body of every control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ActionReply {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Parameterless bot control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Pause,
    Resume,
    Shutdown,
    Restart,
    HealthCheck,
    ClearErrorStats,
}

impl BotAction {
    /// API path of the action, relative to the base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Pause => "/api/pause_bot",
            Self::Resume => "/api/resume_bot",
            Self::Shutdown => "/api/shutdown_bot",
            Self::Restart => "/api/restart_bot",
            Self::HealthCheck => "/api/run_health_check",
            Self::ClearErrorStats => "/api/clear_error_stats",
        }
    }

    /// Question asked before the action runs; `None` for actions that need
    /// no confirmation.
    pub fn confirmation(self) -> Option<&'static str> {
        match self {
            Self::Pause => Some(
                "Pause the bot? Scheduled tasks stop; manual commands still work.",
            ),
            Self::Resume => Some("Resume the bot? Scheduled tasks will run again."),
            Self::Shutdown => Some(
                "Shut the bot down? It stops completely and must be restarted by hand.",
            ),
            Self::Restart => Some("Restart the bot? This can take a few seconds."),
            Self::ClearErrorStats => Some("Clear all error statistics? This cannot be undone."),
            Self::HealthCheck => None,
        }
    }

    /// Short verb used in failure notices, e.g. "pause failed".
    pub fn verb(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
            Self::HealthCheck => "health check",
            Self::ClearErrorStats => "clear error stats",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
