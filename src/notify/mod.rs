//! Toast-style notifications for the terminal.
//!
//! A [`Notice`] is a one-line, colour-coded message: the terminal stand-in
//! for the web dashboard's pop-up toasts. User-initiated actions report
//! through notices; background failures go to the diagnostic log instead.

use std::fmt;

use colored::{ColoredString, Colorize};

use crate::api::ActionReply;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Danger,
    Warning,
    Info,
}

impl Level {
    /// Map a level name; unknown names fall back to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "danger" | "error" => Self::Danger,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    fn icon(self) -> ColoredString {
        match self {
            Self::Success => "✓".green().bold(),
            Self::Danger => "✗".red().bold(),
            Self::Warning => "!".yellow().bold(),
            Self::Info => "i".cyan().bold(),
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Level::Danger, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// Success or danger depending on the reply's `status`, carrying the
    /// server's message.
    pub fn from_reply(reply: &ActionReply) -> Self {
        let level = if reply.is_success() {
            Level::Success
        } else {
            Level::Danger
        };
        let message = if reply.message.is_empty() {
            format!("server answered '{}'", reply.status)
        } else {
            reply.message.clone()
        };
        Self::new(level, message)
    }

    /// Danger notice for a request that never produced a reply.
    pub fn from_error(verb: &str, error: &anyhow::Error) -> Self {
        Self::danger(format!("{verb} failed: {error:#}"))
    }

    /// Print the notice to stdout.
    pub fn show(&self) {
        println!("{self}");
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.level {
            Level::Success => self.message.normal(),
            Level::Danger => self.message.red(),
            Level::Warning => self.message.yellow(),
            Level::Info => self.message.normal(),
        };
        write!(f, "  {} {}", self.level.icon(), message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
