/// Blocking HTTP client for the bot-monitoring web service.
///
/// Talks to the service's `/api/*` endpoints using the synchronous `ureq`
/// client. Provides:
///
/// - **Task history**: `GET /api/get_recent_tasks?limit=N`
/// - **Bot status**: `GET /api/get_bot_status`
/// - **Control actions**: `POST /api/{pause,resume,shutdown,restart}_bot`,
///   `/api/run_health_check`, `/api/clear_error_stats`
/// - **Manual summary**: `POST /api/trigger_summary` with a `channel` form field
///
/// Every exchange is a single request with no retry. Control endpoints
/// answer with `{"status": ..., "message": ...}` even on HTTP errors; such
/// bodies are returned as replies so the server's own message reaches the
/// user.
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::config::schema::ServerConfig;
use crate::history::{TaskRecord, TaskSource};

pub use types::{ActionReply, BotAction, BotState, BotStatus, Controls, StateColor};

/// Path of the recent-tasks endpoint.
pub const RECENT_TASKS_PATH: &str = "/api/get_recent_tasks";

/// Path of the bot status endpoint.
pub const BOT_STATUS_PATH: &str = "/api/get_bot_status";

/// Path of the manual summary trigger.
pub const TRIGGER_SUMMARY_PATH: &str = "/api/trigger_summary";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for one web service instance.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    base_url: String,
    agent: ureq::Agent,
}

impl DashboardClient {
    /// Build a client from the `[server]` config section.
    pub fn from_config(config: &ServerConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    /// Build a client for `base_url`. `None` keeps ureq's default timeouts.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the most recent task records, newest first.
    pub fn get_recent_tasks(&self, limit: usize) -> Result<Vec<TaskRecord>> {
        let url = self.url(RECENT_TASKS_PATH);
        tracing::debug!(%url, limit, "fetching recent tasks");

        let resp = self
            .agent
            .get(&url)
            .query("limit", &limit.to_string())
            .call()
            .context("recent tasks request failed")?;

        resp.into_json()
            .context("failed to parse recent tasks response")
    }

    /// Fetch the current bot status.
    ///
    /// A body with a non-success `status` is still returned; check
    /// [`BotStatus::is_success`].
    pub fn get_bot_status(&self) -> Result<BotStatus> {
        let url = self.url(BOT_STATUS_PATH);
        tracing::debug!(%url, "fetching bot status");
        read_body(self.agent.get(&url).call(), "bot status")
    }

    /// Run a parameterless control action.
    pub fn run_action(&self, action: BotAction) -> Result<ActionReply> {
        let url = self.url(action.endpoint());
        tracing::info!(%url, action = action.verb(), "sending control action");
        read_body(
            self.agent.post(&url).send_json(serde_json::json!({})),
            action.verb(),
        )
    }

    /// Ask the bot to generate a summary for `channel` right away.
    pub fn trigger_summary(&self, channel: &str) -> Result<ActionReply> {
        let url = self.url(TRIGGER_SUMMARY_PATH);
        tracing::info!(%url, channel, "triggering channel summary");
        read_body(
            self.agent.post(&url).send_form(&[("channel", channel)]),
            "trigger summary",
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl TaskSource for DashboardClient {
    fn recent_tasks(&self, limit: usize) -> Result<Vec<TaskRecord>> {
        self.get_recent_tasks(limit)
    }
}

/// Decode a JSON body from a finished request.
///
/// HTTP error statuses whose body still decodes as `T` are treated as
/// normal replies; anything else becomes an error naming `what`.
fn read_body<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
    what: &str,
) -> Result<T> {
    match result {
        Ok(resp) => resp
            .into_json()
            .with_context(|| format!("failed to parse {what} response")),
        Err(ureq::Error::Status(code, resp)) => match resp.into_json::<T>() {
            Ok(body) => {
                tracing::warn!(code, what, "server returned an error status with a body");
                Ok(body)
            }
            Err(_) => anyhow::bail!("{what} failed with HTTP {code}"),
        },
        Err(e) => Err(e).with_context(|| format!("{what} request failed")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
