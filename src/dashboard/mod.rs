//! The dashboard session: one client, one task history, and the panels
//! built from them.
//!
//! A refresh cycle loads the task history (cache or fetch), pulls the most
//! recent activity, folds it into the history, and renders the status card,
//! the activity timeline and the trend chart. `watch` repeats the cycle on a
//! fixed interval.

pub mod render;

use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use colored::Colorize;

use crate::api::DashboardClient;
use crate::config::schema::{BotdashConfig, DashboardConfig};
use crate::history::{DayBucket, LoadOutcome, TaskHistory, TrendWindow};

pub struct Dashboard {
    client: DashboardClient,
    history: TaskHistory,
    settings: DashboardConfig,
}

impl Dashboard {
    pub fn new(client: DashboardClient, history: TaskHistory, settings: DashboardConfig) -> Self {
        Self {
            client,
            history,
            settings,
        }
    }

    pub fn from_config(config: &BotdashConfig) -> Self {
        Self::new(
            DashboardClient::from_config(&config.server),
            TaskHistory::from_config(&config.cache),
            config.dashboard.clone(),
        )
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }

    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    pub fn settings(&self) -> &DashboardConfig {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Panels
    // -----------------------------------------------------------------------

    /// Fetch the bot status and render it. Request failures render as an
    /// error card.
    pub fn status_panel<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        match self.client.get_bot_status() {
            Ok(status) => render::status_card(&status, now),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to fetch bot status");
                render::status_error_card(&e)
            }
        }
    }

    /// Fetch the latest `limit` task runs, fold them into the history and
    /// render the timeline.
    pub fn activity_panel<Tz: TimeZone>(&mut self, limit: usize, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        match self.client.get_recent_tasks(limit) {
            Ok(tasks) => {
                self.history.absorb(&tasks, now.with_timezone(&Utc));
                render::activity_timeline(&tasks, now)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to load recent activity");
                let mut out = render::activity_timeline(&[], now);
                out.push_str(&format!(
                    "  {}\n",
                    format!("Failed to load recent activity: {e:#}").red()
                ));
                out
            }
        }
    }

    /// Load the history and bucket it for `window`.
    pub fn load_trend<Tz: TimeZone>(&mut self, window: TrendWindow, now: &DateTime<Tz>) -> Vec<DayBucket> {
        let outcome = self.history.load(&self.client, now.with_timezone(&Utc));
        tracing::debug!(?outcome, "task history loaded");
        self.history.trend(window, now)
    }

    /// Refetch the history regardless of cache age, then bucket it.
    pub fn refresh_trend<Tz: TimeZone>(
        &mut self,
        window: TrendWindow,
        now: &DateTime<Tz>,
    ) -> Result<Vec<DayBucket>> {
        let utc = now.with_timezone(&Utc);
        // Seed the working set from the cache so the refetch merges into it.
        match self.history.load(&self.client, utc) {
            LoadOutcome::Fetched { .. } => {}
            LoadOutcome::Cached { .. } | LoadOutcome::Failed { .. } => {
                self.history.force_refresh(&self.client, utc)?;
            }
        }
        Ok(self.history.trend(window, now))
    }

    /// One full dashboard screen.
    pub fn refresh_cycle<Tz: TimeZone>(&mut self, window: TrendWindow, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        // History first: absorbing activity into an expired cache would
        // otherwise stamp a near-empty entry as fresh.
        let outcome = self.history.load(&self.client, now.with_timezone(&Utc));
        let status = self.status_panel(now);
        let activity = self.activity_panel(self.settings.activity_limit, now);
        let buckets = self.history.trend(window, now);

        let mut screen = String::new();
        screen.push_str(&status);
        screen.push('\n');
        screen.push_str(&activity);
        screen.push('\n');
        screen.push_str(&render::trend_chart(&buckets, window));
        if let LoadOutcome::Failed { .. } = outcome {
            screen.push_str(&format!(
                "  {}\n",
                "Task history unavailable; showing empty trend.".yellow()
            ));
        }
        screen
    }

    // -----------------------------------------------------------------------
    // Watch loop
    // -----------------------------------------------------------------------

    /// Redraw the dashboard every `refresh_secs`, forever or for `cycles`
    /// iterations.
    pub fn watch(&mut self, window: TrendWindow, cycles: Option<u64>) -> Result<()> {
        let interval = Duration::from_secs(self.settings.refresh_secs.max(1));
        let interactive = std::io::stdout().is_terminal();
        let mut completed: u64 = 0;

        loop {
            let now = Local::now();
            let screen = self.refresh_cycle(window, &now);

            let mut stdout = std::io::stdout().lock();
            if interactive {
                // Clear screen, cursor home.
                write!(stdout, "\x1B[2J\x1B[H")?;
            }
            write!(stdout, "{screen}")?;
            writeln!(
                stdout,
                "\n  {}",
                format!(
                    "Updated {} · every {}s · {} · Ctrl-C to quit",
                    now.format("%H:%M:%S"),
                    interval.as_secs(),
                    self.client.base_url()
                )
                .dimmed()
            )?;
            stdout.flush()?;
            drop(stdout);

            completed += 1;
            tracing::debug!(cycle = completed, "dashboard refreshed");
            if cycles.is_some_and(|max| completed >= max) {
                return Ok(());
            }
            thread::sleep(interval);
        }
    }
}
