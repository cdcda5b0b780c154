//! CLI command implementations for botdash.
//!
//! Provides subcommand handlers for:
//! - `botdash status` — bot status card
//! - `botdash pause|resume|shutdown|restart` — lifecycle controls
//! - `botdash health-check`, `botdash clear-errors` — maintenance actions
//! - `botdash trigger <channel>` — manual channel summary
//! - `botdash activity` — recent task timeline
//! - `botdash trend --window 7d|30d|90d` — per-day task counts
//! - `botdash watch` — auto-refreshing dashboard
//! - `botdash config show|init|set|reset` — configuration management

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;

use crate::api::BotAction;
use crate::config;
use crate::config::schema::BotdashConfig;
use crate::dashboard::{Dashboard, render};
use crate::history::{DayBucket, TrendWindow};
use crate::notify::Notice;

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// botdash status
// ---------------------------------------------------------------------------

/// Show the bot status card.
pub fn run_status(cfg: &BotdashConfig) -> Result<()> {
    let dashboard = Dashboard::from_config(cfg);
    print!("{}", dashboard.status_panel(&Local::now()));
    Ok(())
}

// ---------------------------------------------------------------------------
// botdash pause | resume | shutdown | restart | health-check | clear-errors
// ---------------------------------------------------------------------------

/// Run a control action, asking first unless `yes` is set.
pub fn run_action(cfg: &BotdashConfig, action: BotAction, yes: bool) -> Result<()> {
    if let Some(question) = action.confirmation()
        && !confirm(question, yes)?
    {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    let dashboard = Dashboard::from_config(cfg);

    if action == BotAction::HealthCheck {
        Notice::info("Running health check...").show();
    }

    let reply = match dashboard.client().run_action(action) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(action = action.verb(), error = %format!("{e:#}"), "control action failed");
            Notice::from_error(action.verb(), &e).show();
            anyhow::bail!("{} did not complete", action.verb());
        }
    };

    Notice::from_reply(&reply).show();
    if !reply.is_success() {
        anyhow::bail!("{} was rejected by the server", action.verb());
    }

    match action {
        BotAction::Pause | BotAction::Resume | BotAction::Shutdown => {
            println!();
            print!("{}", dashboard.status_panel(&Local::now()));
        }
        BotAction::Restart => {
            let delay = cfg.dashboard.restart_delay_secs;
            println!(
                "  {}",
                format!("Waiting {delay}s for the bot to come back...").dimmed()
            );
            thread::sleep(Duration::from_secs(delay));
            println!();
            print!("{}", dashboard.status_panel(&Local::now()));
        }
        BotAction::HealthCheck | BotAction::ClearErrorStats => {}
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// botdash trigger
// ---------------------------------------------------------------------------

/// Ask the bot to summarize `channel` now, then show recent activity.
///
/// Activity is shown whenever the server replied, even with a rejection.
pub fn run_trigger(cfg: &BotdashConfig, channel: &str, yes: bool) -> Result<()> {
    let channel = channel.trim();
    if channel.is_empty() {
        Notice::warning("Channel must not be empty.").show();
        return Ok(());
    }

    let question = format!("Generate a summary for '{channel}' now?");
    if !confirm(&question, yes)? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    let mut dashboard = Dashboard::from_config(cfg);
    let reply = match dashboard.client().trigger_summary(channel) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(channel, error = %format!("{e:#}"), "trigger summary failed");
            Notice::from_error("trigger summary", &e).show();
            anyhow::bail!("trigger summary did not complete");
        }
    };
    Notice::from_reply(&reply).show();

    // A rejected trigger may still have logged a run.
    println!();
    let limit = cfg.dashboard.activity_limit;
    print!("{}", dashboard.activity_panel(limit, &Local::now()));

    if !reply.is_success() {
        anyhow::bail!("trigger summary was rejected by the server");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// botdash activity
// ---------------------------------------------------------------------------

/// Show the recent-activity timeline.
pub fn run_activity(cfg: &BotdashConfig, limit: Option<usize>) -> Result<()> {
    let mut dashboard = Dashboard::from_config(cfg);
    let limit = limit.unwrap_or(cfg.dashboard.activity_limit);
    print!("{}", dashboard.activity_panel(limit, &Local::now()));
    Ok(())
}

// ---------------------------------------------------------------------------
// botdash trend
// ---------------------------------------------------------------------------

/// Show per-day task counts for a window.
pub fn run_trend(
    cfg: &BotdashConfig,
    window: Option<TrendWindow>,
    refresh: bool,
    format: OutputFormat,
) -> Result<()> {
    let window = window.unwrap_or(cfg.dashboard.default_window);
    let now = Local::now();
    let mut dashboard = Dashboard::from_config(cfg);

    let buckets = if refresh {
        dashboard
            .refresh_trend(window, &now)
            .context("failed to refresh task history")?
    } else {
        dashboard.load_trend(window, &now)
    };

    match format {
        OutputFormat::Json => print_trend_json(&buckets, window)?,
        OutputFormat::Csv => print_trend_csv(&buckets),
        OutputFormat::Table => {
            print!("{}", render::trend_chart(&buckets, window));
            if dashboard.history().records().is_empty() {
                println!(
                    "  {}",
                    "No task history yet. Is the server reachable?".yellow()
                );
            } else {
                println!(
                    "  {} {}",
                    "Records held:".dimmed(),
                    format_number(dashboard.history().records().len()).dimmed()
                );
            }
        }
    }

    Ok(())
}

fn print_trend_json(buckets: &[DayBucket], window: TrendWindow) -> Result<()> {
    let total: usize = buckets.iter().map(|b| b.count).sum();
    let value = serde_json::json!({
        "window": window,
        "days": window.days(),
        "total": total,
        "buckets": buckets,
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_trend_csv(buckets: &[DayBucket]) {
    println!("date,count");
    for b in buckets {
        println!("{},{}", b.date, b.count);
    }
}

// ---------------------------------------------------------------------------
// botdash watch
// ---------------------------------------------------------------------------

/// Run the auto-refreshing dashboard.
pub fn run_watch(cfg: &BotdashConfig, window: Option<TrendWindow>, cycles: Option<u64>) -> Result<()> {
    let window = window.unwrap_or(cfg.dashboard.default_window);
    let mut dashboard = Dashboard::from_config(cfg);
    dashboard.watch(window, cycles)
}

// ---------------------------------------------------------------------------
// botdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective botdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.botdash/config.toml", global_exists);
    print_source(".botdash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "BOTDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.botdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point botdash at your server.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Prompts and formatting helpers
// ---------------------------------------------------------------------------

/// Ask a yes/no question on the terminal. `assume_yes` skips the prompt.
fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let stdin = io::stdin();
    confirm_with(question, &mut stdin.lock(), &mut io::stdout())
}

/// Prompt on `output`, read one line from `input`. Only `y`/`yes` accept;
/// end of input declines.
fn confirm_with(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{} {} ", question.bold(), "[y/N]".dimmed())?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("failed to read confirmation")?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
