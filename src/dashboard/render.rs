//! Text rendering for the dashboard panels.
//!
//! Every function returns a `String` so panels can be composed into one
//! screen and checked in tests. Times are shown in the timezone of the
//! `now` passed in.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use colored::{ColoredString, Colorize};

use crate::api::{BotStatus, StateColor};
use crate::history::{DayBucket, TaskRecord, TaskTimestamp, TrendWindow};

/// Width of the longest bar in the trend chart.
const CHART_WIDTH: usize = 40;

/// Channel names longer than this are cut in the activity timeline.
const CHANNEL_DISPLAY_CHARS: usize = 30;

const RULE_WIDTH: usize = 50;

// ---------------------------------------------------------------------------
// Status card
// ---------------------------------------------------------------------------

/// Render the bot status card.
///
/// A non-success body is shown as a failure card with the server's message.
pub fn status_card<Tz: TimeZone>(status: &BotStatus, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = header("Bot Status");

    if !status.is_success() {
        let message = status.message.as_deref().unwrap_or("unknown error");
        let _ = writeln!(
            out,
            "  {} {}",
            "✗".red().bold(),
            format!("Failed to get status: {message}").red()
        );
        return out;
    }

    let state = status.bot_state();
    let name = status
        .state_name
        .clone()
        .unwrap_or_else(|| state.to_string());

    let _ = writeln!(out, "  {} {}", paint("●", status.color()), name.bold());
    if let Some(description) = &status.state_description {
        let _ = writeln!(out, "  {}", description.dimmed());
    }
    if let Some(updated) = status
        .timestamp
        .as_ref()
        .and_then(|ts| ts.to_datetime(&now.timezone()))
    {
        let _ = writeln!(
            out,
            "  {}",
            format!(
                "Updated {} ({})",
                updated.format("%H:%M:%S"),
                format_relative_time(&updated, now)
            )
            .dimmed()
        );
    }

    let controls = state.controls();
    let _ = writeln!(
        out,
        "  {} {}  {}  {}",
        "Controls:".bold(),
        control_flag("pause", controls.pause),
        control_flag("resume", controls.resume),
        control_flag("shutdown", controls.shutdown),
    );

    out
}

/// Render the card shown when the status request itself failed.
pub fn status_error_card(error: &anyhow::Error) -> String {
    let mut out = header("Bot Status");
    let _ = writeln!(
        out,
        "  {} {}",
        "✗".red().bold(),
        format!("Network error: {error:#}").red()
    );
    out
}

fn control_flag(name: &str, enabled: bool) -> ColoredString {
    if enabled {
        format!("{name} ✓").green()
    } else {
        format!("{name} ✗").dimmed()
    }
}

fn paint(text: &str, color: StateColor) -> ColoredString {
    match color {
        StateColor::Success => text.green(),
        StateColor::Warning => text.yellow(),
        StateColor::Danger => text.red(),
        StateColor::Secondary => text.bright_black(),
    }
}

// ---------------------------------------------------------------------------
// Trend chart
// ---------------------------------------------------------------------------

/// Render per-day task counts as a horizontal bar chart.
pub fn trend_chart(buckets: &[DayBucket], window: TrendWindow) -> String {
    let mut out = header(&format!("Task Trend — {}", window.label()));

    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let total: usize = buckets.iter().map(|b| b.count).sum();

    for bucket in buckets {
        let bar = "█".repeat(bar_width(bucket.count, max));
        let line = format!("  {:<7} {:>4} {}", bucket.label(), bucket.count, bar.cyan());
        if bucket.count == 0 {
            let _ = writeln!(out, "{}", line.dimmed());
        } else {
            let _ = writeln!(out, "{line}");
        }
    }

    let _ = writeln!(out, "  {}", "-".repeat(RULE_WIDTH - 2));
    let _ = writeln!(out, "  {} {}", "Total runs:".bold(), total);
    out
}

/// Scale `count` to the chart width; any non-zero count gets at least one
/// cell.
fn bar_width(count: usize, max: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    (count * CHART_WIDTH / max).max(1)
}

// ---------------------------------------------------------------------------
// Activity timeline
// ---------------------------------------------------------------------------

/// Render recent task runs, oldest first.
///
/// `tasks` is in server order (newest first).
pub fn activity_timeline<Tz: TimeZone>(tasks: &[TaskRecord], now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = header("Recent Activity");

    if tasks.is_empty() {
        let _ = writeln!(out, "  {}", "No recent activity".dimmed());
        return out;
    }

    let tz = now.timezone();
    for task in tasks.iter().rev() {
        let when = format_timestamp(&task.timestamp, &tz, "%m-%d %H:%M:%S")
            .unwrap_or_else(|| task.timestamp.to_string());
        let _ = writeln!(
            out,
            "  {}  {} {}",
            when.dimmed(),
            task_icon(task),
            truncate_chars(&task.channel, CHANNEL_DISPLAY_CHARS).bold()
        );
        let _ = writeln!(
            out,
            "  {}  {}",
            " ".repeat(14),
            format!("{} - {}", task.task_type, task.status).dimmed()
        );
    }

    out
}

fn task_icon(task: &TaskRecord) -> ColoredString {
    if task.is_manual() {
        "▶".green()
    } else if task.is_scheduled() {
        "◷".cyan()
    } else if task.is_failed() {
        "✗".red()
    } else {
        "ℹ".blue()
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn header(title: &str) -> String {
    format!("{}\n{}\n", title.bold().cyan(), "=".repeat(RULE_WIDTH))
}

/// Format a task timestamp in `tz` with a `strftime` pattern.
pub fn format_timestamp<Tz: TimeZone>(ts: &TaskTimestamp, tz: &Tz, pattern: &str) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    ts.to_datetime(tz).map(|dt| dt.format(pattern).to_string())
}

/// Describe how long ago `then` was, relative to `now`.
pub fn format_relative_time<Tz: TimeZone>(then: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let elapsed = now.clone().signed_duration_since(then.clone());
    let seconds = elapsed.num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours} h ago")
    } else if days < 7 {
        format!("{days} d ago")
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

/// Truncate to `max_chars` characters, appending `...` if anything was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_736_942_400, 0).unwrap()
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("short", 30), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("频道频道频道", 2), "频道...");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn bar_width_scales() {
        assert_eq!(bar_width(0, 10), 0);
        assert_eq!(bar_width(10, 10), CHART_WIDTH);
        assert_eq!(bar_width(5, 10), CHART_WIDTH / 2);
        assert_eq!(bar_width(1, 1000), 1);
    }

    #[test]
    fn relative_time_buckets() {
        let n = now();
        assert_eq!(format_relative_time(&(n - Duration::seconds(10)), &n), "just now");
        assert_eq!(format_relative_time(&(n - Duration::minutes(5)), &n), "5 min ago");
        assert_eq!(format_relative_time(&(n - Duration::hours(3)), &n), "3 h ago");
        assert_eq!(format_relative_time(&(n - Duration::days(2)), &n), "2 d ago");
        assert_eq!(format_relative_time(&(n - Duration::days(30)), &n), "2024-12-16");
    }

    #[test]
    fn format_timestamp_in_timezone() {
        let ts = TaskTimestamp::from("2025-01-15T08:05:09Z");
        assert_eq!(
            format_timestamp(&ts, &Utc, "%m-%d %H:%M:%S").as_deref(),
            Some("01-15 08:05:09")
        );
        assert_eq!(format_timestamp(&TaskTimestamp::from("??"), &Utc, "%H"), None);
    }

    #[test]
    fn trend_chart_lists_every_day() {
        let buckets: Vec<_> = (0..7)
            .map(|i| DayBucket {
                date: NaiveDate::from_ymd_opt(2025, 1, 9 + i).unwrap(),
                count: i as usize,
            })
            .collect();
        let chart = trend_chart(&buckets, TrendWindow::Week);

        assert!(chart.contains("last 7 days"));
        assert!(chart.contains("Jan 9"));
        assert!(chart.contains("Jan 15"));
        assert!(chart.contains("21"));
    }

    #[test]
    fn empty_activity_says_so() {
        assert!(activity_timeline(&[], &now()).contains("No recent activity"));
    }

    #[test]
    fn activity_is_oldest_first_and_truncated() {
        let long_channel = "c".repeat(40);
        let tasks = vec![
            TaskRecord::new("2025-01-15T10:00:00Z", "newest", "scheduled", "success"),
            TaskRecord::new("2025-01-15T09:00:00Z", long_channel.as_str(), "manual-trigger", "success"),
        ];
        let rendered = activity_timeline(&tasks, &now());

        let newest = rendered.find("newest").unwrap();
        let older = rendered.find(&"c".repeat(30)).unwrap();
        assert!(older < newest);
        assert!(rendered.contains(&format!("{}...", "c".repeat(30))));
        assert!(!rendered.contains(&"c".repeat(31)));
        assert!(rendered.contains("01-15 09:00:00"));
    }

    #[test]
    fn status_card_shows_state_and_controls() {
        let status = BotStatus {
            status: "success".to_string(),
            state: Some("running".to_string()),
            state_name: Some("Running".to_string()),
            state_description: Some("Processing scheduled tasks".to_string()),
            state_color: Some("success".to_string()),
            timestamp: Some(TaskTimestamp::from("2025-01-15T11:59:00Z")),
            ..BotStatus::default()
        };
        let card = status_card(&status, &now());

        assert!(card.contains("Running"));
        assert!(card.contains("Processing scheduled tasks"));
        assert!(card.contains("Updated 11:59:00 (1 min ago)"));
        assert!(card.contains("resume ✗"));
        assert!(card.contains("pause ✓"));
    }

    #[test]
    fn status_card_failure() {
        let status = BotStatus {
            status: "error".to_string(),
            message: Some("bot offline".to_string()),
            ..BotStatus::default()
        };
        assert!(status_card(&status, &now()).contains("Failed to get status: bot offline"));
    }

    #[test]
    fn status_error_card_shows_cause() {
        let error = anyhow::anyhow!("connection refused");
        assert!(status_error_card(&error).contains("Network error: connection refused"));
    }
}
