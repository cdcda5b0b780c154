/// Client and dashboard tests against an in-process mock web service.
///
/// Covers request shapes (paths, query, bodies), reply interpretation for
/// success and error statuses, and the dashboard refresh cycle end to end.
mod common;

use std::time::Duration;

use chrono::Utc;
use tiny_http::Method;

use botdash::api::{BotAction, BotState, DashboardClient};
use botdash::cli;
use botdash::config::BotdashConfig;
use botdash::config::schema::DashboardConfig;
use botdash::dashboard::Dashboard;
use botdash::history::{LoadOutcome, TaskHistory, TrendWindow};
use botdash::store::MemoryStore;

use common::MockServer;

const TASKS_JSON: &str = r#"[
    {"timestamp": "2025-01-15T10:00:00", "channel": "general", "task_type": "scheduled", "status": "success"},
    {"timestamp": "2025-01-15T09:00:00", "channel": "random", "task_type": "manual-trigger", "status": "failed"}
]"#;

const STATUS_JSON: &str = r#"{
    "status": "success",
    "state": "running",
    "state_name": "Running",
    "state_description": "Processing scheduled tasks",
    "state_icon": "play-circle",
    "state_color": "success",
    "timestamp": "2025-01-15T12:00:00"
}"#;

fn client(server: &MockServer) -> DashboardClient {
    DashboardClient::new(&server.base_url, Some(Duration::from_secs(5)))
}

fn memory_history() -> TaskHistory {
    TaskHistory::new(Box::new(MemoryStore::new()))
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

#[test]
fn recent_tasks_sends_limit() {
    let server = MockServer::fixed(200, TASKS_JSON);
    let tasks = client(&server).get_recent_tasks(5).unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].channel, "general");
    assert!(tasks[1].is_manual());
    assert!(tasks[1].is_failed());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path(), "/api/get_recent_tasks");
    assert!(requests[0].url.contains("limit=5"));
}

#[test]
fn bot_status_is_parsed() {
    let server = MockServer::fixed(200, STATUS_JSON);
    let status = client(&server).get_bot_status().unwrap();

    assert!(status.is_success());
    assert_eq!(status.bot_state(), BotState::Running);
    assert_eq!(status.state_name.as_deref(), Some("Running"));
    assert_eq!(server.requests()[0].path(), "/api/get_bot_status");
}

#[test]
fn control_action_posts_empty_json() {
    let server = MockServer::fixed(200, r#"{"status": "success", "message": "Bot paused"}"#);
    let reply = client(&server).run_action(BotAction::Pause).unwrap();

    assert!(reply.is_success());
    assert_eq!(reply.message, "Bot paused");

    let requests = server.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path(), "/api/pause_bot");
    assert_eq!(requests[0].body.trim(), "{}");
}

#[test]
fn every_action_hits_its_endpoint() {
    let server = MockServer::fixed(200, r#"{"status": "success", "message": "ok"}"#);
    let client = client(&server);
    let actions = [
        BotAction::Pause,
        BotAction::Resume,
        BotAction::Shutdown,
        BotAction::Restart,
        BotAction::HealthCheck,
        BotAction::ClearErrorStats,
    ];

    for action in actions {
        client.run_action(action).unwrap();
    }

    let paths: Vec<_> = server
        .requests()
        .iter()
        .map(|r| r.path().to_string())
        .collect();
    assert_eq!(
        paths,
        [
            "/api/pause_bot",
            "/api/resume_bot",
            "/api/shutdown_bot",
            "/api/restart_bot",
            "/api/run_health_check",
            "/api/clear_error_stats",
        ]
    );
}

#[test]
fn error_status_with_reply_body_is_a_reply() {
    let server = MockServer::fixed(500, r#"{"status": "error", "message": "bot not running"}"#);
    let reply = client(&server).run_action(BotAction::Resume).unwrap();

    assert!(!reply.is_success());
    assert_eq!(reply.message, "bot not running");
}

#[test]
fn error_status_without_reply_body_is_an_error() {
    let server = MockServer::fixed(502, "<html>bad gateway</html>");
    let err = client(&server).run_action(BotAction::Restart).unwrap_err();
    assert!(err.to_string().contains("HTTP 502"));
}

#[test]
fn trigger_summary_sends_channel_form_field() {
    let server = MockServer::fixed(200, r#"{"status": "success", "message": "Summary queued"}"#);
    let reply = client(&server).trigger_summary("general").unwrap();

    assert!(reply.is_success());
    let requests = server.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path(), "/api/trigger_summary");
    assert_eq!(requests[0].body, "channel=general");
}

// ---------------------------------------------------------------------------
// Task history over HTTP
// ---------------------------------------------------------------------------

#[test]
fn history_fetches_once_then_uses_cache() {
    let server = MockServer::fixed(200, TASKS_JSON);
    let client = client(&server);
    let mut history = memory_history();
    let now = Utc::now();

    let first = history.load(&client, now);
    assert!(matches!(first, LoadOutcome::Fetched { records: 2, .. }));

    let second = history.load(&client, now + chrono::Duration::minutes(5));
    assert_eq!(second, LoadOutcome::Cached { records: 2 });
    assert_eq!(server.count("/api/get_recent_tasks"), 1);
    assert!(server.requests()[0].url.contains("limit=200"));
}

#[test]
fn history_load_failure_leaves_empty_working_set() {
    let server = MockServer::fixed(500, "internal error");
    let client = client(&server);
    let mut history = memory_history();

    let outcome = history.load(&client, Utc::now());
    assert!(matches!(outcome, LoadOutcome::Failed { .. }));
    assert!(history.records().is_empty());

    let buckets = history.trend(TrendWindow::Week, &Utc::now());
    assert_eq!(buckets.len(), 7);
    assert!(buckets.iter().all(|b| b.count == 0));
}

#[test]
fn float_epoch_does_not_spoil_the_batch() {
    let server = MockServer::fixed(
        200,
        r#"[
            {"timestamp": "2025-01-15T09:00:00Z", "channel": "general", "task_type": "scheduled", "status": "success"},
            {"timestamp": 1736935200000.0, "channel": "random", "task_type": "scheduled", "status": "success"}
        ]"#,
    );
    let client = client(&server);
    let mut history = memory_history();
    let now = chrono::DateTime::from_timestamp(1_736_942_400, 0).unwrap();

    let outcome = history.load(&client, now);
    assert!(matches!(outcome, LoadOutcome::Fetched { records: 2, .. }));
    assert_eq!(history.trend(TrendWindow::Week, &now)[6].count, 2);
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn routed_server(tasks: String) -> MockServer {
    MockServer::start(move |_, path| match path {
        "/api/get_bot_status" => (200, STATUS_JSON.to_string()),
        "/api/get_recent_tasks" => (200, tasks.clone()),
        _ => (404, r#"{"status": "error", "message": "not found"}"#.to_string()),
    })
}

#[test]
fn refresh_cycle_renders_every_panel() {
    colored::control::set_override(false);

    let now = Utc::now();
    let recent = (now - chrono::Duration::minutes(1)).to_rfc3339();
    let tasks = format!(
        r#"[{{"timestamp": "{recent}", "channel": "general", "task_type": "scheduled", "status": "success"}}]"#
    );
    let server = routed_server(tasks);
    let mut dashboard = Dashboard::new(client(&server), memory_history(), DashboardConfig::default());

    let screen = dashboard.refresh_cycle(TrendWindow::Week, &now);

    assert!(screen.contains("Bot Status"));
    assert!(screen.contains("Running"));
    assert!(screen.contains("Recent Activity"));
    assert!(screen.contains("general"));
    assert!(screen.contains("Task Trend"));
    assert!(screen.contains("Total runs: 1"));
    assert!(server.requests()[1..].iter().any(|r| r.url.contains("limit=5")));
}

#[test]
fn activity_panel_feeds_history() {
    colored::control::set_override(false);

    let server = routed_server(TASKS_JSON.to_string());
    let mut dashboard = Dashboard::new(client(&server), memory_history(), DashboardConfig::default());

    let panel = dashboard.activity_panel(5, &Utc::now());
    assert!(panel.contains("general"));
    assert!(panel.contains("random"));
    assert_eq!(dashboard.history().records().len(), 2);
}

#[test]
fn unreachable_status_renders_error_card() {
    colored::control::set_override(false);

    let client = DashboardClient::new("http://127.0.0.1:9", Some(Duration::from_millis(500)));
    let dashboard = Dashboard::new(client, memory_history(), DashboardConfig::default());

    let card = dashboard.status_panel(&Utc::now());
    assert!(card.contains("Network error"));
}

// ---------------------------------------------------------------------------
// Trigger command
// ---------------------------------------------------------------------------

fn trigger_server(reply: &'static str) -> MockServer {
    MockServer::start(move |_, path| match path {
        "/api/trigger_summary" => (200, reply.to_string()),
        "/api/get_recent_tasks" => (200, TASKS_JSON.to_string()),
        _ => (404, r#"{"status": "error", "message": "not found"}"#.to_string()),
    })
}

fn cli_config(server: &MockServer, dir: &tempfile::TempDir) -> BotdashConfig {
    let mut cfg = BotdashConfig::default();
    cfg.server.base_url = server.base_url.clone();
    cfg.cache.storage_path = Some(dir.path().join("storage.json"));
    cfg
}

#[test]
fn rejected_trigger_still_refreshes_activity() {
    colored::control::set_override(false);

    let server = trigger_server(r#"{"status": "error", "message": "channel not found"}"#);
    let dir = tempfile::tempdir().unwrap();

    let result = cli::run_trigger(&cli_config(&server, &dir), "general", true);

    assert!(result.is_err());
    assert_eq!(server.count("/api/trigger_summary"), 1);
    assert_eq!(server.count("/api/get_recent_tasks"), 1);
}

#[test]
fn accepted_trigger_refreshes_activity() {
    colored::control::set_override(false);

    let server = trigger_server(r#"{"status": "success", "message": "Summary queued"}"#);
    let dir = tempfile::tempdir().unwrap();

    cli::run_trigger(&cli_config(&server, &dir), "general", true).unwrap();
    assert_eq!(server.count("/api/get_recent_tasks"), 1);
}
