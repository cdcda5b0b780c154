use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use botdash::api::BotAction;
use botdash::cli;
use botdash::config::{self, BotdashConfig};
use botdash::history::TrendWindow;

#[derive(Debug, Parser)]
#[command(name = "botdash")]
#[command(about = "Terminal dashboard for the summary bot's web service")]
struct App {
    /// Override the web service base URL for this invocation
    #[arg(long, global = true)]
    url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the bot status card
    Status,
    /// Pause scheduled tasks
    Pause {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Resume scheduled tasks
    Resume {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Shut the bot down
    Shutdown {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Restart the bot and show its status afterwards
    Restart {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Ask the bot to run its health check
    HealthCheck,
    /// Clear the bot's error statistics
    ClearErrors {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Generate a summary for a channel right away
    Trigger {
        /// Channel to summarize
        channel: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the most recent task runs
    Activity {
        /// Number of runs to show (default: dashboard.activity_limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show per-day task counts
    Trend {
        /// Window: 7d, 30d or 90d (default: dashboard.default_window)
        #[arg(long)]
        window: Option<TrendWindow>,
        /// Refetch the task history even if the cache is fresh
        #[arg(long)]
        refresh: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Auto-refreshing dashboard
    Watch {
        /// Trend window: 7d, 30d or 90d (default: dashboard.default_window)
        #[arg(long)]
        window: Option<TrendWindow>,
        /// Stop after N refresh cycles
        #[arg(long)]
        cycles: Option<u64>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.botdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `server.base_url http://bot:5000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    let (mut cfg, warnings) = config::load_deferred();
    if let Some(url) = app.url {
        cfg.server.base_url = url;
    }
    init_tracing(&cfg);
    for warning in &warnings {
        warning.emit();
    }

    match app.command {
        Commands::Status => cli::run_status(&cfg),
        Commands::Pause { yes } => cli::run_action(&cfg, BotAction::Pause, yes),
        Commands::Resume { yes } => cli::run_action(&cfg, BotAction::Resume, yes),
        Commands::Shutdown { yes } => cli::run_action(&cfg, BotAction::Shutdown, yes),
        Commands::Restart { yes } => cli::run_action(&cfg, BotAction::Restart, yes),
        Commands::HealthCheck => cli::run_action(&cfg, BotAction::HealthCheck, true),
        Commands::ClearErrors { yes } => cli::run_action(&cfg, BotAction::ClearErrorStats, yes),
        Commands::Trigger { channel, yes } => cli::run_trigger(&cfg, &channel, yes),
        Commands::Activity { limit } => cli::run_activity(&cfg, limit),
        Commands::Trend {
            window,
            refresh,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_trend(&cfg, window, refresh, fmt)
        }
        Commands::Watch { window, cycles } => cli::run_watch(&cfg, window, cycles),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

/// Diagnostics go to stderr and are off unless `RUST_LOG` or
/// `logging.level` asks for them. Invalid filters fall back to off.
fn init_tracing(cfg: &BotdashConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .into_iter()
        .chain(std::iter::once(cfg.logging.level.clone()))
        .find_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
