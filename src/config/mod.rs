/// Configuration system for botdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::BotdashConfig::default()`]
/// 2. **User global config** — `~/.botdash/config.toml`
/// 3. **Project local config** — `.botdash.toml` in the current working directory
/// 4. **Environment variables** — `BOTDASH_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the field level. Keys missing from
/// a TOML file keep the previous layer's values.
///
/// # Usage
///
/// ```rust,ignore
/// use botdash::config;
///
/// let cfg = config::load();
/// let client = DashboardClient::from_config(&cfg.server);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::BotdashConfig;

use crate::history::TrendWindow;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved botdash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Problems with config files are logged right away.
pub fn load() -> BotdashConfig {
    let (config, warnings) = load_deferred();
    for warning in &warnings {
        warning.emit();
    }
    config
}

/// Like [`load`], but returns the config-file problems instead of logging
/// them, for callers that install the log subscriber from the config.
pub fn load_deferred() -> (BotdashConfig, Vec<ConfigWarning>) {
    let paths: Vec<PathBuf> = [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
        .collect();
    load_layers(&paths, |key| std::env::var(key).ok())
}

/// A config file that was skipped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub path: PathBuf,
    pub message: &'static str,
    pub error: String,
}

impl ConfigWarning {
    pub fn emit(&self) {
        tracing::warn!(path = %self.path.display(), error = %self.error, "{}", self.message);
    }
}

/// Overlay each TOML file in `paths` onto the defaults, then apply env
/// overrides. Unreadable files are skipped silently; malformed ones are
/// skipped with a warning.
fn load_layers(
    paths: &[PathBuf],
    lookup: impl Fn(&str) -> Option<String>,
) -> (BotdashConfig, Vec<ConfigWarning>) {
    let mut config = BotdashConfig::default();
    let mut warnings = Vec::new();

    for path in paths {
        let layer = match read_toml_file(path) {
            Ok(Some(layer)) => layer,
            Ok(None) => continue,
            Err(e) => {
                warnings.push(ConfigWarning {
                    path: path.clone(),
                    message: "ignoring malformed config file",
                    error: e.to_string(),
                });
                continue;
            }
        };
        match merge_config(&config, layer) {
            Ok(merged) => config = merged,
            Err(e) => warnings.push(ConfigWarning {
                path: path.clone(),
                message: "ignoring config layer that does not match the schema",
                error: e.to_string(),
            }),
        }
    }

    apply_env_overrides(&mut config, lookup);
    (config, warnings)
}

/// Read a TOML config file as an untyped table.
///
/// Returns `Ok(None)` if the file doesn't exist or can't be read.
fn read_toml_file(path: &Path) -> Result<Option<toml::Value>, toml::de::Error> {
    let Ok(content) = fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str(&content).map(Some)
}

/// Overlay the keys present in `overlay` onto `base`.
///
/// Fails if the merged table no longer matches the schema (e.g. a bad enum
/// value in the overlay).
fn merge_config(base: &BotdashConfig, overlay: toml::Value) -> Result<BotdashConfig> {
    let mut merged = toml::Value::try_from(base).context("failed to serialize config")?;
    merge_values(&mut merged, overlay);
    Ok(merged.try_into()?)
}

/// Recursively merge `overlay` into `base`; tables merge, everything else
/// replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.botdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".botdash").join("config.toml"))
}

/// Path to the project local config: `.botdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".botdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `BOTDASH_URL` — web service base URL
/// - `BOTDASH_TIMEOUT_MS` — HTTP request timeout
/// - `BOTDASH_CACHE_TTL_MINUTES` — task-history cache lifetime
/// - `BOTDASH_REFRESH_SECS` — watch refresh interval
/// - `BOTDASH_WINDOW` — default trend window (`7d`, `30d`, `90d`)
/// - `BOTDASH_LOG` — logging filter directive
///
/// `lookup` is `std::env::var` in production; tests pass a closure.
fn apply_env_overrides(config: &mut BotdashConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("BOTDASH_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Some(val) = lookup("BOTDASH_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Some(val) = lookup("BOTDASH_CACHE_TTL_MINUTES")
        && let Ok(minutes) = val.trim().parse::<u64>()
    {
        config.cache.ttl_minutes = minutes;
    }
    if let Some(val) = lookup("BOTDASH_REFRESH_SECS")
        && let Ok(secs) = val.trim().parse::<u64>()
    {
        config.dashboard.refresh_secs = secs;
    }
    if let Some(val) = lookup("BOTDASH_WINDOW")
        && let Ok(window) = val.parse::<TrendWindow>()
    {
        config.dashboard.default_window = window;
    }
    if let Some(val) = lookup("BOTDASH_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.botdash/config.toml`.
///
/// Creates the `~/.botdash/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.botdash/ directory")?;
    }

    fs::write(&path, BotdashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `server.base_url`.
/// The result must still match the schema.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(BotdashConfig::default())
            .context("failed to serialize default config")?
    };

    // Seed missing sections from the defaults so any schema key can be set.
    let defaults =
        toml::Value::try_from(BotdashConfig::default()).context("failed to serialize defaults")?;
    let mut seeded = defaults;
    merge_values(&mut seeded, root.clone());
    set_toml_value(&mut seeded, key, value)?;

    let _: BotdashConfig = seeded
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    // Only write back what was in the file plus the changed key.
    let leaf = seeded_leaf(&seeded, key)?;
    insert_dotted(&mut root, key, leaf)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the value it replaces; unknown leaves
/// are stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Table(_)) => {
            anyhow::bail!("'{key}' is a section, not a value")
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Read the value at a dotted key.
fn seeded_leaf(root: &toml::Value, key: &str) -> Result<toml::Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("config key not found: '{key}'"))?;
    }
    Ok(current.clone())
}

/// Insert `value` at a dotted key, creating intermediate tables.
fn insert_dotted(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected table on the way to '{key}'"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table on the way to '{key}'"))?;
    table.insert(parts[parts.len() - 1].to_string(), value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
