//! Configuration for tackboard.
//!
//! Layered: TOML file → environment → CLI flags (applied by the command
//! handlers). The file is `tackboard.toml` in the working directory unless
//! `--config` names another one; a missing default file means defaults.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! static_dir = "frontend/dist"
//! dev_mode = false
//!
//! [database]
//! path = "data/board.db"
//!
//! [ordering]
//! strict_reorder = false
//!
//! [client]
//! base_url = "http://127.0.0.1:3000"
//! poll_interval_secs = 5
//! timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! # dir = "logs"   (optional; when unset no log file is written)
//! json = false
//! ```
//!
//! Environment overrides: `PORT`, `DATA_PATH`, `TACKBOARD_HOST`,
//! `TACKBOARD_STATIC_DIR` (empty disables static serving), `TACKBOARD_URL`,
//! `TACKBOARD_STRICT_REORDER`, `TACKBOARD_LOG`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::board::server::ServerConfig;

pub const DEFAULT_CONFIG_FILE: &str = "tackboard.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub ordering: OrderingSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prebuilt frontend directory. `None` serves the API only.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
    /// Adds permissive CORS for a frontend dev server on another origin.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("frontend/dist"))
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/board.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderingSection {
    /// Fail a whole reorder batch when any entry names a missing row,
    /// instead of skipping that entry.
    #[serde(default)]
    pub strict_reorder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for tackboard's own targets; `RUST_LOG` replaces the whole filter.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rolling JSON log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Emit console logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            json: false,
        }
    }
}

impl BoardConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse tackboard.toml")
    }

    /// Resolve file and environment layers.
    ///
    /// An explicit path must exist; otherwise `tackboard.toml` in the working
    /// directory is used when present.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value '{}'", port))?;
        }
        if let Some(path) = lookup("DATA_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(host) = lookup("TACKBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(dir) = lookup("TACKBOARD_STATIC_DIR") {
            self.server.static_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(url) = lookup("TACKBOARD_URL") {
            self.client.base_url = url;
        }
        if let Some(strict) = lookup("TACKBOARD_STRICT_REORDER") {
            self.ordering.strict_reorder = parse_bool(&strict)
                .with_context(|| "Invalid TACKBOARD_STRICT_REORDER value".to_string())?;
        }
        if let Some(level) = lookup("TACKBOARD_LOG") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            warnings.push(format!(
                "Unknown log level '{}': expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        if self.client.poll_interval_secs == 0 {
            warnings.push("client.poll_interval_secs is 0; using 1 second".to_string());
        }
        if self.client.timeout_secs == 0 {
            warnings.push("client.timeout_secs is 0; using 1 second".to_string());
        }
        if let Some(ref dir) = self.server.static_dir
            && !dir.is_dir()
        {
            warnings.push(format!(
                "Static directory {} does not exist; only the API will be served",
                dir.display()
            ));
        }

        warnings
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            db_path: self.database.path.clone(),
            static_dir: self.server.static_dir.clone(),
            dev_mode: self.server.dev_mode,
            strict_reorder: self.ordering.strict_reorder,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got '{}'", other),
    }
}
