//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::regrid::jurisdiction::{BoundsEntry, BoundsTable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Map viewer root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Wait after loading the jurisdiction map view (ms)
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,

    /// Wait for autocomplete suggestions after typing (ms)
    #[serde(default = "default_suggestion_wait_ms")]
    pub suggestion_wait_ms: u64,

    /// Wait after selecting a suggestion (ms)
    #[serde(default = "default_panel_settle_ms")]
    pub panel_settle_ms: u64,

    /// Panel readiness polls per attempt
    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    /// Wait before each readiness poll (ms)
    #[serde(default = "default_readiness_interval_ms")]
    pub readiness_interval_ms: u64,

    /// Panel counts as ready above this many field entries
    #[serde(default = "default_readiness_min_entries")]
    pub readiness_min_entries: usize,

    /// Extra or replacement jurisdiction bounding boxes
    #[serde(default)]
    pub bounds: Vec<BoundsEntry>,
}

fn default_base_url() -> String {
    "https://app.regrid.com".to_string()
}

fn default_navigation_settle_ms() -> u64 {
    3000
}

fn default_suggestion_wait_ms() -> u64 {
    2000
}

fn default_panel_settle_ms() -> u64 {
    3000
}

fn default_readiness_attempts() -> u32 {
    5
}

fn default_readiness_interval_ms() -> u64 {
    1000
}

fn default_readiness_min_entries() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            format: OutputFormat::Table,
            navigation_settle_ms: default_navigation_settle_ms(),
            suggestion_wait_ms: default_suggestion_wait_ms(),
            panel_settle_ms: default_panel_settle_ms(),
            readiness_attempts: default_readiness_attempts(),
            readiness_interval_ms: default_readiness_interval_ms(),
            readiness_min_entries: default_readiness_min_entries(),
            bounds: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("parcel-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("REGRID_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }

        if let Ok(format) = std::env::var("REGRID_FORMAT") {
            if let Ok(f) = format.parse() {
                self.format = f;
            }
        }

        if let Ok(attempts) = std::env::var("REGRID_READINESS_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.readiness_attempts = n;
            }
        }

        self
    }

    /// Built-in bounding boxes with the configured entries layered on top.
    pub fn bounds_table(&self) -> BoundsTable {
        BoundsTable::with_overrides(&self.bounds)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
