//! # Engine Configuration Module
//!
//! Runtime configuration for the routing engine: which resolution algorithm runs,
//! how the resolution cache behaves, and how logs are rendered.
//!
//! Configuration is layered:
//!
//! 1. Built-in defaults ([`EngineConfig::default`])
//! 2. An optional TOML or YAML file ([`EngineConfig::load`])
//! 3. Environment overrides ([`EngineConfig::with_env_overrides`])
//!
//! ## Environment Variables
//!
//! | Variable | Field | Example |
//! |---|---|---|
//! | `ROUTEWEAVE_SERVER_ID` | `server_id` | `edge-1` |
//! | `ROUTEWEAVE_ALGORITHM` | `algorithm` | `linear` / `subset` |
//! | `ROUTEWEAVE_CACHE` | `cache.enabled` | `on` / `off` |
//! | `ROUTEWEAVE_CACHE_TIMEOUT_MS` | `cache.read_timeout_ms` | `25` |
//! | `ROUTEWEAVE_CACHE_CAPACITY` | `cache.capacity` | `4096` |
//! | `ROUTEWEAVE_LOG_FORMAT` | `log.format` | `pretty` |
//!
//! Unparsable values leave the current setting untouched.
//!
//! ## Example File
//!
//! ```toml
//! server_id = "edge-1"
//! algorithm = "linear"
//!
//! [cache]
//! enabled = true
//! read_timeout_ms = 25
//!
//! [log]
//! format = "pretty"
//! level = "debug"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::logging::{LogConfig, LogFormat};

/// Route resolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Exhaustive scan of every route, simple and fine for small tables
    Linear,
    /// Walks the layered storage index, for large tables
    #[default]
    Subset,
}

impl Algorithm {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(Algorithm::Linear),
            "subset" | "indexed" => Some(Algorithm::Subset),
            _ => None,
        }
    }
}

/// Resolution cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Upper bound for a cache read; a slower backend counts as a miss
    pub read_timeout_ms: u64,
    /// Entry capacity of the built-in in-memory backend
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_timeout_ms: 50,
            capacity: 1024,
        }
    }
}

impl CacheConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifies this server instance in shared cache keys
    pub server_id: String,
    pub algorithm: Algorithm,
    pub cache: CacheConfig,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_id: "default".to_string(),
            algorithm: Algorithm::default(),
            cache: CacheConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse TOML engine config")
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).context("Failed to parse YAML engine config")
    }

    /// Load a configuration file, choosing the format by extension
    /// (`.toml`, `.yaml`, `.yml`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            other => bail!(
                "Unsupported engine config extension {:?} for {}",
                other,
                path.display()
            ),
        }
    }

    /// Apply `ROUTEWEAVE_*` environment overrides on top of this configuration.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(id) = lookup("ROUTEWEAVE_SERVER_ID").filter(|s| !s.is_empty()) {
            self.server_id = id;
        }
        if let Some(algorithm) = lookup("ROUTEWEAVE_ALGORITHM").and_then(|s| Algorithm::parse(&s)) {
            self.algorithm = algorithm;
        }
        if let Some(flag) = lookup("ROUTEWEAVE_CACHE") {
            match flag.to_lowercase().as_str() {
                "on" | "true" | "1" => self.cache.enabled = true,
                "off" | "false" | "0" => self.cache.enabled = false,
                _ => {}
            }
        }
        if let Some(ms) = lookup("ROUTEWEAVE_CACHE_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.cache.read_timeout_ms = ms;
        }
        if let Some(capacity) = lookup("ROUTEWEAVE_CACHE_CAPACITY").and_then(|s| s.parse().ok()) {
            self.cache.capacity = capacity;
        }
        if let Some(format) = lookup("ROUTEWEAVE_LOG_FORMAT") {
            self.log.format = LogFormat::parse(&format);
        }
        self
    }
}
