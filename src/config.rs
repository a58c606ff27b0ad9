/// Configuration module for verse-finder.
///
/// Handles loading, validating, and providing default configuration values.
/// Edition identifiers and the provider base URL are the only knobs; the
/// search term itself always comes from the user.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_base_url() -> String {
    "https://api.alquran.cloud/v1".to_string()
}

fn default_translation() -> String {
    "en.sahih".to_string()
}

fn default_arabic() -> String {
    "ar.quran-simple".to_string()
}

fn default_explanation() -> String {
    "en.tafisr_ibn_kathir".to_string()
}

fn default_secondary_search() -> Option<String> {
    Some(default_arabic())
}

fn default_search_scope() -> String {
    "all".to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_max_concurrent_requests() -> usize {
    4
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub editions: EditionConfig,

    /// Matches kept after merge + dedupe; only these are enriched.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Provider calls allowed in flight at once.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Edition identifiers as the content provider names them.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EditionConfig {
    /// Primary search edition, also the source of the English field.
    #[serde(default = "default_translation")]
    pub translation: String,

    #[serde(default = "default_arabic")]
    pub arabic: String,

    #[serde(default = "default_explanation")]
    pub explanation: String,

    /// Extra search edition for recall; `null` disables the second search.
    #[serde(default = "default_secondary_search")]
    pub secondary_search: Option<String>,

    #[serde(default = "default_search_scope")]
    pub search_scope: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            editions: EditionConfig::default(),
            max_results: default_max_results(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: None,
        }
    }
}

impl Default for EditionConfig {
    fn default() -> Self {
        Self {
            translation: default_translation(),
            arabic: default_arabic(),
            explanation: default_explanation(),
            secondary_search: default_secondary_search(),
            search_scope: default_search_scope(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl EditionConfig {
    /// Search editions in priority order, primary first, without repeats.
    #[must_use]
    pub fn search_editions(&self) -> Vec<&str> {
        let mut editions = vec![self.translation.as_str()];
        if let Some(secondary) = self.secondary_search.as_deref() {
            if secondary != self.translation {
                editions.push(secondary);
            }
        }
        editions
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. Invalid JSON is logged and also
    /// falls back to the defaults rather than failing startup.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("base_url is not a valid URL: {}", self.base_url))?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "base_url must use http or https"
        );
        anyhow::ensure!(
            !url.cannot_be_a_base(),
            "base_url must be an absolute base URL"
        );
        anyhow::ensure!(self.max_results > 0, "max_results must be positive");
        anyhow::ensure!(
            self.max_concurrent_requests > 0,
            "max_concurrent_requests must be positive"
        );

        let e = &self.editions;
        for (name, value) in [
            ("editions.translation", &e.translation),
            ("editions.arabic", &e.arabic),
            ("editions.explanation", &e.explanation),
            ("editions.search_scope", &e.search_scope),
        ] {
            anyhow::ensure!(!value.trim().is_empty(), "{name} must not be empty");
        }
        if let Some(secondary) = &e.secondary_search {
            anyhow::ensure!(
                !secondary.trim().is_empty(),
                "editions.secondary_search must not be empty (use null to disable)"
            );
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
