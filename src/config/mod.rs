//! Configuration Management
//!
//! Loads analyzer configuration from TOML files.
//! Configuration includes:
//! - External reasoning settings (provider, endpoint, model, credentials)
//! - Preprocessing options (time-window width)
//! - Every numeric threshold used by the fallback analyzer and decision engine

pub mod thresholds;

pub use thresholds::Thresholds;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::log_analysis::preprocess::DEFAULT_WINDOW_MINUTES;

/// Wire format spoken by the external reasoning service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible `/chat/completions`
    #[default]
    OpenAi,
    /// Anthropic `/messages`
    Anthropic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub preprocess: PreprocessConfig,

    #[serde(default)]
    pub thresholds: Thresholds,
}

/// External reasoning service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// When false the rule-based fallback is always used
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: Provider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ReasoningConfig {
    /// Provider and endpoint both still at their OpenAI defaults.
    fn has_default_target(&self) -> bool {
        self.provider == Provider::OpenAi && self.endpoint == default_endpoint()
    }

    /// Credentials present and the service not switched off.
    pub fn is_available(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
        }
    }
}

const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";

fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_window_minutes() -> u32 {
    DEFAULT_WINDOW_MINUTES
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let mut candidates = vec![PathBuf::from("rootcause.toml")];
                if let Some(home) = dirs::home_dir() {
                    candidates.push(home.join(".config/rootcause/config.toml"));
                }

                let mut loaded = None;
                for p in &candidates {
                    if let Ok(content) = std::fs::read_to_string(p) {
                        tracing::debug!("Loading config from {}", p.display());
                        loaded = Some(toml::from_str(&content).with_context(|| {
                            format!("Failed to parse config {}", p.display())
                        })?);
                        break;
                    }
                }
                loaded.unwrap_or_else(|| {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                })
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path))?;
        toml::from_str(&content).context("Failed to parse config")
    }

    /// Apply `ROOTCAUSE_*` overrides. The key lookup is injected so tests
    /// never touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let anthropic_key = non_empty("ANTHROPIC_API_KEY");
        let generic_key = non_empty("ROOTCAUSE_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        match (generic_key, anthropic_key) {
            (Some(key), _) => self.reasoning.api_key = Some(key),
            (None, Some(key)) => {
                self.reasoning.api_key = Some(key);
                // An Anthropic key must never reach the OpenAI default endpoint.
                if non_empty("ROOTCAUSE_PROVIDER").is_none()
                    && non_empty("ROOTCAUSE_ENDPOINT").is_none()
                    && self.reasoning.has_default_target()
                {
                    self.reasoning.provider = Provider::Anthropic;
                    self.reasoning.endpoint = ANTHROPIC_ENDPOINT.to_string();
                    if self.reasoning.model == default_model() {
                        self.reasoning.model = ANTHROPIC_MODEL.to_string();
                    }
                }
            }
            (None, None) => {}
        }
        if let Some(endpoint) = non_empty("ROOTCAUSE_ENDPOINT") {
            self.reasoning.endpoint = endpoint;
        }
        if let Some(model) = non_empty("ROOTCAUSE_MODEL") {
            self.reasoning.model = model;
        }
        if let Some(provider) = non_empty("ROOTCAUSE_PROVIDER") {
            match provider.parse::<Provider>() {
                Ok(p) => self.reasoning.provider = p,
                Err(e) => tracing::warn!("Ignoring ROOTCAUSE_PROVIDER: {}", e),
            }
        }
        if let Some(timeout) = non_empty("ROOTCAUSE_TIMEOUT") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.reasoning.timeout_secs = t;
            }
        }
    }

    /// TOML rendering with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if let Some(key) = shown.reasoning.api_key.as_mut() {
            *key = redact_key(key);
        }
        toml::to_string_pretty(&shown).context("Failed to serialize config")
    }
}

fn redact_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
