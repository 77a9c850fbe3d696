use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AutoplayError, Result};

pub const DEFAULT_TICK_MS: u64 = 100;
pub const DEFAULT_STORAGE_KEY: &str = "gameState";
pub const DEFAULT_TARGET_TAG: &str = "stub";
pub const DEFAULT_ORACLE_EXPRESSION: &str = "org.quach.Online2048().getMove";

/// What the driver does when a tick fails (malformed state, oracle or host error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickFailurePolicy {
    /// Log, count, and wait for the next tick. Matches an interval timer whose
    /// callback threw.
    #[default]
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OracleConfig {
    /// Callable evaluated inside the game page, invoked as `<expression>(grid)`.
    Page { expression: String },
    /// Endpoint receiving `{ "grid": [[...]] }` and answering with a key code.
    Http { url: String },
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig::Page {
            expression: DEFAULT_ORACLE_EXPRESSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// DevTools websocket of an already running browser.
    pub ws_url: String,
    /// Picks the first tab whose URL contains this string. First tab otherwise.
    pub page_url_contains: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:9222".to_string(),
            page_url_contains: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    pub tick_interval_ms: u64,
    pub storage_key: String,
    pub target_tag: String,
    pub on_tick_failure: TickFailurePolicy,
    pub oracle: OracleConfig,
    pub browser: BrowserConfig,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            target_tag: DEFAULT_TARGET_TAG.to_string(),
            on_tick_failure: TickFailurePolicy::default(),
            oracle: OracleConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl AutoplayConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AutoplayConfig =
            serde_json::from_str(text).map_err(|e| AutoplayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// File named by `AUTOPLAY_CONFIG` (defaults when unset), then env overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("AUTOPLAY_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = lookup("AUTOPLAY_TICK_MS") {
            self.tick_interval_ms = ms
                .trim()
                .parse()
                .map_err(|_| AutoplayError::Config(format!("AUTOPLAY_TICK_MS is not a number: {ms}")))?;
        }
        if let Some(key) = lookup("AUTOPLAY_STORAGE_KEY") {
            self.storage_key = key;
        }
        if let Some(ws) = lookup("AUTOPLAY_BROWSER_WS") {
            self.browser.ws_url = ws;
        }
        if let Some(url) = lookup("AUTOPLAY_ORACLE_URL") {
            self.oracle = OracleConfig::Http { url };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(AutoplayError::Config("tick_interval_ms must be > 0".into()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(AutoplayError::Config("storage_key is empty".into()));
        }
        if self.target_tag.trim().is_empty() {
            return Err(AutoplayError::Config("target_tag is empty".into()));
        }
        match &self.oracle {
            OracleConfig::Page { expression } if expression.trim().is_empty() => {
                Err(AutoplayError::Config("oracle expression is empty".into()))
            }
            OracleConfig::Http { url } if url.trim().is_empty() => {
                Err(AutoplayError::Config("oracle url is empty".into()))
            }
            _ => Ok(()),
        }
    }
}
