//! Mediator configuration stored in `config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Mediator configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below. Start-up flags override `debug` and `confirm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NlshConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,

    /// Model name sent with every request.
    pub model: String,

    pub temperature: f32,

    /// Completion length cap; one command line never needs more.
    pub max_tokens: u32,

    /// HTTP timeout for a single backend round trip.
    pub request_timeout_secs: u64,

    /// Environment variable holding the API credential.
    pub api_key_env: String,

    /// Interpreter used to evaluate commands (`<shell> -c <command>`).
    pub shell: String,

    /// Directory for per-run session logs. Defaults to the user's data dir.
    pub log_dir: Option<PathBuf>,

    /// Initial debug/verbose mode.
    pub debug: bool,

    /// Initial confirmation mode.
    pub confirm: bool,
}

impl Default for NlshConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 150,
            request_timeout_secs: 60,
            api_key_env: "OPENAI_API_KEY".to_string(),
            shell: "sh".to_string(),
            log_dir: None,
            debug: false,
            confirm: true,
        }
    }
}

impl NlshConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(anyhow!("endpoint must be an http(s) URL"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 2.0"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(anyhow!("api_key_env must be non-empty"));
        }
        if self.shell.trim().is_empty() {
            return Err(anyhow!("shell must be non-empty"));
        }
        Ok(())
    }

    /// Resolve the session log directory, falling back to the platform data dir.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// `<config_dir>/nlsh/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nlsh").join("config.toml"))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("nlsh")
        .join("logs")
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `NlshConfig::default()`.
pub fn load_config(path: &Path) -> Result<NlshConfig> {
    if !path.exists() {
        let cfg = NlshConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: NlshConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Read the API credential from the environment.
///
/// A missing or blank value is a start-up error.
pub fn read_api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(anyhow!("{var} is not set; export it before starting nlsh")),
    }
}
