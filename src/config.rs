// Engine and server configuration
//
// Loaded from TOML. An embedded default is used unless `WANDERLY_CONFIG`
// points at a file; every key is optional and falls back to its default.

use std::{path::Path, time::Duration};

use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "WANDERLY_CONFIG";
pub const BIND_ADDR_ENV: &str = "WANDERLY_BIND";

const DEFAULT_CONFIG: &str = r#"
[engine]
max_code_attempts = 3
enforce_status_transitions = false
default_page_limit = 10
max_page_limit = 100

[engine.retry]
max_retries = 3
initial_backoff_ms = 10
max_backoff_ms = 500
backoff_multiplier = 2.0
jitter_factor = 0.1

[server]
bind_addr = "127.0.0.1:5000"
seed_destinations = true
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Booking codes regenerated on a duplicate before giving up
    pub max_code_attempts: u32,
    // Reject status changes outside pending -> confirmed -> completed
    pub enforce_status_transitions: bool,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: 3,
            enforce_status_transitions: false,
            default_page_limit: 10,
            max_page_limit: 100,
            retry: RetryConfig::default(),
        }
    }
}

// Backoff for read-modify-write cycles that lost a version race
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 500,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    // Exponential backoff with jitter
    pub fn backoff(&self, retry_attempt: u32) -> Duration {
        let base_backoff_ms = (self.initial_backoff_ms as f64
            * self.backoff_multiplier.powf(retry_attempt as f64))
        .min(self.max_backoff_ms as f64);

        let jitter = rand::random::<f64>() * self.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - self.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    // Load the bundled Indonesian destinations into the in-memory catalog
    pub seed_destinations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            seed_destinations: true,
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Resolve the configuration for the server binary.
    ///
    /// Reads the file named by `WANDERLY_CONFIG` if set, otherwise the
    /// embedded default. `WANDERLY_BIND` overrides the bind address.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                tracing::info!("Loading config from: {}", path);
                Self::from_file(Path::new(&path))?
            }
            Err(_) => {
                tracing::info!("Using default embedded configuration");
                Self::from_toml(DEFAULT_CONFIG)?
            }
        };

        if let Ok(bind_addr) = std::env::var(BIND_ADDR_ENV) {
            config.server.bind_addr = bind_addr;
        }

        Ok(config)
    }
}
