use anyhow::Context;
use serde::Deserialize;

use crate::http::parser::DEFAULT_MAX_LINE_LENGTH;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "HTTPLET_CONFIG";
/// Environment variable overriding `listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub request_buffer_size: usize,
    pub response_buffer_size: usize,
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            request_buffer_size: 4096,
            response_buffer_size: 4096,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl Config {
    /// Defaults, overlaid by the YAML file in `HTTPLET_CONFIG` (if set), then
    /// by `LISTEN`.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            request_buffer_size: self.request_buffer_size.max(1),
            response_buffer_size: self.response_buffer_size,
            max_line_length: self.max_line_length,
        }
    }
}

/// Per-connection tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Capacity of the buffered reader over the connection
    pub request_buffer_size: usize,
    /// Initial capacity of the encoded response buffer
    pub response_buffer_size: usize,
    /// Longest accepted request or header line
    pub max_line_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Config::default().session_settings()
    }
}
