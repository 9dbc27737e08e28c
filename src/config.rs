use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_ENV: &str = "HTTPWIRE_CONFIG";
/// Environment variable overriding `listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the server binds to. Port 0 picks a free port.
    pub listen_addr: String,
    /// Initial size of the per-connection read buffer.
    pub read_buffer_size: usize,
    /// Base URL for the `/httpbin` passthrough route. Plain `http` only.
    pub upstream_url: String,
    /// Connect timeout for the upstream, in seconds.
    pub upstream_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:42069".to_string(),
            read_buffer_size: 1024,
            upstream_url: "http://httpbin.org".to_string(),
            upstream_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Loads the file named by `HTTPWIRE_CONFIG` if set (defaults
    /// otherwise), then applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            cfg.listen_addr = addr;
        }
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(content)?;
        if cfg.read_buffer_size == 0 {
            anyhow::bail!("read_buffer_size must be greater than zero");
        }
        Ok(cfg)
    }
}
