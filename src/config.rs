use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Service settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub okx_base_url: String,
    pub live_platform: String,
    pub live_method: String,
    pub quote_timeout: Duration,
    pub persist_timeout: Duration,
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 10000,
            okx_base_url: "https://www.okx.com".to_string(),
            live_platform: "OKX".to_string(),
            live_method: "Trade".to_string(),
            quote_timeout: Duration::from_millis(5000),
            persist_timeout: Duration::from_millis(2000),
            store_path: PathBuf::from("data/store.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Config::default();

        if let Some(port) = get("PORT") {
            cfg.port = port.parse().with_context(|| format!("PORT must be a number, got {port:?}"))?;
        }
        if let Some(url) = get("OKX_BASE_URL") {
            cfg.okx_base_url = url;
        }
        if let Some(platform) = get("LIVE_PLATFORM") {
            cfg.live_platform = platform;
        }
        if let Some(method) = get("LIVE_METHOD") {
            cfg.live_method = method;
        }
        if let Some(ms) = get("QUOTE_TIMEOUT_MS") {
            cfg.quote_timeout = parse_millis("QUOTE_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = get("PERSIST_TIMEOUT_MS") {
            cfg.persist_timeout = parse_millis("PERSIST_TIMEOUT_MS", &ms)?;
        }
        if let Some(path) = get("STORE_PATH") {
            cfg.store_path = PathBuf::from(path);
        }

        Ok(cfg)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    let ms: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got {raw:?}"))?;
    Ok(Duration::from_millis(ms))
}
