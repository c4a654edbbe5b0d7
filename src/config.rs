use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::Deserialize;

/// Runtime settings
///
/// Layered: built-in defaults, then an optional `regimebot.toml`, then
/// `REGIMEBOT__*` environment variables (e.g. `REGIMEBOT__CACHE__TTL_SECS=60`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub history: HistorySettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub sentiment_url: String,
    pub policy_url: String,
    pub fedspeak_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub rate_limit_rpm: u32,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            sentiment_url: "http://127.0.0.1:3000/api/sentiment".to_string(),
            policy_url: "http://127.0.0.1:3000/api/trump-index".to_string(),
            fedspeak_url: "http://127.0.0.1:3000/api/fedspeak".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            rate_limit_rpm: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub key: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 15 * 60,
            key: "market-regime:snapshot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub backend: HistoryBackend,
    pub redis_url: String,
    pub namespace: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            namespace: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `regimebot.toml` (optional) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("regimebot")
    }

    pub fn load_from(file_stem: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("REGIMEBOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.cache.ttl_secs, 900);
        assert_eq!(settings.cache.key, "market-regime:snapshot");
        assert_eq!(settings.history.backend, HistoryBackend::Memory);
        assert_eq!(settings.upstream.max_retries, 3);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load_from("definitely-not-a-config-file").unwrap();

        assert_eq!(settings.cache.ttl_secs, 900);
        assert_eq!(settings.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = std::env::temp_dir().join(format!("regimebot-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("regimebot.toml");
        std::fs::write(
            &path,
            "[cache]\nttl_secs = 60\n\n[history]\nbackend = \"redis\"\nnamespace = \"tenant-a\"\n",
        )
        .unwrap();

        let stem = dir.join("regimebot");
        let settings = Settings::load_from(stem.to_str().unwrap()).unwrap();

        assert_eq!(settings.cache.ttl_secs, 60);
        assert_eq!(settings.cache.key, "market-regime:snapshot");
        assert_eq!(settings.history.backend, HistoryBackend::Redis);
        assert_eq!(settings.history.namespace, "tenant-a");
        assert_eq!(settings.upstream.timeout_secs, 10);

        std::fs::remove_dir_all(&dir).ok();
    }
}
