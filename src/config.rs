// Engine configuration
// Supports a TOML config file and environment variable overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Flow result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached flow result stays valid, in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// How often expired entries are swept, in seconds
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_ttl_seconds() -> u64 {
    300
}
fn default_sweep_interval_seconds() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_seconds: default_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
    pub log_level: Level,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_ttl: Duration::from_secs(default_ttl_seconds()),
            cache_sweep_interval: Duration::from_secs(default_sweep_interval_seconds()),
            log_level: Level::INFO,
        }
    }
}

impl EngineConfig {
    /// Load configuration from all sources.
    /// Priority: environment variables > config file > defaults
    pub fn load() -> anyhow::Result<Self> {
        let config_file = if let Ok(config_path) = std::env::var("NRE_CONFIG") {
            let path = PathBuf::from(config_path);
            tracing::info!("Loading configuration from: {}", path.display());
            read_config_file(&path)?
        } else {
            // Try loading from default locations
            let default_paths = vec![
                PathBuf::from("config.toml"),
                PathBuf::from("network-reachability-engine.toml"),
            ];

            let mut loaded_config = None;
            for path in default_paths {
                if path.exists() {
                    tracing::info!("Loading configuration from: {}", path.display());
                    loaded_config = Some(read_config_file(&path)?);
                    break;
                }
            }

            loaded_config.unwrap_or_default()
        };

        Self::merge(config_file)
    }

    /// Load configuration from an explicit file, still applying environment
    /// variable overrides.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        Self::merge(read_config_file(path)?)
    }

    fn merge(config_file: ConfigFile) -> anyhow::Result<Self> {
        let ttl_seconds = env_override("NRE_CACHE_TTL_SECONDS")?.unwrap_or(config_file.cache.ttl_seconds);
        let sweep_seconds = env_override("NRE_CACHE_SWEEP_SECONDS")?
            .unwrap_or(config_file.cache.sweep_interval_seconds);

        let level_str =
            std::env::var("NRE_LOG_LEVEL").unwrap_or_else(|_| config_file.logging.level.clone());
        let log_level = parse_log_level(&level_str)?;

        Ok(EngineConfig {
            cache_ttl: Duration::from_secs(ttl_seconds),
            cache_sweep_interval: Duration::from_secs(sweep_seconds),
            log_level,
        })
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let config_content = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<ConfigFile>(&config_content)?)
}

fn env_override(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", name, value))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.cache.sweep_interval_seconds, 60);
        assert_eq!(config.logging.level, "info");

        let merged = EngineConfig::default();
        assert_eq!(merged.cache_ttl, Duration::from_secs(300));
        assert_eq!(merged.cache_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_config_file() {
        let content = r#"
[cache]
ttl_seconds = 30

[logging]
level = "debug"
"#;
        let config: ConfigFile = toml::from_str(content).unwrap();
        assert_eq!(config.cache.ttl_seconds, 30);
        // Unset fields keep their defaults
        assert_eq!(config.cache.sweep_interval_seconds, 60);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("DEBUG"), Ok(Level::DEBUG)));
        assert!(parse_log_level("invalid").is_err());
    }
}
