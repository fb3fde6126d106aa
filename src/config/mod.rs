use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub favicon: FaviconConfig,
    pub cache: CacheConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path =
            std::env::var("GARAPAN_API_CONFIG").unwrap_or_else(|_| "config/api.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("GARAPAN_API_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        assert!(
            !self.database.url.is_empty(),
            "Database URL must be specified"
        );
        assert!(
            self.server.port > 0,
            "Server port must be greater than zero"
        );
        self.favicon.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        assert!(self.port < 65535, "HTTP port must be below 65535");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://garapan.db?mode=rwc`
    pub url: String,
    pub max_connections: u32,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaviconConfig {
    pub probe_timeout_ms: Option<u64>,
    pub page_timeout_ms: Option<u64>,
    pub image_timeout_ms: Option<u64>,
    #[serde(default = "FaviconConfig::default_concurrency")]
    pub concurrency: usize,
}

impl FaviconConfig {
    /// Timeout for the direct `/favicon.ico` probe.
    pub fn probe_timeout(&self) -> Duration {
        let millis = self.probe_timeout_ms.unwrap_or(5_000);
        assert!(millis >= 100, "Probe timeout must be at least 100ms");
        assert!(millis <= 60_000, "Probe timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }

    /// Timeout for fetching the origin's root document.
    pub fn page_timeout(&self) -> Duration {
        let millis = self.page_timeout_ms.unwrap_or(10_000);
        assert!(millis >= 100, "Page timeout must be at least 100ms");
        assert!(millis <= 60_000, "Page timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }

    /// Timeout for downloading the resolved icon image.
    pub fn image_timeout(&self) -> Duration {
        let millis = self.image_timeout_ms.unwrap_or(3_000);
        assert!(millis >= 100, "Image timeout must be at least 100ms");
        assert!(millis <= 60_000, "Image timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }

    pub fn ensure_bounds(&self) -> Result<()> {
        assert!(self.concurrency > 0, "Fetch concurrency must be positive");
        assert!(
            self.concurrency <= 64,
            "Fetch concurrency exceeds defensive limit"
        );
        Ok(())
    }

    const fn default_concurrency() -> usize {
        10
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub stats_max_capacity: u64,
    pub stats_ttl_seconds: u64,
    pub icons_max_capacity: u64,
    pub icons_ttl_seconds: u64,
}

impl CacheConfig {
    fn ensure_bounds(&self) -> Result<()> {
        assert!(
            self.stats_max_capacity >= 1,
            "Stats cache capacity must be at least 1"
        );
        assert!(
            self.stats_ttl_seconds <= 86_400,
            "Stats cache TTL cannot exceed one day"
        );
        assert!(
            self.icons_max_capacity >= 16,
            "Icon cache capacity must be at least 16"
        );
        assert!(
            self.icons_ttl_seconds <= 604_800,
            "Icon cache TTL cannot exceed one week"
        );
        Ok(())
    }
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
