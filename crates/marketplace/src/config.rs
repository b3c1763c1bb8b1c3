//! Configuration loading and management

use anyhow::{Context, Result, bail};
use marketplace_auth::JwtConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Enables `DELETE /seller/clear`
    #[serde(default)]
    pub allow_clear: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            allow_clear: false,
        }
    }
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing secret. Usually supplied through `JWT_SECRET` instead of the file.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    #[serde(default = "default_reap_interval_secs")]
    pub blacklist_reap_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: default_issuer(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
            blacklist_reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/marketplace.db".to_string()
}

fn default_issuer() -> String {
    "marketplace".to_string()
}

fn default_access_ttl_secs() -> i64 {
    15 * 60
}

fn default_refresh_ttl_secs() -> i64 {
    7 * 24 * 3600
}

fn default_reap_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Check settings the server cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.as_deref().is_none_or(str::is_empty) {
            bail!("JWT secret is not set (use --jwt-secret, JWT_SECRET or auth.jwt_secret)");
        }
        if self.auth.access_ttl_secs <= 0 {
            bail!("auth.access_ttl_secs must be positive");
        }
        if self.auth.refresh_ttl_secs <= self.auth.access_ttl_secs {
            bail!("auth.refresh_ttl_secs must be longer than auth.access_ttl_secs");
        }
        if self.auth.blacklist_reap_interval_secs == 0 {
            bail!("auth.blacklist_reap_interval_secs must be positive");
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => bail!("Unknown logging.format '{}' (expected pretty or json)", other),
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.auth.jwt_secret.clone().unwrap_or_default(),
            issuer: self.auth.issuer.clone(),
            access_ttl_secs: self.auth.access_ttl_secs,
            refresh_ttl_secs: self.auth.refresh_ttl_secs,
        }
    }
}
