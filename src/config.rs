//! Configuration module for the payments API server.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// CLI arguments for the payments API server.
#[derive(Parser, Debug)]
#[command(name = "payments-api")]
#[command(about = "Payments CRUD HTTP server")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// Fields use serde defaults that fall back to environment variables,
/// then to hardcoded defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    /// Externally visible base URL, used to build the `self` link of list responses.
    #[serde(default = "config_defaults::default_public_url")]
    public_url: Url,
    /// Deadline applied to every store operation of a request.
    #[serde(default = "config_defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default)]
    store: StoreConfig,
}

/// Which [`PaymentStore`](crate::store::PaymentStore) implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "config_defaults::default_store_backend")]
    backend: StoreBackend,
    #[serde(default = "config_defaults::default_store_url")]
    url: String,
    #[serde(default = "config_defaults::default_store_database")]
    database: String,
    #[serde(default = "config_defaults::default_store_collection")]
    collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: config_defaults::default_store_backend(),
            url: config_defaults::default_store_url(),
            database: config_defaults::default_store_database(),
            collection: config_defaults::default_store_collection(),
        }
    }
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: config_defaults::default_port(),
            host: config_defaults::default_host(),
            public_url: config_defaults::default_public_url(),
            request_timeout_secs: config_defaults::default_request_timeout_secs(),
            store: StoreConfig::default(),
        }
    }
}

pub mod config_defaults {
    use std::env;
    use std::net::{IpAddr, Ipv4Addr};
    use url::Url;

    use super::StoreBackend;

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_STORE_URL: &str = "mongodb://mongodb:27017";
    pub const DEFAULT_STORE_DATABASE: &str = "paymentsDev";
    pub const DEFAULT_STORE_COLLECTION: &str = "payments";

    /// Returns the default port value with fallback: $PORT env var -> 8080
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0"
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HOST)
    }

    /// $PUBLIC_URL env var -> "http://localhost:8080"
    pub fn default_public_url() -> Url {
        env::var("PUBLIC_URL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| Url::parse(DEFAULT_PUBLIC_URL).expect("valid default public URL"))
    }

    /// $REQUEST_TIMEOUT_SECS env var -> 60
    pub fn default_request_timeout_secs() -> u64 {
        env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// $STORE_BACKEND env var ("memory" or "mongodb") -> memory
    pub fn default_store_backend() -> StoreBackend {
        match env::var("STORE_BACKEND").ok().as_deref() {
            Some("mongodb") => StoreBackend::Mongodb,
            _ => StoreBackend::Memory,
        }
    }

    pub fn default_store_url() -> String {
        env::var("MONGO_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string())
    }

    pub fn default_store_database() -> String {
        env::var("MONGO_DATABASE").unwrap_or_else(|_| DEFAULT_STORE_DATABASE.to_string())
    }

    pub fn default_store_collection() -> String {
        env::var("MONGO_COLLECTION").unwrap_or_else(|_| DEFAULT_STORE_COLLECTION.to_string())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Load configuration from CLI arguments and JSON file.
    ///
    /// The config file path is determined by:
    /// 1. `--config <path>` CLI argument (or `$CONFIG`)
    /// 2. `./config.json` (if it exists)
    ///
    /// Values not present in the config file will be resolved via
    /// environment variables or defaults during deserialization.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        if !cli_args.config.exists() && cli_args.config == Path::new("config.json") {
            tracing::info!("No config.json found, using defaults");
            return Ok(Config::default());
        }
        Self::load_from_path(cli_args.config)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }
}
