//! Server configuration
//!
//! Built-in defaults overridden by `BOOKSHELF_*` environment variables,
//! e.g. `BOOKSHELF_BIND_ADDRESS=127.0.0.1:9000`.

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const ENV_PREFIX: &str = "BOOKSHELF";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub database_path: String,
    pub rate_limit_capacity: u32,
    pub rate_limit_interval_ms: u64,
    pub cache_ttl_secs: u64,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self> {
        let config: ServerConfig = Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("database_path", "data/bookshelf.db")?
            .set_default("rate_limit_capacity", 20_u64)?
            .set_default("rate_limit_interval_ms", 100_u64)?
            .set_default("cache_ttl_secs", 86_400_u64)?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.rate_limit_capacity == 0 {
            warn!("Rate limit capacity is 0, every request will be rejected");
        }
        Ok(config)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
