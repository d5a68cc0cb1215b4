//! # pal-config
//!
//! Layered configuration loading for Palanquée using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PALANQUEE_*` prefix, `__` as separator)
//! 2. Project-level `.palanquee/config.toml`
//! 3. User-level `~/.config/palanquee/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PALANQUEE_LINKS__TTL_DAYS` -> `links.ttl_days`,
//! `PALANQUEE_DATABASE__PATH` -> `database.path`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use pal_config::PalConfig;
//!
//! let config = PalConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//! println!("links live {} days", config.links.ttl_days);
//! ```

mod database;
mod error;
mod general;
mod links;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use links::LinksConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding project-local state (config file, database, outbox).
pub const PROJECT_DIR: &str = ".palanquee";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PalConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl PalConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(PROJECT_DIR).join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("PALANQUEE_").split("__"))
    }

    /// Check values figment cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.links.validate()?;
        self.general.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("palanquee").join("config.toml"))
    }

    /// Load `.env` from the workspace root, else from the current directory.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.links.ttl_days, 30);
        assert_eq!(config.general.default_limit, 20);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: PalConfig = PalConfig::figment().extract()?;
            assert_eq!(config.database.path, ".palanquee/palanquee.db");
            assert!(config.links.public_base_url.is_empty());
            Ok(())
        });
    }
}
