//! Evaluation link settings.

use pal_core::notify::link_url;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Days an evaluation link stays usable after generation.
const fn default_ttl_days() -> u32 {
    30
}

/// Longest accepted link lifetime, ten years.
pub const MAX_TTL_DAYS: u32 = 3650;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinksConfig {
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Origin prepended to link paths (e.g., `https://club.example`).
    /// Empty means links are rendered as server-relative paths.
    #[serde(default)]
    pub public_base_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            public_base_url: String::new(),
        }
    }
}

impl LinksConfig {
    /// Public URL for a link token.
    #[must_use]
    pub fn url_for(&self, token: &str) -> String {
        link_url(&self.public_base_url, token)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "links.ttl_days".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.ttl_days > MAX_TTL_DAYS {
            return Err(ConfigError::InvalidValue {
                field: "links.ttl_days".into(),
                reason: format!("must be at most {MAX_TTL_DAYS}"),
            });
        }
        let base = &self.public_base_url;
        if !base.is_empty() && !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "links.public_base_url".into(),
                reason: format!("expected an http(s) origin, got '{base}'"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_rejected() {
        let config = LinksConfig {
            ttl_days: 0,
            ..LinksConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ttl_is_bounded_above() {
        let at_limit = LinksConfig {
            ttl_days: MAX_TTL_DAYS,
            ..LinksConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let config = LinksConfig {
            ttl_days: u32::MAX,
            ..LinksConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "links.ttl_days"
        ));
    }

    #[test]
    fn base_url_must_be_http() {
        let config = LinksConfig {
            public_base_url: "club.example".into(),
            ..LinksConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LinksConfig {
            public_base_url: "https://club.example".into(),
            ..LinksConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.url_for("tok"), "https://club.example/evaluation/tok/");
    }
}
