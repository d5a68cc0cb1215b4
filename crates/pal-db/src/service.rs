//! Service layer orchestrating database mutations with audit.
//!
//! `PalService` wraps `PalDb` and the link settings. All repo methods are
//! implemented as `impl PalService` blocks under `repos/`.

use chrono::Duration;
use pal_config::{LinksConfig, PalConfig};

use crate::PalDb;
use crate::error::DatabaseError;

/// How evaluation links are issued and rendered.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub ttl: Duration,
    config: LinksConfig,
}

impl LinkSettings {
    #[must_use]
    pub fn from_config(config: &LinksConfig) -> Self {
        Self {
            ttl: Duration::days(i64::from(config.ttl_days)),
            config: config.clone(),
        }
    }

    /// Public URL of a link token.
    #[must_use]
    pub fn url_for(&self, token: &str) -> String {
        self.config.url_for(token)
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self::from_config(&LinksConfig::default())
    }
}

/// Orchestrates database mutations with the audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Begin an immediate transaction (serialized by the write gate)
/// 2. Execute SQL
/// 3. Append audit entry (inside transaction)
/// 4. Commit, or roll back on any error
pub struct PalService {
    db: PalDb,
    links: LinkSettings,
}

impl PalService {
    /// Create a new service wrapping a local database with default settings.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = PalDb::open_local(db_path).await?;
        Ok(Self::from_db(db, LinkSettings::default()))
    }

    /// Open the database named by `config` with its link settings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn from_config(config: &PalConfig) -> Result<Self, DatabaseError> {
        let db = PalDb::open_local(&config.database.path).await?;
        Ok(Self::from_db(db, LinkSettings::from_config(&config.links)))
    }

    /// Create from an existing `PalDb` (for testing).
    #[must_use]
    pub const fn from_db(db: PalDb, links: LinkSettings) -> Self {
        Self { db, links }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &PalDb {
        &self.db
    }

    #[must_use]
    pub const fn link_settings(&self) -> &LinkSettings {
        &self.links
    }
}
