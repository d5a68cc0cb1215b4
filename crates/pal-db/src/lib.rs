//! # pal-db
//!
//! libSQL storage for Palanquée.
//!
//! Holds people, curriculum, dive sessions, dive groups, evaluations,
//! evaluation links and the audit trail. The transactional entry points
//! (`assign`, `import_matrix`, `generate_link`, `submit_link`, ...) live on
//! [`service::PalService`], split across the `repos` modules.
//!
//! Uses the `libsql` crate (`SQLite` fork, v0.9.29) in local-only mode.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
mod test_support;
pub mod tokens;

use error::DatabaseError;
use libsql::{Builder, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and its single connection. Write transactions are
/// serialized through `write_gate` so two transactional units never
/// interleave on the shared connection.
pub struct PalDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    write_gate: Mutex<()>,
}

impl PalDb {
    /// Open a local database at the given path (`:memory:` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let pal_db = Self {
            db,
            conn,
            write_gate: Mutex::new(()),
        };
        pal_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(pal_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"grp-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Run a single write statement under the write gate, so it never lands
    /// inside another caller's open transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the statement fails.
    pub async fn execute_write(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        let _gate = self.write_gate.lock().await;
        Ok(self.conn.execute(sql, params).await?)
    }

    /// Start an `IMMEDIATE` write transaction, waiting for any other one to
    /// finish first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `BEGIN IMMEDIATE` fails.
    pub async fn begin_write(&self) -> Result<WriteTxn<'_>, DatabaseError> {
        let gate = self.write_gate.lock().await;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;
        Ok(WriteTxn { tx, _gate: gate })
    }
}

/// An open write transaction holding the write gate.
///
/// Derefs to the connection so repository helpers take `&libsql::Connection`
/// whether or not they run inside a transaction.
pub struct WriteTxn<'a> {
    tx: libsql::Transaction,
    _gate: MutexGuard<'a, ()>,
}

impl WriteTxn<'_> {
    /// Commit on `Ok`, roll back on `Err`, and pass `result` through.
    ///
    /// # Errors
    ///
    /// Returns the original error, or the commit failure.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl std::ops::Deref for WriteTxn<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &libsql::Connection {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> PalDb {
        PalDb::open_local(":memory:").await.unwrap()
    }

    async fn count(db: &PalDb, sql: &str) -> i64 {
        let mut rows = db.conn().query(sql, ()).await.unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        let tables = [
            "people",
            "training_sections",
            "person_sections",
            "competency_groups",
            "competencies",
            "exercises",
            "competency_exercises",
            "dive_sessions",
            "session_enrollments",
            "dive_groups",
            "group_memberships",
            "group_competencies",
            "group_evaluations",
            "exercise_evaluations",
            "evaluation_links",
            "audit_trail",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("grp").await.unwrap();
        assert!(id.starts_with("grp-"), "ID should start with 'grp-': {id}");
        assert_eq!(id.len(), 12, "3 prefix + 1 dash + 8 hex: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in pal_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn finish_commits_on_ok() {
        let db = test_db().await;
        let tx = db.begin_write().await.unwrap();
        let result = tx
            .execute(
                "INSERT INTO exercises (id, name, created_at) VALUES ('exo-1', 'Vidage', '2026-01-01T00:00:00Z')",
                (),
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await.unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM exercises").await, 1);
    }

    #[tokio::test]
    async fn finish_rolls_back_on_err() {
        let db = test_db().await;
        let tx = db.begin_write().await.unwrap();
        tx.execute(
            "INSERT INTO exercises (id, name, created_at) VALUES ('exo-1', 'Vidage', '2026-01-01T00:00:00Z')",
            (),
        )
        .await
        .unwrap();
        let failed: Result<(), _> = Err(DatabaseError::Validation("nope".into()));
        assert!(tx.finish(failed).await.is_err());

        assert_eq!(count(&db, "SELECT COUNT(*) FROM exercises").await, 0);
    }

    #[tokio::test]
    async fn single_write_waits_for_open_transaction() {
        let db = test_db().await;
        let tx = db.begin_write().await.unwrap();
        tx.execute(
            "INSERT INTO exercises (id, name, created_at) VALUES ('exo-1', 'Vidage', '2026-01-01T00:00:00Z')",
            (),
        )
        .await
        .unwrap();

        let (rolled_back, written) = tokio::join!(
            async move {
                tokio::task::yield_now().await;
                tx.finish::<()>(Err(DatabaseError::Validation("abandoned".into())))
                    .await
            },
            db.execute_write(
                "INSERT INTO exercises (id, name, created_at) VALUES ('exo-2', 'Palmage', '2026-01-01T00:00:00Z')",
                (),
            ),
        );
        assert!(rolled_back.is_err());
        assert_eq!(written.unwrap(), 1);

        let mut rows = db.conn().query("SELECT id FROM exercises", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "exo-2");
        assert!(rows.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_violation_is_a_conflict() {
        let db = test_db().await;
        let insert = "INSERT INTO exercises (id, name, created_at) VALUES ('exo-1', 'Vidage', '2026-01-01T00:00:00Z')";
        db.conn().execute(insert, ()).await.unwrap();
        let err = DatabaseError::from(db.conn().execute(insert, ()).await.unwrap_err());
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn second_valid_link_per_group_is_rejected() {
        let db = test_db().await;
        db.conn()
            .execute_batch(
                "INSERT INTO training_sections (id, code, name, created_at) VALUES ('sec-1', 'n1', 'N1', 'x');
                 INSERT INTO dive_sessions (id, date, location, created_at) VALUES ('ses-1', '2026-06-01', 'Lac', 'x');
                 INSERT INTO dive_groups (id, session_id, name, section_id, created_at) VALUES ('grp-1', 'ses-1', 'G', 'sec-1', 'x');
                 INSERT INTO evaluation_links (id, group_id, token, created_at, expires_at, valid) VALUES ('lnk-1', 'grp-1', 't1', 'x', 'y', 1);",
            )
            .await
            .unwrap();

        let second = db
            .conn()
            .execute(
                "INSERT INTO evaluation_links (id, group_id, token, created_at, expires_at, valid) VALUES ('lnk-2', 'grp-1', 't2', 'x', 'y', 1)",
                (),
            )
            .await;
        assert!(second.is_err());

        db.conn()
            .execute(
                "INSERT INTO evaluation_links (id, group_id, token, created_at, expires_at, valid) VALUES ('lnk-3', 'grp-1', 't3', 'x', 'y', 0)",
                (),
            )
            .await
            .unwrap();
    }
}
