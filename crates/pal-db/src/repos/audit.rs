//! Audit trail repository.
//!
//! Append-only audit entries recording every mutation, written inside the
//! mutation's own transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pal_core::entities::AuditEntry;
use pal_core::enums::{AuditAction, EntityType};
use pal_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, parse_datetime, parse_enum, parse_optional_json,
};
use crate::service::PalService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub session_id: Option<String>,
    pub limit: Option<u32>,
}

impl PalService {
    /// Append an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(
        &self,
        conn: &libsql::Connection,
        entry: &AuditEntry,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO audit_trail (id, session_id, entity_type, entity_id, action, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            libsql::params![
                entry.id.as_str(),
                entry.session_id.as_deref(),
                entry.entity_type.as_str(),
                entry.entity_id.as_str(),
                entry.action.as_str(),
                entry.detail.as_ref().map(std::string::ToString::to_string),
                format_datetime(entry.created_at)
            ],
        )
        .await?;
        Ok(())
    }

    /// Build and append an audit entry with a typed detail payload.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn audit(
        &self,
        conn: &libsql::Connection,
        session_id: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<&impl Serialize>,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let entry = AuditEntry {
            id: self.db().generate_id(PREFIX_AUDIT).await?,
            session_id: session_id.map(str::to_string),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail: detail.map(serde_json::to_value).transpose()?,
            created_at: now,
        };
        self.append_audit(conn, &entry).await
    }

    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref sid) = filter.session_id {
            params.push(libsql::Value::Text(sid.clone()));
            conditions.push(format!("session_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, session_id, entity_type, entity_id, action, detail, created_at
             FROM audit_trail {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().await? {
            entries.push(AuditEntry {
                id: row.get::<String>(0)?,
                session_id: get_opt_string(&row, 1)?,
                entity_type: parse_enum(&row.get::<String>(2)?)?,
                entity_id: row.get::<String>(3)?,
                action: parse_enum(&row.get::<String>(4)?)?,
                detail: parse_optional_json(get_opt_string(&row, 5)?.as_deref())?,
                created_at: parse_datetime(&row.get::<String>(6)?)?,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pal_core::audit_detail::LinkClosedDetail;

    #[tokio::test]
    async fn audit_roundtrip_with_detail() {
        let svc = test_service().await;
        let detail = LinkClosedDetail {
            group_id: "grp-1".into(),
            reason: "completed".into(),
        };
        svc.audit(
            svc.db().conn(),
            Some("ses-1"),
            EntityType::EvaluationLink,
            "lnk-1",
            AuditAction::LinkClosed,
            Some(&detail),
            Utc::now(),
        )
        .await
        .unwrap();

        let entries = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::LinkClosed),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_id, "lnk-1");
        assert_eq!(entries[0].session_id.as_deref(), Some("ses-1"));
        assert_eq!(entries[0].detail.as_ref().unwrap()["reason"], "completed");
    }

    #[tokio::test]
    async fn filters_combine() {
        let svc = test_service().await;
        for (session, action) in [
            ("ses-1", AuditAction::GroupsCreated),
            ("ses-1", AuditAction::LinkGenerated),
            ("ses-2", AuditAction::GroupsCreated),
        ] {
            svc.audit(
                svc.db().conn(),
                Some(session),
                EntityType::Session,
                session,
                action,
                None::<&()>,
                Utc::now(),
            )
            .await
            .unwrap();
        }

        let entries = svc
            .query_audit(&AuditFilter {
                session_id: Some("ses-1".into()),
                action: Some(AuditAction::GroupsCreated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);

        let limited = svc
            .query_audit(&AuditFilter {
                limit: Some(2),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].session_id.as_deref(), Some("ses-2"));
    }
}
