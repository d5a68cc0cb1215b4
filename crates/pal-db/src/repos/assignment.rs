//! Batch group creation: interactive assignment and spreadsheet import.
//!
//! Both entry points plan with [`pal_core::assignment::plan_groups`] and
//! commit the whole plan in one transaction. `assign` keeps the session's
//! existing groups; `import_matrix` deletes them first.

use pal_core::assignment::{
    AssignmentOutcome, AssignmentPlan, AssignmentRequest, AssignmentWarning, plan_groups,
};
use pal_core::audit_detail::GroupsDetail;
use pal_core::enums::{AuditAction, EntityType};
use pal_core::matrix::{Matrix, parse_matrix};

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::service::PalService;

/// What to do with the session's existing groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Keep,
    Replace,
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl PalService {
    /// Create dive groups for a session from explicit assignments.
    ///
    /// Groups whose members resolve no training section are skipped with a
    /// warning; all other groups are committed together. Existing groups of
    /// the session are kept.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sessions, or a storage
    /// error, in which case nothing is committed.
    pub async fn assign(
        &self,
        session_id: &str,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome, DatabaseError> {
        let roster = self.session_roster(session_id).await?;
        let plan = plan_groups(&roster, request);
        self.commit_plan(session_id, plan, Vec::new(), Existing::Keep)
            .await
    }

    /// Replace all groups of a session with those described by a roster
    /// spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sessions, or a storage
    /// error, in which case the previous groups are left untouched.
    pub async fn import_matrix(
        &self,
        session_id: &str,
        matrix: &Matrix,
    ) -> Result<AssignmentOutcome, DatabaseError> {
        let roster = self.session_roster(session_id).await?;
        let parsed = parse_matrix(matrix, &roster);
        let plan = plan_groups(&roster, &parsed.request);
        self.commit_plan(session_id, plan, parsed.warnings, Existing::Replace)
            .await
    }

    async fn commit_plan(
        &self,
        session_id: &str,
        plan: AssignmentPlan,
        mut warnings: Vec<AssignmentWarning>,
        existing: Existing,
    ) -> Result<AssignmentOutcome, DatabaseError> {
        warnings.extend(plan.warnings);
        for warning in &warnings {
            tracing::warn!(session_id, %warning, "assignment warning");
        }

        let now = now();
        let tx = self.db().begin_write().await?;
        let result = async {
            let removed = match existing {
                Existing::Keep => 0,
                Existing::Replace => self.delete_session_groups(&tx, session_id).await?,
            };

            let mut groups = Vec::with_capacity(plan.groups.len());
            for planned in &plan.groups {
                groups.push(
                    self.insert_planned_group(&tx, session_id, planned, now)
                        .await?,
                );
            }

            let action = match existing {
                Existing::Keep => AuditAction::GroupsCreated,
                Existing::Replace => AuditAction::GroupsReplaced,
            };
            let detail = GroupsDetail {
                group_ids: groups.iter().map(|g| g.id.clone()).collect(),
                memberships: count(plan.groups.iter().map(|g| g.members.len()).sum()),
                warnings: count(warnings.len()),
                removed,
            };
            self.audit(
                &tx,
                Some(session_id),
                EntityType::Session,
                session_id,
                action,
                Some(&detail),
                now,
            )
            .await?;
            Ok::<_, DatabaseError>((groups, removed))
        }
        .await;
        let (groups, removed) = tx.finish(result).await?;

        tracing::info!(
            session_id,
            groups = groups.len(),
            removed,
            warnings = warnings.len(),
            "dive groups committed"
        );
        Ok(AssignmentOutcome { groups, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::seeded_service;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn assign_creates_one_group_per_supervisor() {
        let (svc, seed) = seeded_service().await;
        let outcome = svc
            .assign(&seed.session.id, &seed.all_to_supervisor())
            .await
            .unwrap();

        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.section_id, seed.section.id);
        assert_eq!(group.supervisor_id.as_deref(), Some(seed.supervisor.id.as_str()));
        assert_eq!(group.name, "Palanquée Marc Leroy");
        assert_eq!(svc.group_members(&group.id).await.unwrap().len(), 3);
        assert_eq!(svc.get_group(&group.id).await.unwrap(), *group);
    }

    #[tokio::test]
    async fn assign_is_additive() {
        let (svc, seed) = seeded_service().await;
        svc.assign(&seed.session.id, &seed.all_to_supervisor())
            .await
            .unwrap();
        svc.assign(&seed.session.id, &seed.all_to_supervisor())
            .await
            .unwrap();
        assert_eq!(svc.list_groups(&seed.session.id).await.unwrap().len(), 2);

        let audit = svc
            .query_audit(&AuditFilter {
                session_id: Some(seed.session.id.clone()),
                action: Some(AuditAction::GroupsCreated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].detail.as_ref().unwrap()["memberships"], 3);
    }

    #[tokio::test]
    async fn unknown_session_commits_nothing() {
        let (svc, seed) = seeded_service().await;
        let err = svc
            .assign("ses-missing", &seed.all_to_supervisor())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert!(svc.query_audit(&AuditFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_replaces_existing_groups() {
        let (svc, seed) = seeded_service().await;
        let first = svc
            .assign(&seed.session.id, &seed.all_to_supervisor())
            .await
            .unwrap();

        let matrix = Matrix::from_rows([
            vec!["Sortie fosse"],
            vec!["", "", "", "", "Marc Leroy"],
            vec!["Plongeur", "", "", "Prof."],
            vec!["Alice Martin", "", "", "12 m", "X"],
            vec!["Bruno Garnier", "", "", "6", "X"],
            vec!["Inconnu Total", "", "", "", "X"],
        ]);
        let outcome = svc.import_matrix(&seed.session.id, &matrix).await.unwrap();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].limits.max_depth, Some(6));
        assert!(outcome.warnings.contains(&AssignmentWarning::UnknownDiverName {
            name: "Inconnu Total".into(),
            row: 6,
        }));
        assert!(outcome.warnings.contains(&AssignmentWarning::Unassigned {
            diver_id: seed.students[2].id.clone(),
        }));

        let groups = svc.list_groups(&seed.session.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_ne!(groups[0].id, first.groups[0].id);
        assert!(matches!(
            svc.get_group(&first.groups[0].id).await,
            Err(DatabaseError::NotFound { .. })
        ));

        let audit = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::GroupsReplaced),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(audit[0].detail.as_ref().unwrap()["removed"], 1);
    }
}
