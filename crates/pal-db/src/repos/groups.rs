//! Dive group repository: groups, memberships and planned competencies.
//!
//! Groups are created in batches by `repos::assignment`; this module holds
//! the row-level helpers those batches share and the manual edits
//! (plan, aptitude, membership) made afterwards.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pal_core::assignment::PlannedGroup;
use pal_core::entities::{Competency, DiveGroup, GroupLimits, GroupMembership, Person};
use pal_core::enums::{AuditAction, EntityType};
use pal_core::ids::PREFIX_DIVE_GROUP;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, get_opt_u32, now, parse_datetime};
use crate::repos::curriculum::{COMPETENCY_COLUMNS, row_to_competency};
use crate::repos::people::{PERSON_COLUMNS, row_to_person};
use crate::service::PalService;

const GROUP_COLUMNS: &str = "g.id, g.session_id, g.name, g.supervisor_id, g.section_id, \
     g.max_depth, g.max_duration, g.exercise_notes, g.created_at";

fn row_to_group(row: &libsql::Row) -> Result<DiveGroup, DatabaseError> {
    Ok(DiveGroup {
        id: row.get::<String>(0)?,
        session_id: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        supervisor_id: get_opt_string(row, 3)?,
        section_id: row.get::<String>(4)?,
        limits: GroupLimits {
            max_depth: get_opt_u32(row, 5)?,
            max_duration: get_opt_u32(row, 6)?,
        },
        exercise_notes: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

fn normalize_aptitude(aptitude: Option<&str>) -> Option<&str> {
    aptitude.map(str::trim).filter(|a| !a.is_empty())
}

#[derive(Serialize)]
struct MembershipDetail<'a> {
    group_id: &'a str,
    diver_id: &'a str,
    change: &'a str,
}

#[derive(Serialize)]
struct PlanDetail<'a> {
    competency_ids: &'a [String],
    exercise_notes: Option<&'a str>,
}

impl PalService {
    // -----------------------------------------------------------------------
    // Batch helpers (run inside the caller's transaction)
    // -----------------------------------------------------------------------

    /// Insert a planned group and its memberships.
    pub(crate) async fn insert_planned_group(
        &self,
        conn: &libsql::Connection,
        session_id: &str,
        planned: &PlannedGroup,
        now: DateTime<Utc>,
    ) -> Result<DiveGroup, DatabaseError> {
        let id = self.db().generate_id(PREFIX_DIVE_GROUP).await?;
        conn.execute(
            "INSERT INTO dive_groups (id, session_id, name, supervisor_id, section_id, max_depth, max_duration, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                id.as_str(),
                session_id,
                planned.name.as_str(),
                planned.supervisor_id.as_deref(),
                planned.section_id.as_str(),
                planned.limits.max_depth.map(i64::from),
                planned.limits.max_duration.map(i64::from),
                format_datetime(now)
            ],
        )
        .await?;

        for member in &planned.members {
            conn.execute(
                "INSERT INTO group_memberships (group_id, diver_id, aptitude) VALUES (?1, ?2, ?3)",
                libsql::params![
                    id.as_str(),
                    member.diver_id.as_str(),
                    normalize_aptitude(member.aptitude.as_deref())
                ],
            )
            .await?;
        }

        Ok(DiveGroup {
            id,
            session_id: session_id.to_string(),
            name: planned.name.clone(),
            supervisor_id: planned.supervisor_id.clone(),
            section_id: planned.section_id.clone(),
            limits: planned.limits,
            exercise_notes: None,
            created_at: now,
        })
    }

    /// Delete every group of a session; memberships, plans, cells and links
    /// cascade. Returns the number of groups removed.
    pub(crate) async fn delete_session_groups(
        &self,
        conn: &libsql::Connection,
        session_id: &str,
    ) -> Result<u32, DatabaseError> {
        let removed = conn
            .execute("DELETE FROM dive_groups WHERE session_id = ?1", [session_id])
            .await?;
        u32::try_from(removed)
            .map_err(|_| DatabaseError::InvalidState(format!("removed {removed} groups")))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_group(&self, id: &str) -> Result<DiveGroup, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {GROUP_COLUMNS} FROM dive_groups g WHERE g.id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("dive group", id))?;
        row_to_group(&row)
    }

    /// Groups of a session in creation order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_groups(&self, session_id: &str) -> Result<Vec<DiveGroup>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {GROUP_COLUMNS} FROM dive_groups g
                     WHERE g.session_id = ?1 ORDER BY g.rowid"
                ),
                [session_id],
            )
            .await?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().await? {
            groups.push(row_to_group(&row)?);
        }
        Ok(groups)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMembership>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT group_id, diver_id, aptitude FROM group_memberships
                 WHERE group_id = ?1 ORDER BY rowid",
                [group_id],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(GroupMembership {
                group_id: row.get::<String>(0)?,
                diver_id: row.get::<String>(1)?,
                aptitude: get_opt_string(&row, 2)?,
            });
        }
        Ok(members)
    }

    /// The divers of a group, in membership order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn group_divers(&self, group_id: &str) -> Result<Vec<Person>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PERSON_COLUMNS} FROM group_memberships m
                     JOIN people p ON p.id = m.diver_id
                     WHERE m.group_id = ?1 ORDER BY m.rowid"
                ),
                [group_id],
            )
            .await?;
        let mut people = Vec::new();
        while let Some(row) = rows.next().await? {
            people.push(row_to_person(&row)?);
        }
        self.with_sections(people).await
    }

    /// Competencies planned for a group: the columns of its rating grid.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn planned_competencies(
        &self,
        group_id: &str,
    ) -> Result<Vec<Competency>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {COMPETENCY_COLUMNS} FROM group_competencies gc
                     JOIN competencies c ON c.id = gc.competency_id
                     WHERE gc.group_id = ?1 ORDER BY gc.rowid"
                ),
                [group_id],
            )
            .await?;
        let mut competencies = Vec::new();
        while let Some(row) = rows.next().await? {
            competencies.push(row_to_competency(&row)?);
        }
        Ok(competencies)
    }

    // -----------------------------------------------------------------------
    // Manual edits
    // -----------------------------------------------------------------------

    /// Replace the planned competencies and exercise notes of a group.
    ///
    /// Every competency must belong to the group's section. Repeated IDs are
    /// kept once.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for competencies outside the
    /// section, `NotFound` for unknown groups.
    pub async fn set_group_plan(
        &self,
        group_id: &str,
        competency_ids: &[String],
        exercise_notes: Option<&str>,
    ) -> Result<Vec<Competency>, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let candidates = self.candidate_competencies(&group.section_id).await?;

        let mut seen = HashSet::new();
        let mut planned = Vec::new();
        for id in competency_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let competency = candidates.iter().find(|c| &c.id == id).ok_or_else(|| {
                DatabaseError::Validation(format!(
                    "competency {id} is not part of section {}",
                    group.section_id
                ))
            })?;
            planned.push(competency.clone());
        }
        let notes = exercise_notes.map(str::trim).filter(|n| !n.is_empty());
        let planned_ids: Vec<String> = planned.iter().map(|c| c.id.clone()).collect();

        let tx = self.db().begin_write().await?;
        let result = async {
            tx.execute("DELETE FROM group_competencies WHERE group_id = ?1", [group_id])
                .await?;
            for id in &planned_ids {
                tx.execute(
                    "INSERT INTO group_competencies (group_id, competency_id) VALUES (?1, ?2)",
                    [group_id, id.as_str()],
                )
                .await?;
            }
            tx.execute(
                "UPDATE dive_groups SET exercise_notes = ?1 WHERE id = ?2",
                libsql::params![notes, group_id],
            )
            .await?;
            self.audit(
                &tx,
                Some(&group.session_id),
                EntityType::DiveGroup,
                group_id,
                AuditAction::PlanUpdated,
                Some(&PlanDetail {
                    competency_ids: &planned_ids,
                    exercise_notes: notes,
                }),
                now(),
            )
            .await
        }
        .await;
        tx.finish(result).await?;

        Ok(planned)
    }

    /// Add a student to an existing group.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` if the person is not a student,
    /// `Conflict` if already a member.
    pub async fn add_membership(
        &self,
        group_id: &str,
        diver_id: &str,
        aptitude: Option<&str>,
    ) -> Result<GroupMembership, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let diver = self.get_person(diver_id).await?;
        if !diver.is_student() {
            return Err(DatabaseError::Validation(format!(
                "{diver_id} is not a student"
            )));
        }
        let aptitude = normalize_aptitude(aptitude);

        let tx = self.db().begin_write().await?;
        let result = async {
            tx.execute(
                "INSERT INTO group_memberships (group_id, diver_id, aptitude) VALUES (?1, ?2, ?3)",
                libsql::params![group_id, diver_id, aptitude],
            )
            .await?;
            self.audit_membership(&tx, &group, diver_id, "added").await
        }
        .await;
        tx.finish(result).await?;

        Ok(GroupMembership {
            group_id: group_id.to_string(),
            diver_id: diver_id.to_string(),
            aptitude: aptitude.map(str::to_string),
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the diver is not in the group.
    pub async fn set_membership_aptitude(
        &self,
        group_id: &str,
        diver_id: &str,
        aptitude: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let group = self.get_group(group_id).await?;
        let tx = self.db().begin_write().await?;
        let result = async {
            let changed = tx
                .execute(
                    "UPDATE group_memberships SET aptitude = ?1 WHERE group_id = ?2 AND diver_id = ?3",
                    libsql::params![normalize_aptitude(aptitude), group_id, diver_id],
                )
                .await?;
            if changed == 0 {
                return Err(DatabaseError::not_found(
                    "membership",
                    format!("{group_id}/{diver_id}"),
                ));
            }
            self.audit_membership(&tx, &group, diver_id, "aptitude").await
        }
        .await;
        tx.finish(result).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the diver is not in the group.
    pub async fn remove_membership(
        &self,
        group_id: &str,
        diver_id: &str,
    ) -> Result<(), DatabaseError> {
        let group = self.get_group(group_id).await?;
        let tx = self.db().begin_write().await?;
        let result = async {
            let removed = tx
                .execute(
                    "DELETE FROM group_memberships WHERE group_id = ?1 AND diver_id = ?2",
                    [group_id, diver_id],
                )
                .await?;
            if removed == 0 {
                return Err(DatabaseError::not_found(
                    "membership",
                    format!("{group_id}/{diver_id}"),
                ));
            }
            self.audit_membership(&tx, &group, diver_id, "removed").await
        }
        .await;
        tx.finish(result).await
    }

    async fn audit_membership(
        &self,
        conn: &libsql::Connection,
        group: &DiveGroup,
        diver_id: &str,
        change: &str,
    ) -> Result<(), DatabaseError> {
        self.audit(
            conn,
            Some(&group.session_id),
            EntityType::Membership,
            &group.id,
            AuditAction::MembershipChanged,
            Some(&MembershipDetail {
                group_id: &group.id,
                diver_id,
                change,
            }),
            now(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{seeded_service, Seed};

    async fn seeded_group() -> (PalService, Seed, DiveGroup) {
        let (svc, seed) = seeded_service().await;
        let outcome = svc.assign(&seed.session.id, &seed.all_to_supervisor()).await.unwrap();
        let group = outcome.groups.into_iter().next().unwrap();
        (svc, seed, group)
    }

    #[tokio::test]
    async fn plan_is_validated_against_section() {
        let (svc, seed, group) = seeded_group().await;
        let foreign_section = svc.create_section("prepa_niveau2", "Prépa N2", None).await.unwrap();
        let foreign_group = svc
            .create_competency_group(&foreign_section.id, "Autonomie", None)
            .await
            .unwrap();
        let foreign = svc
            .create_competency(&foreign_group.id, "Orientation", None)
            .await
            .unwrap();

        let err = svc
            .set_group_plan(&group.id, &[foreign.id], None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let ids = seed.competency_ids();
        let doubled = [ids.clone(), ids.clone()].concat();
        let planned = svc
            .set_group_plan(&group.id, &doubled, Some("  remontée assistée "))
            .await
            .unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(svc.planned_competencies(&group.id).await.unwrap(), planned);
        assert_eq!(
            svc.get_group(&group.id).await.unwrap().exercise_notes.as_deref(),
            Some("remontée assistée")
        );

        let audit = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::PlanUpdated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn membership_edits() {
        let (svc, seed, group) = seeded_group().await;
        let diver = &seed.students[0];

        svc.set_membership_aptitude(&group.id, &diver.id, Some("PE20"))
            .await
            .unwrap();
        let members = svc.group_members(&group.id).await.unwrap();
        assert_eq!(members[0].aptitude.as_deref(), Some("PE20"));

        let err = svc.add_membership(&group.id, &diver.id, None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");

        let err = svc
            .add_membership(&group.id, &seed.supervisor.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        svc.remove_membership(&group.id, &diver.id).await.unwrap();
        assert_eq!(svc.group_members(&group.id).await.unwrap().len(), 2);
        let err = svc.remove_membership(&group.id, &diver.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));

        let back = svc.add_membership(&group.id, &diver.id, Some(" ")).await.unwrap();
        assert_eq!(back.aptitude, None);
        let divers = svc.group_divers(&group.id).await.unwrap();
        assert_eq!(divers.last().map(|p| p.id.as_str()), Some(diver.id.as_str()));
    }
}
