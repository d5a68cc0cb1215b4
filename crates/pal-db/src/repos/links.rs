//! Evaluation link lifecycle.
//!
//! ```text
//! generate ──► active ──submit (grid complete)──► closed
//!                │  └────generate (superseded)───► closed
//!                └──clock passes expires_at──► expired (derived)
//! ```
//!
//! At most one link per group is valid; the partial unique index on
//! `evaluation_links(group_id) WHERE valid = 1` enforces it at storage level.
//! Every `*_at` variant takes the current instant explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pal_core::audit_detail::{EvaluationsSavedDetail, LinkClosedDetail, LinkGeneratedDetail};
use pal_core::entities::{
    Competency, DiveGroup, DiveSession, EvaluationLink, GroupEvaluation, Person,
};
use pal_core::enums::{AuditAction, EntityType, LinkState};
use pal_core::ids::PREFIX_LINK;
use pal_core::notify::LinkNotifier;
use pal_core::rating::RatingSheet;
use pal_core::reports::LinkNotice;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, now, parse_datetime};
use crate::repos::evaluations::{
    SubmissionProgress, count_progress, sheet_size, upsert_cells, validate_sheet,
};
use crate::service::PalService;
use crate::tokens::new_token;

/// Result of presenting a token. Unknown, closed and expired tokens are
/// ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum LinkOutcome<T> {
    Ready(T),
    NotFound,
    Expired,
}

impl<T> LinkOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NotFound | Self::Expired => None,
        }
    }
}

/// What the public evaluation page shows for an active link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAccess {
    pub link: EvaluationLink,
    pub url: String,
    pub group: DiveGroup,
    pub session: DiveSession,
    pub supervisor: Option<Person>,
    pub members: Vec<Person>,
    pub competencies: Vec<Competency>,
    pub ratings: Vec<GroupEvaluation>,
    pub progress: SubmissionProgress,
}

/// Links of one group: the one to hand out and those already used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLinks {
    /// The valid link, else the most recent one.
    pub current: Option<EvaluationLink>,
    /// Closed links, newest first, excluding `current`.
    pub used: Vec<EvaluationLink>,
}

const LINK_COLUMNS: &str = "id, group_id, token, created_at, expires_at, valid";

fn row_to_link(row: &libsql::Row) -> Result<EvaluationLink, DatabaseError> {
    Ok(EvaluationLink {
        id: row.get::<String>(0)?,
        group_id: row.get::<String>(1)?,
        token: row.get::<String>(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
        expires_at: parse_datetime(&row.get::<String>(4)?)?,
        valid: row.get::<i64>(5)? != 0,
    })
}

async fn link_by_token(
    conn: &libsql::Connection,
    token: &str,
) -> Result<Option<EvaluationLink>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {LINK_COLUMNS} FROM evaluation_links WHERE token = ?1"),
            [token],
        )
        .await?;
    rows.next().await?.map(|row| row_to_link(&row)).transpose()
}

async fn valid_link_of(
    conn: &libsql::Connection,
    group_id: &str,
) -> Result<Option<EvaluationLink>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {LINK_COLUMNS} FROM evaluation_links WHERE group_id = ?1 AND valid = 1"),
            [group_id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_link(&row)).transpose()
}

/// Map a link state to the outcome a caller sees, `None` when usable.
fn refusal<T>(link: Option<&EvaluationLink>, now: DateTime<Utc>) -> Option<LinkOutcome<T>> {
    match link.map(|l| l.state_at(now)) {
        None | Some(LinkState::Closed) => Some(LinkOutcome::NotFound),
        Some(LinkState::Expired) => Some(LinkOutcome::Expired),
        Some(LinkState::Active) => None,
    }
}

impl PalService {
    /// Issue a new link for a group, closing the previous valid one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown groups, or a storage
    /// error, in which case the previous link stays valid.
    pub async fn generate_link(&self, group_id: &str) -> Result<EvaluationLink, DatabaseError> {
        self.generate_link_at(group_id, now()).await
    }

    /// [`generate_link`](Self::generate_link) at instant `now`.
    ///
    /// # Errors
    ///
    /// See [`generate_link`](Self::generate_link).
    pub async fn generate_link_at(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationLink, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let expires_at = now
            .checked_add_signed(self.link_settings().ttl)
            .ok_or_else(|| {
                DatabaseError::Validation(format!(
                    "link lifetime of {} days is out of range",
                    self.link_settings().ttl.num_days()
                ))
            })?;
        let link = EvaluationLink {
            id: self.db().generate_id(PREFIX_LINK).await?,
            group_id: group_id.to_string(),
            token: new_token()?,
            created_at: now,
            expires_at,
            valid: true,
        };

        let tx = self.db().begin_write().await?;
        let result = async {
            let previous = valid_link_of(&tx, group_id).await?;
            if let Some(previous) = &previous {
                tx.execute(
                    "UPDATE evaluation_links SET valid = 0 WHERE id = ?1",
                    [previous.id.as_str()],
                )
                .await?;
                self.audit(
                    &tx,
                    Some(&group.session_id),
                    EntityType::EvaluationLink,
                    &previous.id,
                    AuditAction::LinkClosed,
                    Some(&LinkClosedDetail {
                        group_id: group_id.to_string(),
                        reason: "superseded".into(),
                    }),
                    now,
                )
                .await?;
            }

            tx.execute(
                "INSERT INTO evaluation_links (id, group_id, token, created_at, expires_at, valid)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                libsql::params![
                    link.id.as_str(),
                    group_id,
                    link.token.as_str(),
                    format_datetime(link.created_at),
                    format_datetime(link.expires_at)
                ],
            )
            .await?;
            self.audit(
                &tx,
                Some(&group.session_id),
                EntityType::EvaluationLink,
                &link.id,
                AuditAction::LinkGenerated,
                Some(&LinkGeneratedDetail {
                    group_id: group_id.to_string(),
                    superseded_link_id: previous.as_ref().map(|p| p.id.clone()),
                    expires_at: format_datetime(link.expires_at),
                }),
                now,
            )
            .await?;
            Ok::<_, DatabaseError>(previous)
        }
        .await;
        let previous = tx.finish(result).await?;

        tracing::info!(
            group_id,
            link_id = %link.id,
            superseded = previous.as_ref().map(|p| p.id.as_str()),
            "evaluation link generated"
        );
        Ok(link)
    }

    /// Resolve a token for display. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` only on storage failure.
    pub async fn access_link(&self, token: &str) -> Result<LinkOutcome<LinkAccess>, DatabaseError> {
        self.access_link_at(token, now()).await
    }

    /// [`access_link`](Self::access_link) at instant `now`.
    ///
    /// # Errors
    ///
    /// See [`access_link`](Self::access_link).
    pub async fn access_link_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<LinkOutcome<LinkAccess>, DatabaseError> {
        let link = link_by_token(self.db().conn(), token).await?;
        if let Some(outcome) = refusal(link.as_ref(), now) {
            return Ok(outcome);
        }
        let Some(link) = link else {
            return Ok(LinkOutcome::NotFound);
        };

        let group = self.get_group(&link.group_id).await?;
        let session = self.get_session(&group.session_id).await?;
        let supervisor = match &group.supervisor_id {
            Some(id) => Some(self.get_person(id).await?),
            None => None,
        };
        let (saved, expected) = count_progress(self.db().conn(), &group.id).await?;

        Ok(LinkOutcome::Ready(LinkAccess {
            url: self.link_settings().url_for(&link.token),
            members: self.group_divers(&group.id).await?,
            competencies: self.planned_competencies(&group.id).await?,
            ratings: self.group_evaluations(&group.id).await?,
            progress: SubmissionProgress {
                saved,
                expected,
                closed: false,
            },
            link,
            group,
            session,
            supervisor,
        }))
    }

    /// Save ratings through a link. Partial sheets are accepted; the link
    /// closes once every member has a rating on every planned competency.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` if any cell is outside the group's
    /// members × planned competencies (nothing is saved), or a storage error.
    pub async fn submit_link(
        &self,
        token: &str,
        sheet: &RatingSheet,
    ) -> Result<LinkOutcome<SubmissionProgress>, DatabaseError> {
        self.submit_link_at(token, sheet, now()).await
    }

    /// [`submit_link`](Self::submit_link) at instant `now`.
    ///
    /// # Errors
    ///
    /// See [`submit_link`](Self::submit_link).
    pub async fn submit_link_at(
        &self,
        token: &str,
        sheet: &RatingSheet,
        now: DateTime<Utc>,
    ) -> Result<LinkOutcome<SubmissionProgress>, DatabaseError> {
        let tx = self.db().begin_write().await?;
        let result = async {
            let link = link_by_token(&tx, token).await?;
            if let Some(outcome) = refusal(link.as_ref(), now) {
                return Ok(outcome);
            }
            let Some(link) = link else {
                return Ok(LinkOutcome::NotFound);
            };
            let group = self.get_group(&link.group_id).await?;

            validate_sheet(&tx, &group.id, sheet).await?;
            upsert_cells(&tx, &group.id, sheet, now).await?;
            let (saved, expected) = count_progress(&tx, &group.id).await?;
            let closed = saved == expected;

            if closed {
                tx.execute(
                    "UPDATE evaluation_links SET valid = 0 WHERE id = ?1",
                    [link.id.as_str()],
                )
                .await?;
                self.audit(
                    &tx,
                    Some(&group.session_id),
                    EntityType::EvaluationLink,
                    &link.id,
                    AuditAction::LinkClosed,
                    Some(&LinkClosedDetail {
                        group_id: group.id.clone(),
                        reason: "completed".into(),
                    }),
                    now,
                )
                .await?;
            }
            self.audit(
                &tx,
                Some(&group.session_id),
                EntityType::DiveGroup,
                &group.id,
                AuditAction::EvaluationsSaved,
                Some(&EvaluationsSavedDetail {
                    submitted: sheet_size(sheet),
                    saved,
                    expected,
                    via_link: true,
                }),
                now,
            )
            .await?;

            tracing::info!(group_id = %group.id, saved, expected, closed, "link submission saved");
            Ok::<_, DatabaseError>(LinkOutcome::Ready(SubmissionProgress {
                saved,
                expected,
                closed,
            }))
        }
        .await;
        tx.finish(result).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn group_links(&self, group_id: &str) -> Result<GroupLinks, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {LINK_COLUMNS} FROM evaluation_links
                     WHERE group_id = ?1 ORDER BY created_at DESC, rowid DESC"
                ),
                [group_id],
            )
            .await?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(row_to_link(&row)?);
        }

        let current_idx = links
            .iter()
            .position(|l| l.valid)
            .or_else(|| (!links.is_empty()).then_some(0));
        let current = current_idx.map(|i| links.remove(i));
        Ok(GroupLinks {
            current,
            used: links.into_iter().filter(|l| !l.valid).collect(),
        })
    }

    /// Tell a group's supervisor where to rate it.
    ///
    /// Delivery failures are logged and do not fail the call.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when the group has no link, no
    /// supervisor, or the supervisor no e-mail address.
    pub async fn notify_supervisor(
        &self,
        group_id: &str,
        notifier: &dyn LinkNotifier,
    ) -> Result<LinkNotice, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let link = self.group_links(group_id).await?.current.ok_or_else(|| {
            DatabaseError::Validation(format!("group {group_id} has no evaluation link"))
        })?;
        let supervisor_id = group.supervisor_id.as_deref().ok_or_else(|| {
            DatabaseError::Validation(format!("group {group_id} has no supervisor"))
        })?;
        let supervisor = self.get_person(supervisor_id).await?;
        let recipient = supervisor.email.clone().ok_or_else(|| {
            DatabaseError::Validation(format!("supervisor {supervisor_id} has no e-mail address"))
        })?;
        let session = self.get_session(&group.session_id).await?;

        let notice = LinkNotice {
            recipient,
            supervisor_name: supervisor.full_name(),
            group_name: group.name,
            session_date: session.date,
            location: session.location,
            url: self.link_settings().url_for(&link.token),
            expires_at: link.expires_at,
        };
        if let Err(error) = notifier.deliver(&notice) {
            tracing::warn!(group_id, %error, "link notification failed");
        }
        Ok(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{planned_group, seeded_service};
    use chrono::Duration;
    use pal_core::notify::NotifyError;
    use pal_core::rating::Rating;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<LinkNotice>>,
        fail: bool,
    }

    impl LinkNotifier for Recording {
        fn deliver(&self, notice: &LinkNotice) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("smtp down".into()));
            }
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn generate_supersedes_previous_link() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;

        let first = svc.generate_link(&group.id).await.unwrap();
        let second = svc.generate_link(&group.id).await.unwrap();
        assert_ne!(first.token, second.token);

        let links = svc.group_links(&group.id).await.unwrap();
        assert_eq!(links.current.as_ref().map(|l| l.id.as_str()), Some(second.id.as_str()));
        assert_eq!(links.used.len(), 1);
        assert!(!links.used[0].valid);

        assert_eq!(svc.access_link(&first.token).await.unwrap(), LinkOutcome::NotFound);
        assert!(svc.access_link(&second.token).await.unwrap().ready().is_some());

        let closed = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::LinkClosed),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].entity_id, first.id);
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_rejected() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;

        let err = svc
            .generate_link_at(&group.id, DateTime::<Utc>::MAX_UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)), "{err:?}");
        assert_eq!(svc.group_links(&group.id).await.unwrap(), GroupLinks::default());
    }

    #[tokio::test]
    async fn access_shows_grid() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;
        let link = svc.generate_link(&group.id).await.unwrap();

        let access = svc.access_link(&link.token).await.unwrap().ready().unwrap();
        assert_eq!(access.members.len(), 3);
        assert_eq!(access.competencies.len(), 2);
        assert_eq!(access.progress.expected, 6);
        assert_eq!(access.url, format!("/evaluation/{}/", link.token));
        assert_eq!(access.supervisor.map(|s| s.id), Some(seed.supervisor.id));
    }

    #[tokio::test]
    async fn submission_on_dead_links_saves_nothing() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;
        let link = svc.generate_link(&group.id).await.unwrap();

        let mut sheet = RatingSheet::new();
        sheet.rate(
            &seed.students[0].id,
            &seed.competency_ids()[0],
            Rating::try_from(3u8).unwrap(),
            "",
        );

        let late = link.expires_at + Duration::seconds(1);
        let outcome = svc.submit_link_at(&link.token, &sheet, late).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Expired);
        let outcome = svc.submit_link(&"x".repeat(43), &sheet).await.unwrap();
        assert_eq!(outcome, LinkOutcome::NotFound);
        assert!(svc.group_evaluations(&group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notify_builds_notice_and_survives_delivery_failure() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;

        let err = svc
            .notify_supervisor(&group.id, &Recording::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let link = svc.generate_link(&group.id).await.unwrap();
        let recorder = Recording::default();
        let notice = svc.notify_supervisor(&group.id, &recorder).await.unwrap();
        assert_eq!(notice.recipient, "marc.leroy@club.example");
        assert_eq!(notice.supervisor_name, "Marc Leroy");
        assert_eq!(notice.session_date, seed.session.date);
        assert_eq!(notice.expires_at, link.expires_at);
        assert!(notice.url.contains(&link.token));
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);

        let failing = Recording {
            fail: true,
            ..Recording::default()
        };
        assert!(svc.notify_supervisor(&group.id, &failing).await.is_ok());
    }

    #[tokio::test]
    async fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(LinkOutcome::<SubmissionProgress>::Expired).unwrap();
        assert_eq!(json["outcome"], "expired");
        let ready = serde_json::to_value(LinkOutcome::Ready(SubmissionProgress {
            saved: 1,
            expected: 2,
            closed: false,
        }))
        .unwrap();
        assert_eq!(ready["outcome"], "ready");
        assert_eq!(ready["data"]["expected"], 2);
    }
}
