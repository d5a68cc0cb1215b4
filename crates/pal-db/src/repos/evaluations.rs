//! Evaluations: the per-group rating grid and the exercise evaluation log.
//!
//! The grid holds one overwritten cell per (group, diver, planned
//! competency). The exercise log is append-only; progression reads its
//! latest entry per exercise.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pal_core::audit_detail::EvaluationsSavedDetail;
use pal_core::entities::{ExerciseEvaluation, GroupEvaluation};
use pal_core::enums::{AuditAction, EntityType};
use pal_core::ids::PREFIX_EVALUATION;
use pal_core::rating::{Rating, RatingSheet};

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, now, parse_datetime, parse_rating};
use crate::service::PalService;

/// Completion of a group's rating grid after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionProgress {
    /// Rated cells currently present for the group's members and plan.
    pub saved: u32,
    /// Members × planned competencies.
    pub expected: u32,
    /// Whether this submission closed the evaluation link.
    pub closed: bool,
}

impl SubmissionProgress {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.saved == self.expected
    }
}

/// Input for [`PalService::record_exercise_evaluation`].
#[derive(Debug, Clone)]
pub struct NewExerciseEvaluation {
    pub diver_id: String,
    pub exercise_id: String,
    pub supervisor_id: Option<String>,
    pub rating: Rating,
    pub comment: String,
    /// Defaults to now.
    pub evaluated_at: Option<DateTime<Utc>>,
}

const EXERCISE_EVALUATION_COLUMNS: &str =
    "id, diver_id, exercise_id, supervisor_id, rating, comment, evaluated_at";

fn row_to_exercise_evaluation(row: &libsql::Row) -> Result<ExerciseEvaluation, DatabaseError> {
    Ok(ExerciseEvaluation {
        id: row.get::<String>(0)?,
        diver_id: row.get::<String>(1)?,
        exercise_id: row.get::<String>(2)?,
        supervisor_id: get_opt_string(row, 3)?,
        rating: parse_rating(row.get::<i64>(4)?)?,
        comment: row.get::<String>(5)?,
        evaluated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

async fn single_count(
    conn: &libsql::Connection,
    sql: &str,
    group_id: &str,
) -> Result<u32, DatabaseError> {
    let mut rows = conn.query(sql, [group_id]).await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    let n = row.get::<i64>(0)?;
    u32::try_from(n).map_err(|_| DatabaseError::InvalidState(format!("count out of range: {n}")))
}

async fn column_ids(
    conn: &libsql::Connection,
    sql: &str,
    group_id: &str,
) -> Result<HashSet<String>, DatabaseError> {
    let mut rows = conn.query(sql, [group_id]).await?;
    let mut ids = HashSet::new();
    while let Some(row) = rows.next().await? {
        ids.insert(row.get::<String>(0)?);
    }
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Grid helpers shared with link submission (run inside a transaction)
// ---------------------------------------------------------------------------

/// Reject the whole sheet if any cell is outside members × planned competencies.
pub(crate) async fn validate_sheet(
    conn: &libsql::Connection,
    group_id: &str,
    sheet: &RatingSheet,
) -> Result<(), DatabaseError> {
    let divers = column_ids(
        conn,
        "SELECT diver_id FROM group_memberships WHERE group_id = ?1",
        group_id,
    )
    .await?;
    let competencies = column_ids(
        conn,
        "SELECT competency_id FROM group_competencies WHERE group_id = ?1",
        group_id,
    )
    .await?;

    for (key, _) in sheet.iter() {
        if !divers.contains(&key.diver_id) {
            return Err(DatabaseError::Validation(format!(
                "diver {} is not a member of group {group_id}",
                key.diver_id
            )));
        }
        if !competencies.contains(&key.competency_id) {
            return Err(DatabaseError::Validation(format!(
                "competency {} is not planned for group {group_id}",
                key.competency_id
            )));
        }
    }
    Ok(())
}

/// Insert or overwrite every cell of the sheet.
pub(crate) async fn upsert_cells(
    conn: &libsql::Connection,
    group_id: &str,
    sheet: &RatingSheet,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let updated_at = format_datetime(now);
    for (key, cell) in sheet.iter() {
        conn.execute(
            "INSERT INTO group_evaluations (group_id, diver_id, competency_id, rating, comment, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (group_id, diver_id, competency_id) DO UPDATE SET
                rating = excluded.rating,
                comment = excluded.comment,
                updated_at = excluded.updated_at",
            libsql::params![
                group_id,
                key.diver_id.as_str(),
                key.competency_id.as_str(),
                i64::from(cell.rating.value()),
                cell.comment.as_str(),
                updated_at.as_str()
            ],
        )
        .await?;
        tracing::debug!(
            group_id,
            diver_id = %key.diver_id,
            competency_id = %key.competency_id,
            rating = cell.rating.value(),
            "cell saved"
        );
    }
    Ok(())
}

/// `(saved, expected)` for a group as currently persisted.
///
/// Cells of former members or unplanned competencies are not counted.
pub(crate) async fn count_progress(
    conn: &libsql::Connection,
    group_id: &str,
) -> Result<(u32, u32), DatabaseError> {
    let members = single_count(
        conn,
        "SELECT COUNT(*) FROM group_memberships WHERE group_id = ?1",
        group_id,
    )
    .await?;
    let planned = single_count(
        conn,
        "SELECT COUNT(*) FROM group_competencies WHERE group_id = ?1",
        group_id,
    )
    .await?;
    let saved = single_count(
        conn,
        "SELECT COUNT(*) FROM group_evaluations e
         JOIN group_memberships m ON m.group_id = e.group_id AND m.diver_id = e.diver_id
         JOIN group_competencies gc ON gc.group_id = e.group_id AND gc.competency_id = e.competency_id
         WHERE e.group_id = ?1",
        group_id,
    )
    .await?;
    Ok((saved, members.saturating_mul(planned)))
}

pub(crate) fn sheet_size(sheet: &RatingSheet) -> u32 {
    u32::try_from(sheet.len()).unwrap_or(u32::MAX)
}

impl PalService {
    /// Save ratings for a group from an authenticated session.
    ///
    /// Partial sheets are accepted. Unlike link submission this never closes
    /// a link.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` if any cell is outside the group's
    /// members × planned competencies (nothing is saved), `NotFound` for
    /// unknown groups.
    pub async fn save_group_evaluations(
        &self,
        group_id: &str,
        sheet: &RatingSheet,
    ) -> Result<SubmissionProgress, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let now = now();

        let tx = self.db().begin_write().await?;
        let result = async {
            validate_sheet(&tx, group_id, sheet).await?;
            upsert_cells(&tx, group_id, sheet, now).await?;
            let (saved, expected) = count_progress(&tx, group_id).await?;
            self.audit(
                &tx,
                Some(&group.session_id),
                EntityType::DiveGroup,
                group_id,
                AuditAction::EvaluationsSaved,
                Some(&EvaluationsSavedDetail {
                    submitted: sheet_size(sheet),
                    saved,
                    expected,
                    via_link: false,
                }),
                now,
            )
            .await?;
            Ok::<_, DatabaseError>(SubmissionProgress {
                saved,
                expected,
                closed: false,
            })
        }
        .await;
        tx.finish(result).await
    }

    /// Current grid of a group, in member then plan order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn group_evaluations(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupEvaluation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT e.group_id, e.diver_id, e.competency_id, e.rating, e.comment, e.updated_at
                 FROM group_evaluations e
                 JOIN group_memberships m ON m.group_id = e.group_id AND m.diver_id = e.diver_id
                 JOIN group_competencies gc ON gc.group_id = e.group_id AND gc.competency_id = e.competency_id
                 WHERE e.group_id = ?1
                 ORDER BY m.rowid, gc.rowid",
                [group_id],
            )
            .await?;
        let mut cells = Vec::new();
        while let Some(row) = rows.next().await? {
            cells.push(GroupEvaluation {
                group_id: row.get::<String>(0)?,
                diver_id: row.get::<String>(1)?,
                competency_id: row.get::<String>(2)?,
                rating: parse_rating(row.get::<i64>(3)?)?,
                comment: row.get::<String>(4)?,
                updated_at: parse_datetime(&row.get::<String>(5)?)?,
            });
        }
        Ok(cells)
    }

    /// Append an exercise evaluation to a diver's log.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` if the diver is not a student or
    /// the evaluator not a supervisor, `NotFound` for unknown references.
    pub async fn record_exercise_evaluation(
        &self,
        new: &NewExerciseEvaluation,
    ) -> Result<ExerciseEvaluation, DatabaseError> {
        let diver = self.get_person(&new.diver_id).await?;
        if !diver.is_student() {
            return Err(DatabaseError::Validation(format!(
                "{} is not a student",
                diver.id
            )));
        }
        self.get_exercise(&new.exercise_id).await?;
        if let Some(supervisor_id) = &new.supervisor_id {
            if !self.get_person(supervisor_id).await?.is_supervisor() {
                return Err(DatabaseError::Validation(format!(
                    "{supervisor_id} is not a supervisor"
                )));
            }
        }

        let evaluation = ExerciseEvaluation {
            id: self.db().generate_id(PREFIX_EVALUATION).await?,
            diver_id: new.diver_id.clone(),
            exercise_id: new.exercise_id.clone(),
            supervisor_id: new.supervisor_id.clone(),
            rating: new.rating,
            comment: new.comment.trim().to_string(),
            evaluated_at: new.evaluated_at.unwrap_or_else(now),
        };

        let tx = self.db().begin_write().await?;
        let result = async {
            tx.execute(
                "INSERT INTO exercise_evaluations (id, diver_id, exercise_id, supervisor_id, rating, comment, evaluated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    evaluation.id.as_str(),
                    evaluation.diver_id.as_str(),
                    evaluation.exercise_id.as_str(),
                    evaluation.supervisor_id.as_deref(),
                    i64::from(evaluation.rating.value()),
                    evaluation.comment.as_str(),
                    format_datetime(evaluation.evaluated_at)
                ],
            )
            .await?;
            self.audit(
                &tx,
                None,
                EntityType::Evaluation,
                &evaluation.id,
                AuditAction::ExerciseEvaluated,
                Some(&evaluation),
                now(),
            )
            .await
        }
        .await;
        tx.finish(result).await?;

        Ok(evaluation)
    }

    /// Evaluations of one exercise for one diver, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn exercise_history(
        &self,
        diver_id: &str,
        exercise_id: &str,
    ) -> Result<Vec<ExerciseEvaluation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {EXERCISE_EVALUATION_COLUMNS} FROM exercise_evaluations
                     WHERE diver_id = ?1 AND exercise_id = ?2
                     ORDER BY evaluated_at DESC, rowid DESC"
                ),
                [diver_id, exercise_id],
            )
            .await?;
        let mut history = Vec::new();
        while let Some(row) = rows.next().await? {
            history.push(row_to_exercise_evaluation(&row)?);
        }
        Ok(history)
    }

    /// Every evaluation of a diver, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn diver_evaluations(
        &self,
        diver_id: &str,
    ) -> Result<Vec<ExerciseEvaluation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {EXERCISE_EVALUATION_COLUMNS} FROM exercise_evaluations
                     WHERE diver_id = ?1 ORDER BY rowid"
                ),
                [diver_id],
            )
            .await?;
        let mut evaluations = Vec::new();
        while let Some(row) = rows.next().await? {
            evaluations.push(row_to_exercise_evaluation(&row)?);
        }
        Ok(evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{planned_group, seeded_service};
    use chrono::Duration;

    fn rating(value: u8) -> Rating {
        Rating::try_from(value).unwrap()
    }

    #[tokio::test]
    async fn interactive_save_counts_cells() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;
        let competencies = seed.competency_ids();

        let mut sheet = RatingSheet::new();
        sheet.rate(&seed.students[0].id, &competencies[0], rating(3), "ok");
        sheet.rate(&seed.students[1].id, &competencies[1], rating(2), "");
        let progress = svc.save_group_evaluations(&group.id, &sheet).await.unwrap();
        assert_eq!(
            progress,
            SubmissionProgress {
                saved: 2,
                expected: 6,
                closed: false
            }
        );

        // Overwrite one cell: count unchanged, value replaced.
        let mut again = RatingSheet::new();
        again.rate(&seed.students[0].id, &competencies[0], rating(1), "à revoir");
        let progress = svc.save_group_evaluations(&group.id, &again).await.unwrap();
        assert_eq!(progress.saved, 2);

        let cells = svc.group_evaluations(&group.id).await.unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].rating, rating(1));
        assert_eq!(cells[0].comment, "à revoir");
    }

    #[tokio::test]
    async fn cells_outside_grid_reject_whole_sheet() {
        let (svc, seed) = seeded_service().await;
        let group = planned_group(&svc, &seed).await;
        let competencies = seed.competency_ids();

        let mut sheet = RatingSheet::new();
        sheet.rate(&seed.students[0].id, &competencies[0], rating(3), "");
        sheet.rate(&seed.supervisor.id, &competencies[0], rating(3), "");
        let err = svc.save_group_evaluations(&group.id, &sheet).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(svc.group_evaluations(&group.id).await.unwrap().is_empty());

        let mut sheet = RatingSheet::new();
        sheet.rate(&seed.students[0].id, "cmp-unplanned", rating(3), "");
        let err = svc.save_group_evaluations(&group.id, &sheet).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn exercise_log_is_append_only() {
        let (svc, seed) = seeded_service().await;
        let diver = &seed.students[0];
        let exercise = &seed.exercises[0];
        let earlier = now() - Duration::days(7);

        for (value, at) in [(1, Some(earlier)), (3, None)] {
            svc.record_exercise_evaluation(&NewExerciseEvaluation {
                diver_id: diver.id.clone(),
                exercise_id: exercise.id.clone(),
                supervisor_id: Some(seed.supervisor.id.clone()),
                rating: rating(value),
                comment: String::new(),
                evaluated_at: at,
            })
            .await
            .unwrap();
        }

        let history = svc.exercise_history(&diver.id, &exercise.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rating, rating(3));
        assert_eq!(history[1].evaluated_at, earlier);
        assert_eq!(svc.diver_evaluations(&diver.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_supervisors_evaluate_students() {
        let (svc, seed) = seeded_service().await;
        let base = NewExerciseEvaluation {
            diver_id: seed.students[0].id.clone(),
            exercise_id: seed.exercises[0].id.clone(),
            supervisor_id: Some(seed.students[1].id.clone()),
            rating: rating(2),
            comment: String::new(),
            evaluated_at: None,
        };
        let err = svc.record_exercise_evaluation(&base).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let on_supervisor = NewExerciseEvaluation {
            diver_id: seed.supervisor.id.clone(),
            supervisor_id: None,
            ..base
        };
        let err = svc.record_exercise_evaluation(&on_supervisor).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
