//! Progression rollup: exercise ratings → competencies → competency groups.
//!
//! A competency is validated when it has at least one exercise and every one
//! of them carries a validating rating. A competency group is validated when
//! it has at least one competency and all of them are validated. Neither
//! level ever passes vacuously.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Competency, CompetencyGroup, Exercise, ExerciseEvaluation, TrainingSection};
use crate::rating::Rating;

// ---------------------------------------------------------------------------
// Curriculum input
// ---------------------------------------------------------------------------

/// A competency together with the exercises that serve it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CompetencyNode {
    pub competency: Competency,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CompetencyGroupNode {
    pub group: CompetencyGroup,
    pub competencies: Vec<CompetencyNode>,
}

/// The full curriculum of one training section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SectionCurriculum {
    pub section: TrainingSection,
    pub groups: Vec<CompetencyGroupNode>,
}

// ---------------------------------------------------------------------------
// Output tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProgressSummary {
    pub groups_validated: u32,
    pub groups_total: u32,
    pub competencies_validated: u32,
    pub competencies_total: u32,
}

impl ProgressSummary {
    fn add(&mut self, other: Self) {
        self.groups_validated += other.groups_validated;
        self.groups_total += other.groups_total;
        self.competencies_validated += other.competencies_validated;
        self.competencies_total += other.competencies_total;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub name: String,
    /// Latest rating, 0 when the exercise was never evaluated.
    pub rating: u8,
    pub comment: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CompetencyProgress {
    pub competency_id: String,
    pub name: String,
    pub validated: bool,
    pub exercises: Vec<ExerciseProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupProgress {
    pub group_id: String,
    pub title: String,
    pub validated: bool,
    pub competencies: Vec<CompetencyProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SectionProgress {
    pub section_id: String,
    pub code: String,
    pub name: String,
    pub summary: ProgressSummary,
    pub groups: Vec<GroupProgress>,
}

/// Progression of one diver across all their training sections.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProgressionTree {
    pub diver_id: String,
    pub summary: ProgressSummary,
    pub sections: Vec<SectionProgress>,
}

// ---------------------------------------------------------------------------
// Rollup
// ---------------------------------------------------------------------------

/// Keep the most recent evaluation per exercise.
///
/// Evaluations are compared by `evaluated_at`; on equal timestamps the one
/// appearing later in `evaluations` wins, so callers pass them in insertion
/// order.
#[must_use]
pub fn latest_by_exercise(
    evaluations: impl IntoIterator<Item = ExerciseEvaluation>,
) -> HashMap<String, ExerciseEvaluation> {
    let mut latest: HashMap<String, ExerciseEvaluation> = HashMap::new();
    for evaluation in evaluations {
        let newer = latest
            .get(&evaluation.exercise_id)
            .is_none_or(|current| evaluation.evaluated_at >= current.evaluated_at);
        if newer {
            latest.insert(evaluation.exercise_id.clone(), evaluation);
        }
    }
    latest
}

/// Build the progression tree of `diver_id` over `curriculum`.
///
/// `latest` maps exercise IDs to the diver's latest evaluation, see
/// [`latest_by_exercise`].
#[must_use]
pub fn aggregate_progress(
    diver_id: &str,
    curriculum: &[SectionCurriculum],
    latest: &HashMap<String, ExerciseEvaluation>,
) -> ProgressionTree {
    let mut summary = ProgressSummary::default();
    let sections: Vec<SectionProgress> = curriculum
        .iter()
        .map(|section| {
            let progress = section_progress(section, latest);
            summary.add(progress.summary);
            progress
        })
        .collect();

    ProgressionTree {
        diver_id: diver_id.to_string(),
        summary,
        sections,
    }
}

fn section_progress(
    section: &SectionCurriculum,
    latest: &HashMap<String, ExerciseEvaluation>,
) -> SectionProgress {
    let mut summary = ProgressSummary::default();
    let groups: Vec<GroupProgress> = section
        .groups
        .iter()
        .map(|node| {
            let competencies: Vec<CompetencyProgress> = node
                .competencies
                .iter()
                .map(|competency| competency_progress(competency, latest))
                .collect();
            let validated =
                !competencies.is_empty() && competencies.iter().all(|c| c.validated);

            summary.groups_total += 1;
            summary.groups_validated += u32::from(validated);
            summary.competencies_total += count(competencies.len());
            summary.competencies_validated +=
                count(competencies.iter().filter(|c| c.validated).count());

            GroupProgress {
                group_id: node.group.id.clone(),
                title: node.group.title.clone(),
                validated,
                competencies,
            }
        })
        .collect();

    SectionProgress {
        section_id: section.section.id.clone(),
        code: section.section.code.clone(),
        name: section.section.name.clone(),
        summary,
        groups,
    }
}

fn competency_progress(
    node: &CompetencyNode,
    latest: &HashMap<String, ExerciseEvaluation>,
) -> CompetencyProgress {
    let exercises: Vec<ExerciseProgress> = node
        .exercises
        .iter()
        .map(|exercise| {
            let evaluation = latest.get(&exercise.id);
            ExerciseProgress {
                exercise_id: exercise.id.clone(),
                name: exercise.name.clone(),
                rating: evaluation.map_or(0, |e| e.rating.value()),
                comment: evaluation
                    .map(|e| e.comment.clone())
                    .filter(|comment| !comment.is_empty()),
                evaluated_at: evaluation.map(|e| e.evaluated_at),
            }
        })
        .collect();
    let validated = !exercises.is_empty()
        && exercises
            .iter()
            .all(|exercise| exercise.rating >= Rating::VALIDATING);

    CompetencyProgress {
        competency_id: node.competency.id.clone(),
        name: node.competency.name.clone(),
        validated,
        exercises,
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
