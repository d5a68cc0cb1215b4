use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rating::Rating;

/// One entry of the exercise evaluation log.
///
/// The log is append-only; the latest entry per (diver, exercise) is the
/// current rating.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExerciseEvaluation {
    pub id: String,
    pub diver_id: String,
    pub exercise_id: String,
    pub supervisor_id: Option<String>,
    pub rating: Rating,
    pub comment: String,
    pub evaluated_at: DateTime<Utc>,
}

/// A rated cell of a dive group's grid: one diver on one planned competency.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupEvaluation {
    pub group_id: String,
    pub diver_id: String,
    pub competency_id: String,
    pub rating: Rating,
    pub comment: String,
    pub updated_at: DateTime<Utc>,
}
