//! Structured payloads handed to document renderers and mailers.
//!
//! Nothing here formats bytes; a renderer turns these into PDF, spreadsheet
//! or e-mail content.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Competency, DiveGroup, DiveSession, Exercise, Person, TrainingSection};
use crate::enums::Level;
use crate::progression::ProgressionTree;

/// A member line of a [`GroupReport`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReportMember {
    pub diver_id: String,
    pub full_name: String,
    pub level: Level,
    pub aptitude: Option<String>,
}

/// Everything needed to print a dive group sheet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupReport {
    pub group: DiveGroup,
    pub session: DiveSession,
    pub section: TrainingSection,
    pub supervisor: Option<Person>,
    pub members: Vec<ReportMember>,
    pub max_depth: Option<u32>,
    pub max_duration: Option<u32>,
    pub planned_competencies: Vec<Competency>,
    /// Exercises serving the planned competencies, deduplicated.
    pub planned_exercises: Vec<Exercise>,
    pub exercise_notes: Option<String>,
}

/// A diver's progression sheet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProgressionReport {
    pub diver: Person,
    pub generated_at: DateTime<Utc>,
    pub tree: ProgressionTree,
}

/// Message telling a supervisor where to rate their group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkNotice {
    pub recipient: String,
    pub supervisor_name: String,
    pub group_name: String,
    pub session_date: NaiveDate,
    pub location: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
