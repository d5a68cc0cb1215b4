use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Depth (meters) and duration (minutes) limits of a dive group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupLimits {
    pub max_depth: Option<u32>,
    pub max_duration: Option<u32>,
}

/// A dive group (palanquée) of one session.
///
/// `supervisor_id == None` marks an autonomous pod.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DiveGroup {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub supervisor_id: Option<String>,
    pub section_id: String,
    pub limits: GroupLimits,
    pub exercise_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DiveGroup {
    #[must_use]
    pub const fn is_autonomous(&self) -> bool {
        self.supervisor_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_id: String,
    pub diver_id: String,
    pub aptitude: Option<String>,
}
