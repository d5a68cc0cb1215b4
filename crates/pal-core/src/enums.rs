//! Roles, proficiency levels, section tracks, link states and audit enums.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! which is also the storage representation in SQL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of a person in the club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Supervisor,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Diving proficiency level, declared from least to most experienced.
///
/// Ordering is by [`Level::rank`], never by the textual code:
/// `moniteur_federal1` sorts before `niveau3` as a string but ranks above it.
///
/// ```text
/// debutant < niveau1 < niveau2 < niveau3
///          < initiateur1 < initiateur2 < moniteur_federal1 < moniteur_federal2
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debutant,
    Niveau1,
    Niveau2,
    Niveau3,
    Initiateur1,
    Initiateur2,
    MoniteurFederal1,
    MoniteurFederal2,
}

impl Level {
    pub const ALL: [Self; 8] = [
        Self::Debutant,
        Self::Niveau1,
        Self::Niveau2,
        Self::Niveau3,
        Self::Initiateur1,
        Self::Initiateur2,
        Self::MoniteurFederal1,
        Self::MoniteurFederal2,
    ];

    /// Ordinal rank, 0 for beginners.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Debutant => 0,
            Self::Niveau1 => 1,
            Self::Niveau2 => 2,
            Self::Niveau3 => 3,
            Self::Initiateur1 => 4,
            Self::Initiateur2 => 5,
            Self::MoniteurFederal1 => 6,
            Self::MoniteurFederal2 => 7,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debutant => "debutant",
            Self::Niveau1 => "niveau1",
            Self::Niveau2 => "niveau2",
            Self::Niveau3 => "niveau3",
            Self::Initiateur1 => "initiateur1",
            Self::Initiateur2 => "initiateur2",
            Self::MoniteurFederal1 => "moniteur_federal1",
            Self::MoniteurFederal2 => "moniteur_federal2",
        }
    }

    /// Parse a stored level code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == code)
    }

    /// Instructor grades (initiateur and moniteur fédéral).
    #[must_use]
    pub const fn is_instructor(self) -> bool {
        self.rank() >= Self::Initiateur1.rank()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SectionTrack
// ---------------------------------------------------------------------------

/// Known curriculum tracks, recognised from a section's code.
///
/// Sections with other codes are valid but get no level-based eligibility
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SectionTrack {
    Bapteme,
    PrepaNiveau1,
    PrepaNiveau2,
    PrepaNiveau3,
    PrepaNiveau4,
    Niveau3,
    Niveau4,
    Encadrant,
}

impl SectionTrack {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bapteme => "bapteme",
            Self::PrepaNiveau1 => "prepa_niveau1",
            Self::PrepaNiveau2 => "prepa_niveau2",
            Self::PrepaNiveau3 => "prepa_niveau3",
            Self::PrepaNiveau4 => "prepa_niveau4",
            Self::Niveau3 => "niveau3",
            Self::Niveau4 => "niveau4",
            Self::Encadrant => "encadrant",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::Bapteme,
            Self::PrepaNiveau1,
            Self::PrepaNiveau2,
            Self::PrepaNiveau3,
            Self::PrepaNiveau4,
            Self::Niveau3,
            Self::Niveau4,
            Self::Encadrant,
        ]
        .into_iter()
        .find(|track| track.as_str() == code)
    }

    /// Levels admitted to the track when no student is explicitly enrolled in it.
    #[must_use]
    pub const fn fallback_levels(self) -> &'static [Level] {
        match self {
            Self::Bapteme => &[Level::Debutant],
            Self::PrepaNiveau1 => &[Level::Debutant, Level::Niveau1],
            Self::PrepaNiveau2 => &[Level::Niveau1, Level::Niveau2],
            Self::PrepaNiveau3 => &[Level::Niveau2, Level::Niveau3],
            Self::PrepaNiveau4 | Self::Niveau3 => &[Level::Niveau3],
            Self::Niveau4 => &[
                Level::Niveau3,
                Level::Initiateur1,
                Level::Initiateur2,
                Level::MoniteurFederal1,
                Level::MoniteurFederal2,
            ],
            Self::Encadrant => &[
                Level::Initiateur1,
                Level::Initiateur2,
                Level::MoniteurFederal1,
                Level::MoniteurFederal2,
            ],
        }
    }
}

impl fmt::Display for SectionTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// Lifecycle state of an evaluation link.
///
/// ```text
/// active → closed   (superseded by generate, or completed by submit)
/// active ⇢ expired  (derived from the clock, never stored)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Active,
    Expired,
    Closed,
}

impl LinkState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    GroupsCreated,
    GroupsReplaced,
    PlanUpdated,
    MembershipChanged,
    LinkGenerated,
    LinkClosed,
    EvaluationsSaved,
    ExerciseEvaluated,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroupsCreated => "groups_created",
            Self::GroupsReplaced => "groups_replaced",
            Self::PlanUpdated => "plan_updated",
            Self::MembershipChanged => "membership_changed",
            Self::LinkGenerated => "link_generated",
            Self::LinkClosed => "link_closed",
            Self::EvaluationsSaved => "evaluations_saved",
            Self::ExerciseEvaluated => "exercise_evaluated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity in the system, used in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Session,
    Section,
    CompetencyGroup,
    Competency,
    Exercise,
    DiveGroup,
    Membership,
    Evaluation,
    EvaluationLink,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Session => "session",
            Self::Section => "section",
            Self::CompetencyGroup => "competency_group",
            Self::Competency => "competency",
            Self::Exercise => "exercise",
            Self::DiveGroup => "dive_group",
            Self::Membership => "membership",
            Self::Evaluation => "evaluation",
            Self::EvaluationLink => "evaluation_link",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Level::Debutant, Level::Niveau1)]
    #[case(Level::Niveau3, Level::Initiateur1)]
    #[case(Level::Initiateur1, Level::MoniteurFederal1)]
    #[case(Level::Initiateur2, Level::MoniteurFederal1)]
    fn level_rank_is_ordinal(#[case] lower: Level, #[case] higher: Level) {
        assert!(lower.rank() < higher.rank());
        assert!(lower < higher);
    }

    #[test]
    fn level_rank_disagrees_with_lexical_order() {
        // "initiateur1" < "moniteur_federal1" lexically, and also by rank,
        // but "niveau3" > "initiateur2" lexically while ranking below it.
        assert!(Level::Niveau3.as_str() > Level::Initiateur2.as_str());
        assert!(Level::Niveau3.rank() < Level::Initiateur2.rank());
    }

    #[test]
    fn instructor_code_sorts_before_student_code() {
        assert!(Level::MoniteurFederal1.as_str() < Level::Niveau3.as_str());
        assert!(Level::MoniteurFederal1 > Level::Niveau3);
    }

    #[test]
    fn level_codes_roundtrip() {
        for level in Level::ALL {
            assert_eq!(Level::from_code(level.as_str()), Some(level));
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
        assert_eq!(Level::from_code("niveau5"), None);
    }

    #[test]
    fn instructor_levels() {
        assert!(!Level::Niveau3.is_instructor());
        assert!(Level::Initiateur1.is_instructor());
        assert!(Level::MoniteurFederal2.is_instructor());
    }

    #[test]
    fn section_track_from_code() {
        assert_eq!(
            SectionTrack::from_code("prepa_niveau2"),
            Some(SectionTrack::PrepaNiveau2)
        );
        assert_eq!(SectionTrack::from_code("nitrox"), None);
    }

    #[test]
    fn encadrant_track_admits_instructors_only() {
        let levels = SectionTrack::Encadrant.fallback_levels();
        assert!(levels.iter().all(|level| level.is_instructor()));
    }

    #[test]
    fn audit_action_serializes_snake_case() {
        let json = serde_json::to_string(&AuditAction::GroupsReplaced).unwrap();
        assert_eq!(json, "\"groups_replaced\"");
        assert_eq!(AuditAction::LinkClosed.as_str(), "link_closed");
    }
}
