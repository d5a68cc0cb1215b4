//! Entity structs for the Palanquée domain.
//!
//! Each entity maps to a table in the libSQL database (see
//! `pal-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON output and schema validation.

mod audit;
mod curriculum;
mod evaluation;
mod group;
mod link;
mod person;
mod session;

pub use audit::AuditEntry;
pub use curriculum::{Competency, CompetencyGroup, Exercise, TrainingSection};
pub use evaluation::{ExerciseEvaluation, GroupEvaluation};
pub use group::{DiveGroup, GroupLimits, GroupMembership};
pub use link::EvaluationLink;
pub use person::Person;
pub use session::DiveSession;
