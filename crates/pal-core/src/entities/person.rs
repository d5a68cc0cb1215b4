use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Level, Role};

/// A club member: a diver in training (`student`) or a group leader (`supervisor`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub level: Level,
    /// Training sections the person belongs to, in enrollment order.
    pub section_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Person {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    #[must_use]
    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }

    /// Whether `name` designates this person, as "first last" or "last first".
    ///
    /// Comparison ignores case and surrounding or repeated whitespace.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return false;
        }
        let first = normalize_name(&self.first_name);
        let last = normalize_name(&self.last_name);
        wanted == format!("{first} {last}") || wanted == format!("{last} {first}")
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
