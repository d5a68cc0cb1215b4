use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::LinkState;

/// A tokenized public link letting a supervisor rate one dive group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvaluationLink {
    pub id: String,
    pub group_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
}

impl EvaluationLink {
    /// State at instant `now`. Expiry is derived, never stored.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        if !self.valid {
            LinkState::Closed
        } else if now > self.expires_at {
            LinkState::Expired
        } else {
            LinkState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(valid: bool, expires_in: Duration) -> EvaluationLink {
        let now = Utc::now();
        EvaluationLink {
            id: "lnk-00000001".into(),
            group_id: "grp-00000001".into(),
            token: "t".into(),
            created_at: now,
            expires_at: now + expires_in,
            valid,
        }
    }

    #[test]
    fn state_is_derived_from_flag_and_clock() {
        let now = Utc::now();
        assert_eq!(link(true, Duration::days(1)).state_at(now), LinkState::Active);
        assert_eq!(link(true, Duration::days(-1)).state_at(now), LinkState::Expired);
        assert_eq!(link(false, Duration::days(1)).state_at(now), LinkState::Closed);
        assert_eq!(link(false, Duration::days(-1)).state_at(now), LinkState::Closed);
    }
}
