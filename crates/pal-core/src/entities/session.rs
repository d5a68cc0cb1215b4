use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A dive session: one outing on a given date and site.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DiveSession {
    pub id: String,
    pub date: NaiveDate,
    pub location: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub lead_supervisor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
