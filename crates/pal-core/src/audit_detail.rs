//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! give the common shapes a schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::GroupsCreated` and `AuditAction::GroupsReplaced`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupsDetail {
    pub group_ids: Vec<String>,
    pub memberships: u32,
    pub warnings: u32,
    /// Groups removed beforehand (destructive import only).
    pub removed: u32,
}

/// Detail for `AuditAction::LinkGenerated`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkGeneratedDetail {
    pub group_id: String,
    pub superseded_link_id: Option<String>,
    pub expires_at: String,
}

/// Detail for `AuditAction::LinkClosed`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkClosedDetail {
    pub group_id: String,
    /// `superseded` or `completed`.
    pub reason: String,
}

/// Detail for `AuditAction::EvaluationsSaved`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvaluationsSavedDetail {
    pub submitted: u32,
    pub saved: u32,
    pub expected: u32,
    pub via_link: bool,
}
