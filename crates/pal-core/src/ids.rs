//! ID prefix constants.
//!
//! Every row ID is `"{prefix}-{8 hex chars}"`, generated by the database
//! layer from `randomblob(4)`.

pub const PREFIX_PERSON: &str = "per";
pub const PREFIX_SESSION: &str = "ses";
pub const PREFIX_SECTION: &str = "sec";
pub const PREFIX_COMPETENCY_GROUP: &str = "cgr";
pub const PREFIX_COMPETENCY: &str = "cmp";
pub const PREFIX_EXERCISE: &str = "exo";
pub const PREFIX_DIVE_GROUP: &str = "grp";
pub const PREFIX_EVALUATION: &str = "evl";
pub const PREFIX_LINK: &str = "lnk";
pub const PREFIX_AUDIT: &str = "aud";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_PERSON,
    PREFIX_SESSION,
    PREFIX_SECTION,
    PREFIX_COMPETENCY_GROUP,
    PREFIX_COMPETENCY,
    PREFIX_EXERCISE,
    PREFIX_DIVE_GROUP,
    PREFIX_EVALUATION,
    PREFIX_LINK,
    PREFIX_AUDIT,
];
