//! Ratings and the bulk rating payload submitted for a dive group.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A skill rating from 1 (discovered) to 3 (mastered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    /// Rating at or above which an exercise counts as acquired.
    pub const VALIDATING: u8 = 3;

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_validating(self) -> bool {
        self.0 >= Self::VALIDATING
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::Validation(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| CoreError::Validation(format!("rating out of range: {value}")))
            .and_then(Self::try_from)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

impl JsonSchema for Rating {
    fn schema_name() -> Cow<'static, str> {
        "Rating".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "integer",
            "minimum": Self::MIN,
            "maximum": Self::MAX,
        })
    }
}

/// One cell of the rating grid: a diver rated on one planned competency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct RatingKey {
    pub diver_id: String,
    pub competency_id: String,
}

/// The value stored in a rating cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RatingCell {
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
}

/// Wire form of a rating cell, as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RatingEntry {
    pub diver_id: String,
    pub competency_id: String,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
}

/// Bulk payload of `(diver, competency) → rating` cells for one dive group.
///
/// Serialized as a list of [`RatingEntry`] objects. When the same cell
/// appears twice the later entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(from = "Vec<RatingEntry>", into = "Vec<RatingEntry>")]
pub struct RatingSheet {
    cells: BTreeMap<RatingKey, RatingCell>,
}

impl RatingSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) one cell.
    pub fn rate(
        &mut self,
        diver_id: impl Into<String>,
        competency_id: impl Into<String>,
        rating: Rating,
        comment: impl Into<String>,
    ) -> &mut Self {
        self.cells.insert(
            RatingKey {
                diver_id: diver_id.into(),
                competency_id: competency_id.into(),
            },
            RatingCell {
                rating,
                comment: comment.into(),
            },
        );
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RatingKey, &RatingCell)> {
        self.cells.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<RatingEntry>> for RatingSheet {
    fn from(entries: Vec<RatingEntry>) -> Self {
        let mut sheet = Self::new();
        for entry in entries {
            sheet.rate(entry.diver_id, entry.competency_id, entry.rating, entry.comment);
        }
        sheet
    }
}

impl From<RatingSheet> for Vec<RatingEntry> {
    fn from(sheet: RatingSheet) -> Self {
        sheet
            .cells
            .into_iter()
            .map(|(key, cell)| RatingEntry {
                diver_id: key.diver_id,
                competency_id: key.competency_id,
                rating: cell.rating,
                comment: cell.comment,
            })
            .collect()
    }
}
