//! Roster spreadsheet parsing.
//!
//! The import layout is a compatibility contract with the club's existing
//! spreadsheets (1-based coordinates):
//!
//! ```text
//!            col 1        col 4      col 5     col 6 ...
//! row 2                              Sup A     Sup B
//! row 4      Diver name   depth (m)  X
//! row 5      Diver name   depth (m)            X
//! ```
//!
//! Rows 1 and 3 are free-form headers. A diver row with no mark is left
//! unassigned.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentRequest, AssignmentWarning, Roster};
use crate::entities::{GroupLimits, Person};

pub const SUPERVISOR_ROW: usize = 2;
pub const FIRST_SUPERVISOR_COL: usize = 5;
pub const FIRST_DIVER_ROW: usize = 4;
pub const NAME_COL: usize = 1;
pub const DEPTH_COL: usize = 4;
pub const MARK: &str = "X";

/// A rectangular-ish grid of text cells. Missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Matrix {
    rows: Vec<Vec<String>>,
}

impl Matrix {
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build from any nested iterator of cells, such as CSV records.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Cell at 1-based `(row, col)`, trimmed.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        if row == 0 || col == 0 {
            return "";
        }
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(col - 1))
            .map_or("", |cell| cell.trim())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Result of reading a [`Matrix`] against a session roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedMatrix {
    pub request: AssignmentRequest,
    /// Individual maximum depth of each diver that had a readable one.
    pub diver_depths: BTreeMap<String, u32>,
    pub warnings: Vec<AssignmentWarning>,
}

/// Turn a roster spreadsheet into an [`AssignmentRequest`].
///
/// Names are matched against the roster: supervisor headers against
/// supervisors, diver rows against students. Each supervisor's group depth
/// limit is the smallest individual depth among the divers marked in their
/// column.
#[must_use]
pub fn parse_matrix(matrix: &Matrix, roster: &Roster) -> ParsedMatrix {
    let mut parsed = ParsedMatrix::default();

    let mut columns: Vec<(usize, &Person)> = Vec::new();
    for col in FIRST_SUPERVISOR_COL..=matrix.col_count() {
        let name = matrix.cell(SUPERVISOR_ROW, col);
        if name.is_empty() {
            continue;
        }
        match roster.supervisors().find(|person| person.answers_to(name)) {
            Some(supervisor) => columns.push((col, supervisor)),
            None => parsed.warnings.push(AssignmentWarning::UnknownSupervisorName {
                name: name.to_string(),
                column: col,
            }),
        }
    }

    for row in FIRST_DIVER_ROW..=matrix.row_count() {
        let name = matrix.cell(row, NAME_COL);
        if name.is_empty() {
            continue;
        }
        let Some(diver) = roster.students().find(|person| person.answers_to(name)) else {
            parsed.warnings.push(AssignmentWarning::UnknownDiverName {
                name: name.to_string(),
                row,
            });
            continue;
        };

        let depth = matrix.cell(row, DEPTH_COL);
        if !depth.is_empty() {
            match parse_depth(depth) {
                Some(meters) => {
                    parsed.diver_depths.insert(diver.id.clone(), meters);
                }
                None => parsed.warnings.push(AssignmentWarning::InvalidDepth {
                    row,
                    value: depth.to_string(),
                }),
            }
        }

        let mut marked = columns
            .iter()
            .filter(|(col, _)| matrix.cell(row, *col) == MARK);
        if let Some((_, supervisor)) = marked.next() {
            if marked.next().is_some() {
                parsed.warnings.push(AssignmentWarning::MultipleMarks { row });
            }
            parsed
                .request
                .supervisor_assignments
                .insert(diver.id.clone(), supervisor.id.clone());
        }
    }

    for (diver_id, supervisor_id) in &parsed.request.supervisor_assignments {
        let Some(depth) = parsed.diver_depths.get(diver_id).copied() else {
            continue;
        };
        let limits = parsed
            .request
            .supervisor_limits
            .entry(supervisor_id.clone())
            .or_insert_with(GroupLimits::default);
        limits.max_depth = Some(limits.max_depth.map_or(depth, |current| current.min(depth)));
    }

    parsed
}

/// Parse a depth cell such as `20`, `20m` or `20 m`.
fn parse_depth(value: &str) -> Option<u32> {
    let digits = value
        .strip_suffix('m')
        .or_else(|| value.strip_suffix('M'))
        .unwrap_or(value)
        .trim();
    digits.parse().ok()
}
