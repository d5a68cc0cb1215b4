//! Curriculum repository: training sections, competency groups,
//! competencies and exercises.
//!
//! Children are always listed in creation order.

use std::collections::HashSet;

use pal_core::entities::{Competency, CompetencyGroup, Exercise, Person, TrainingSection};
use pal_core::enums::Role;
use pal_core::ids::{PREFIX_COMPETENCY, PREFIX_COMPETENCY_GROUP, PREFIX_EXERCISE, PREFIX_SECTION};
use pal_core::progression::{CompetencyGroupNode, CompetencyNode, SectionCurriculum};
use pal_core::section;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, now, parse_datetime, placeholders};
use crate::service::PalService;

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

const SECTION_COLUMNS: &str = "id, code, name, description, created_at";

fn row_to_section(row: &libsql::Row) -> Result<TrainingSection, DatabaseError> {
    Ok(TrainingSection {
        id: row.get::<String>(0)?,
        code: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

fn row_to_competency_group(row: &libsql::Row) -> Result<CompetencyGroup, DatabaseError> {
    Ok(CompetencyGroup {
        id: row.get::<String>(0)?,
        section_id: row.get::<String>(1)?,
        title: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

pub(crate) const COMPETENCY_COLUMNS: &str =
    "c.id, c.group_id, c.name, c.description, c.created_at";

pub(crate) fn row_to_competency(row: &libsql::Row) -> Result<Competency, DatabaseError> {
    Ok(Competency {
        id: row.get::<String>(0)?,
        group_id: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

const EXERCISE_COLUMNS: &str = "x.id, x.name, x.description, x.created_at";

fn row_to_exercise(row: &libsql::Row) -> Result<Exercise, DatabaseError> {
    Ok(Exercise {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

fn require_text(field: &str, value: &str) -> Result<String, DatabaseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

impl PalService {
    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if the code is taken.
    pub async fn create_section(
        &self,
        code: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<TrainingSection, DatabaseError> {
        let code = require_text("section code", code)?;
        let name = require_text("section name", name)?;
        let now = now();
        let id = self.db().generate_id(PREFIX_SECTION).await?;

        self.db()
            .execute_write(
                "INSERT INTO training_sections (id, code, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    code.as_str(),
                    name.as_str(),
                    description,
                    format_datetime(now)
                ],
            )
            .await?;

        Ok(TrainingSection {
            id,
            code,
            name,
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_section(&self, id: &str) -> Result<TrainingSection, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SECTION_COLUMNS} FROM training_sections WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("section", id))?;
        row_to_section(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown codes.
    pub async fn find_section_by_code(&self, code: &str) -> Result<TrainingSection, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SECTION_COLUMNS} FROM training_sections WHERE code = ?1"),
                [code],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("section", code))?;
        row_to_section(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sections(&self) -> Result<Vec<TrainingSection>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SECTION_COLUMNS} FROM training_sections ORDER BY rowid"),
                (),
            )
            .await?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next().await? {
            sections.push(row_to_section(&row)?);
        }
        Ok(sections)
    }

    /// Students a supervisor may pick for a group following `section_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sections.
    pub async fn eligible_students(&self, section_id: &str) -> Result<Vec<Person>, DatabaseError> {
        let section = self.get_section(section_id).await?;
        let students = self.list_people(Some(Role::Student)).await?;
        Ok(section::eligible_students(&section, &students)
            .into_iter()
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Competency groups, competencies, exercises
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sections.
    pub async fn create_competency_group(
        &self,
        section_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<CompetencyGroup, DatabaseError> {
        self.get_section(section_id).await?;
        let title = require_text("competency group title", title)?;
        let now = now();
        let id = self.db().generate_id(PREFIX_COMPETENCY_GROUP).await?;

        self.db()
            .execute_write(
                "INSERT INTO competency_groups (id, section_id, title, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    section_id,
                    title.as_str(),
                    description,
                    format_datetime(now)
                ],
            )
            .await?;

        Ok(CompetencyGroup {
            id,
            section_id: section_id.to_string(),
            title,
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown competency groups.
    pub async fn create_competency(
        &self,
        group_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Competency, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT 1 FROM competency_groups WHERE id = ?1", [group_id])
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::not_found("competency group", group_id));
        }

        let name = require_text("competency name", name)?;
        let now = now();
        let id = self.db().generate_id(PREFIX_COMPETENCY).await?;

        self.db()
            .execute_write(
                "INSERT INTO competencies (id, group_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    group_id,
                    name.as_str(),
                    description,
                    format_datetime(now)
                ],
            )
            .await?;

        Ok(Competency {
            id,
            group_id: group_id.to_string(),
            name,
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name.
    pub async fn create_exercise(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Exercise, DatabaseError> {
        let name = require_text("exercise name", name)?;
        let now = now();
        let id = self.db().generate_id(PREFIX_EXERCISE).await?;

        self.db()
            .execute_write(
                "INSERT INTO exercises (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name.as_str(), description, format_datetime(now)],
            )
            .await?;

        Ok(Exercise {
            id,
            name,
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    /// Make `exercise_id` serve `competency_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if already attached, `NotFound` if
    /// either side is unknown.
    pub async fn attach_exercise(
        &self,
        competency_id: &str,
        exercise_id: &str,
    ) -> Result<(), DatabaseError> {
        self.get_competency(competency_id).await?;
        self.get_exercise(exercise_id).await?;
        self.db()
            .execute_write(
                "INSERT INTO competency_exercises (competency_id, exercise_id) VALUES (?1, ?2)",
                [competency_id, exercise_id],
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_competency(&self, id: &str) -> Result<Competency, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {COMPETENCY_COLUMNS} FROM competencies c WHERE c.id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("competency", id))?;
        row_to_competency(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_exercise(&self, id: &str) -> Result<Exercise, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {EXERCISE_COLUMNS} FROM exercises x WHERE x.id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("exercise", id))?;
        row_to_exercise(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn competency_groups(
        &self,
        section_id: &str,
    ) -> Result<Vec<CompetencyGroup>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, section_id, title, description, created_at
                 FROM competency_groups WHERE section_id = ?1 ORDER BY rowid",
                [section_id],
            )
            .await?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().await? {
            groups.push(row_to_competency_group(&row)?);
        }
        Ok(groups)
    }

    async fn competencies_in_groups(
        &self,
        groups: &[CompetencyGroup],
    ) -> Result<Vec<Competency>, DatabaseError> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {COMPETENCY_COLUMNS} FROM competencies c
             WHERE c.group_id IN ({}) ORDER BY c.rowid",
            placeholders(0, groups.len())
        );
        let mut rows = self
            .db()
            .conn()
            .query(
                &sql,
                libsql::params_from_iter(groups.iter().map(|g| g.id.clone())),
            )
            .await?;
        let mut competencies = Vec::new();
        while let Some(row) = rows.next().await? {
            competencies.push(row_to_competency(&row)?);
        }
        Ok(competencies)
    }

    /// Competencies that may be planned for a group following `section_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sections.
    pub async fn candidate_competencies(
        &self,
        section_id: &str,
    ) -> Result<Vec<Competency>, DatabaseError> {
        self.get_section(section_id).await?;
        let groups = self.competency_groups(section_id).await?;
        let competencies = self.competencies_in_groups(&groups).await?;
        Ok(
            section::candidate_competencies(section_id, &groups, &competencies)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    /// Exercises serving a competency, in attachment order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn exercises_of(&self, competency_id: &str) -> Result<Vec<Exercise>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {EXERCISE_COLUMNS} FROM competency_exercises ce
                     JOIN exercises x ON x.id = ce.exercise_id
                     WHERE ce.competency_id = ?1 ORDER BY ce.rowid"
                ),
                [competency_id],
            )
            .await?;
        let mut exercises = Vec::new();
        while let Some(row) = rows.next().await? {
            exercises.push(row_to_exercise(&row)?);
        }
        Ok(exercises)
    }

    /// Exercises serving any of `competencies`, each listed once, in
    /// competency order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn exercises_for(
        &self,
        competencies: &[Competency],
    ) -> Result<Vec<Exercise>, DatabaseError> {
        let mut seen = HashSet::new();
        let mut exercises = Vec::new();
        for competency in competencies {
            for exercise in self.exercises_of(&competency.id).await? {
                if seen.insert(exercise.id.clone()) {
                    exercises.push(exercise);
                }
            }
        }
        Ok(exercises)
    }

    /// The section with its competency groups, competencies and exercises.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sections.
    pub async fn section_curriculum(
        &self,
        section_id: &str,
    ) -> Result<SectionCurriculum, DatabaseError> {
        let section = self.get_section(section_id).await?;
        let groups = self.competency_groups(section_id).await?;
        let competencies = self.competencies_in_groups(&groups).await?;

        let mut nodes = Vec::with_capacity(groups.len());
        for group in groups {
            let mut children = Vec::new();
            for competency in competencies.iter().filter(|c| c.group_id == group.id) {
                children.push(CompetencyNode {
                    exercises: self.exercises_of(&competency.id).await?,
                    competency: competency.clone(),
                });
            }
            nodes.push(CompetencyGroupNode {
                group,
                competencies: children,
            });
        }

        Ok(SectionCurriculum {
            section,
            groups: nodes,
        })
    }
}
