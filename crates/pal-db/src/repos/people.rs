//! People repository: club members and their training sections.
//!
//! This is the read side the grouping engine consumes; people are created by
//! the enrollment collaborator (or the CLI seed commands).

use pal_core::entities::Person;
use pal_core::enums::{Level, Role};
use pal_core::ids::PREFIX_PERSON;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, now, parse_datetime, parse_enum};
use crate::service::PalService;

pub(crate) const PERSON_COLUMNS: &str = "p.id, p.first_name, p.last_name, p.email, p.role, p.level, p.created_at";

/// Input for [`PalService::create_person`].
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub level: Level,
}

impl NewPerson {
    pub fn student(first_name: impl Into<String>, last_name: impl Into<String>, level: Level) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            role: Role::Student,
            level,
        }
    }

    pub fn supervisor(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        level: Level,
    ) -> Self {
        Self {
            role: Role::Supervisor,
            ..Self::student(first_name, last_name, level)
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Parse a row selected with [`PERSON_COLUMNS`]; sections are loaded separately.
pub(crate) fn row_to_person(row: &libsql::Row) -> Result<Person, DatabaseError> {
    Ok(Person {
        id: row.get::<String>(0)?,
        first_name: row.get::<String>(1)?,
        last_name: row.get::<String>(2)?,
        email: get_opt_string(row, 3)?,
        role: parse_enum(&row.get::<String>(4)?)?,
        level: parse_enum(&row.get::<String>(5)?)?,
        section_ids: Vec::new(),
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl PalService {
    /// Register a club member.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for blank names.
    pub async fn create_person(&self, new: &NewPerson) -> Result<Person, DatabaseError> {
        let first_name = new.first_name.trim();
        let last_name = new.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DatabaseError::Validation(
                "first and last name are required".into(),
            ));
        }

        let now = now();
        let id = self.db().generate_id(PREFIX_PERSON).await?;
        let email = new
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());

        self.db()
            .execute_write(
                "INSERT INTO people (id, first_name, last_name, email, role, level, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    first_name,
                    last_name,
                    email,
                    new.role.as_str(),
                    new.level.as_str(),
                    format_datetime(now)
                ],
            )
            .await?;

        Ok(Person {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.map(str::to_string),
            role: new.role,
            level: new.level,
            section_ids: Vec::new(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_person(&self, id: &str) -> Result<Person, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PERSON_COLUMNS} FROM people p WHERE p.id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("person", id))?;
        let mut person = row_to_person(&row)?;
        person.section_ids = self.section_ids_of(&person.id).await?;
        Ok(person)
    }

    /// All people, optionally restricted to one role, by last then first name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_people(&self, role: Option<Role>) -> Result<Vec<Person>, DatabaseError> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM people p
             WHERE ?1 IS NULL OR p.role = ?1
             ORDER BY p.last_name, p.first_name"
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![role.map(Role::as_str)])
            .await?;
        let mut people = Vec::new();
        while let Some(row) = rows.next().await? {
            people.push(row_to_person(&row)?);
        }
        self.with_sections(people).await
    }

    /// Add a person to a training section. Order of joining is kept.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if already a member, `NotFound` for
    /// unknown person or section.
    pub async fn join_section(&self, person_id: &str, section_id: &str) -> Result<(), DatabaseError> {
        self.get_person(person_id).await?;
        self.get_section(section_id).await?;
        self.db()
            .execute_write(
                "INSERT INTO person_sections (person_id, section_id) VALUES (?1, ?2)",
                [person_id, section_id],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn section_ids_of(&self, person_id: &str) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT section_id FROM person_sections WHERE person_id = ?1 ORDER BY rowid",
                [person_id],
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    /// Fill `section_ids` of freshly parsed people.
    pub(crate) async fn with_sections(
        &self,
        mut people: Vec<Person>,
    ) -> Result<Vec<Person>, DatabaseError> {
        for person in &mut people {
            person.section_ids = self.section_ids_of(&person.id).await?;
        }
        Ok(people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use rstest::rstest;

    #[tokio::test]
    async fn create_and_get_person() {
        let svc = test_service().await;
        let created = svc
            .create_person(&NewPerson::supervisor(" Marc ", "Leroy", Level::Initiateur1).with_email("marc@club.example"))
            .await
            .unwrap();

        assert!(created.id.starts_with("per-"));
        assert_eq!(created.first_name, "Marc");

        let fetched = svc.get_person(&created.id).await.unwrap();
        assert_eq!(fetched.role, Role::Supervisor);
        assert_eq!(fetched.level, Level::Initiateur1);
        assert_eq!(fetched.email.as_deref(), Some("marc@club.example"));
        assert!(fetched.section_ids.is_empty());
    }

    #[rstest]
    #[case("  ", "Leroy")]
    #[case("Marc", "")]
    #[case("", "\t")]
    #[tokio::test]
    async fn blank_names_are_rejected(#[case] first: &str, #[case] last: &str) {
        let svc = test_service().await;
        let err = svc
            .create_person(&NewPerson::student(first, last, Level::Niveau1))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn created_person_survives_concurrent_rollback() {
        let svc = test_service().await;
        let tx = svc.db().begin_write().await.unwrap();
        let new = NewPerson::student("Alice", "Martin", Level::Niveau1);

        let (_, created) = tokio::join!(
            async move {
                tokio::task::yield_now().await;
                tx.finish::<()>(Err(DatabaseError::Validation("abandoned".into())))
                    .await
            },
            svc.create_person(&new),
        );

        let created = created.unwrap();
        assert_eq!(svc.get_person(&created.id).await.unwrap().last_name, "Martin");
    }

    #[tokio::test]
    async fn unknown_person_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_person("per-missing").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn sections_keep_joining_order() {
        let svc = test_service().await;
        let diver = svc
            .create_person(&NewPerson::student("Alice", "Martin", Level::Niveau1))
            .await
            .unwrap();
        let later = svc.create_section("prepa_niveau2", "Prépa N2", None).await.unwrap();
        let first = svc.create_section("prepa_niveau1", "Prépa N1", None).await.unwrap();

        svc.join_section(&diver.id, &later.id).await.unwrap();
        svc.join_section(&diver.id, &first.id).await.unwrap();

        let fetched = svc.get_person(&diver.id).await.unwrap();
        assert_eq!(fetched.section_ids, vec![later.id.clone(), first.id]);

        let err = svc.join_section(&diver.id, &later.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn list_people_filters_by_role() {
        let svc = test_service().await;
        svc.create_person(&NewPerson::student("Alice", "Martin", Level::Niveau1))
            .await
            .unwrap();
        svc.create_person(&NewPerson::supervisor("Marc", "Leroy", Level::MoniteurFederal1))
            .await
            .unwrap();

        assert_eq!(svc.list_people(None).await.unwrap().len(), 2);
        let supervisors = svc.list_people(Some(Role::Supervisor)).await.unwrap();
        assert_eq!(supervisors.len(), 1);
        assert_eq!(supervisors[0].last_name, "Leroy");
    }
}
