//! Dive sessions and their enrollment rosters.

use chrono::{NaiveDate, NaiveTime};

use pal_core::assignment::Roster;
use pal_core::entities::DiveSession;
use pal_core::ids::PREFIX_SESSION;

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, now, parse_date, parse_datetime, parse_optional_time,
};
use crate::repos::people::{PERSON_COLUMNS, row_to_person};
use crate::service::PalService;

const SESSION_COLUMNS: &str =
    "id, date, location, start_time, end_time, lead_supervisor_id, created_at";

/// Input for [`PalService::create_session`].
#[derive(Debug, Clone)]
pub struct NewSession {
    pub date: NaiveDate,
    pub location: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub lead_supervisor_id: Option<String>,
}

impl NewSession {
    pub fn new(date: NaiveDate, location: impl Into<String>) -> Self {
        Self {
            date,
            location: location.into(),
            start_time: None,
            end_time: None,
            lead_supervisor_id: None,
        }
    }
}

fn row_to_session(row: &libsql::Row) -> Result<DiveSession, DatabaseError> {
    Ok(DiveSession {
        id: row.get::<String>(0)?,
        date: parse_date(&row.get::<String>(1)?)?,
        location: row.get::<String>(2)?,
        start_time: parse_optional_time(get_opt_string(row, 3)?.as_deref())?,
        end_time: parse_optional_time(get_opt_string(row, 4)?.as_deref())?,
        lead_supervisor_id: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format("%H:%M:%S").to_string())
}

impl PalService {
    /// Create a dive session.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when the time window is inverted or
    /// the lead is not a supervisor.
    pub async fn create_session(&self, new: &NewSession) -> Result<DiveSession, DatabaseError> {
        if let (Some(start), Some(end)) = (new.start_time, new.end_time) {
            if end < start {
                return Err(DatabaseError::Validation(format!(
                    "session ends ({end}) before it starts ({start})"
                )));
            }
        }
        if let Some(lead_id) = &new.lead_supervisor_id {
            let lead = self.get_person(lead_id).await?;
            if !lead.is_supervisor() {
                return Err(DatabaseError::Validation(format!(
                    "lead {lead_id} is not a supervisor"
                )));
            }
        }

        let now = now();
        let id = self.db().generate_id(PREFIX_SESSION).await?;
        self.db()
            .execute_write(
                "INSERT INTO dive_sessions (id, date, location, start_time, end_time, lead_supervisor_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    new.date.format("%Y-%m-%d").to_string(),
                    new.location.as_str(),
                    format_time(new.start_time),
                    format_time(new.end_time),
                    new.lead_supervisor_id.as_deref(),
                    format_datetime(now)
                ],
            )
            .await?;

        Ok(DiveSession {
            id,
            date: new.date,
            location: new.location.clone(),
            start_time: new.start_time,
            end_time: new.end_time,
            lead_supervisor_id: new.lead_supervisor_id.clone(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown IDs.
    pub async fn get_session(&self, id: &str) -> Result<DiveSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM dive_sessions WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("session", id))?;
        row_to_session(&row)
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sessions(&self, limit: u32) -> Result<Vec<DiveSession>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM dive_sessions
                     ORDER BY date DESC, start_time DESC LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// Enroll a person (student or supervisor) in a session.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` when already enrolled, `NotFound`
    /// for unknown session or person.
    pub async fn enroll(&self, session_id: &str, person_id: &str) -> Result<(), DatabaseError> {
        self.get_session(session_id).await?;
        self.get_person(person_id).await?;
        self.db()
            .execute_write(
                "INSERT INTO session_enrollments (session_id, person_id) VALUES (?1, ?2)",
                [session_id, person_id],
            )
            .await?;
        Ok(())
    }

    /// Everyone enrolled in a session, in enrollment order, sections loaded.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown sessions.
    pub async fn session_roster(&self, session_id: &str) -> Result<Roster, DatabaseError> {
        self.get_session(session_id).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PERSON_COLUMNS} FROM session_enrollments e
                     JOIN people p ON p.id = e.person_id
                     WHERE e.session_id = ?1
                     ORDER BY e.rowid"
                ),
                [session_id],
            )
            .await?;
        let mut people = Vec::new();
        while let Some(row) = rows.next().await? {
            people.push(row_to_person(&row)?);
        }

        Ok(Roster {
            session_id: session_id.to_string(),
            people: self.with_sections(people).await?,
        })
    }
}
