//! Report payloads for the document and mail collaborators.

use pal_core::reports::{GroupReport, ProgressionReport, ReportMember};

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::service::PalService;

impl PalService {
    /// Everything needed to print a dive group sheet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown groups.
    pub async fn group_report(&self, group_id: &str) -> Result<GroupReport, DatabaseError> {
        let group = self.get_group(group_id).await?;
        let session = self.get_session(&group.session_id).await?;
        let section = self.get_section(&group.section_id).await?;
        let supervisor = match &group.supervisor_id {
            Some(id) => Some(self.get_person(id).await?),
            None => None,
        };

        let memberships = self.group_members(group_id).await?;
        let members = self
            .group_divers(group_id)
            .await?
            .into_iter()
            .map(|diver| ReportMember {
                aptitude: memberships
                    .iter()
                    .find(|m| m.diver_id == diver.id)
                    .and_then(|m| m.aptitude.clone()),
                full_name: diver.full_name(),
                level: diver.level,
                diver_id: diver.id,
            })
            .collect();

        let planned_competencies = self.planned_competencies(group_id).await?;
        let planned_exercises = self.exercises_for(&planned_competencies).await?;

        Ok(GroupReport {
            max_depth: group.limits.max_depth,
            max_duration: group.limits.max_duration,
            exercise_notes: group.exercise_notes.clone(),
            group,
            session,
            section,
            supervisor,
            members,
            planned_competencies,
            planned_exercises,
        })
    }

    /// A diver's progression sheet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown divers.
    pub async fn progression_report(
        &self,
        diver_id: &str,
    ) -> Result<ProgressionReport, DatabaseError> {
        Ok(ProgressionReport {
            diver: self.get_person(diver_id).await?,
            generated_at: now(),
            tree: self.progress(diver_id).await?,
        })
    }
}
