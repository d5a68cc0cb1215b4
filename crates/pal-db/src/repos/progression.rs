//! Per-diver progression over every training section the diver follows.

use pal_core::progression::{ProgressionTree, aggregate_progress, latest_by_exercise};

use crate::error::DatabaseError;
use crate::service::PalService;

impl PalService {
    /// Roll the diver's latest exercise ratings up to competencies and
    /// competency groups, section by section in enrollment order.
    ///
    /// Read-only.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for unknown divers.
    pub async fn progress(&self, diver_id: &str) -> Result<ProgressionTree, DatabaseError> {
        let diver = self.get_person(diver_id).await?;

        let mut curriculum = Vec::with_capacity(diver.section_ids.len());
        for section_id in &diver.section_ids {
            curriculum.push(self.section_curriculum(section_id).await?);
        }
        let latest = latest_by_exercise(self.diver_evaluations(diver_id).await?);

        Ok(aggregate_progress(diver_id, &curriculum, &latest))
    }
}
