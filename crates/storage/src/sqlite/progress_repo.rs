use std::collections::{BTreeMap, BTreeSet};

use finzo_core::model::{EnrollmentId, UserProgress};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, current_section_from_i64, id_i64, ser};
use crate::repository::{ProgressStore, StorageError};

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn load_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current_section, completed_sections, quiz_scores
            FROM user_progress WHERE enrollment_id = ?1
            ",
        )
        .bind(id_i64("enrollment_id", enrollment_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let current: i64 = row.try_get("current_section").map_err(ser)?;
        let completed: String = row.try_get("completed_sections").map_err(ser)?;
        let scores: String = row.try_get("quiz_scores").map_err(ser)?;

        Ok(Some(UserProgress {
            current_section: current_section_from_i64(current)?,
            completed_sections: serde_json::from_str::<BTreeSet<u32>>(&completed).map_err(ser)?,
            quiz_scores: serde_json::from_str::<BTreeMap<u32, f64>>(&scores).map_err(ser)?,
        }))
    }

    async fn save_progress(
        &self,
        enrollment_id: EnrollmentId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        let completed = serde_json::to_string(&progress.completed_sections).map_err(ser)?;
        let scores = serde_json::to_string(&progress.quiz_scores).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO user_progress (enrollment_id, current_section, completed_sections, quiz_scores)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(enrollment_id) DO UPDATE SET
                current_section = excluded.current_section,
                completed_sections = excluded.completed_sections,
                quiz_scores = excluded.quiz_scores
            ",
        )
        .bind(id_i64("enrollment_id", enrollment_id.value())?)
        .bind(i64::from(progress.current_section))
        .bind(completed)
        .bind(scores)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
