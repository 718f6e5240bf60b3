use chrono::{DateTime, Utc};
use finzo_core::model::{CourseId, Enrollment, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_enrollment_row};
use crate::repository::{EnrollOutcome, EnrollmentRepository, StorageError};

const ENROLLMENT_COLUMNS: &str =
    "id, user_id, course_id, enrolled_at, last_accessed_at, is_completed";

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: &CourseId,
        at: DateTime<Utc>,
    ) -> Result<EnrollOutcome, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let res = sqlx::query(
            r"
            INSERT INTO enrollments (user_id, course_id, enrolled_at, last_accessed_at, is_completed)
            VALUES (?1, ?2, ?3, ?3, 0)
            ON CONFLICT(user_id, course_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(course_id.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let enrollment = self
            .get_enrollment(user_id, course_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(EnrollOutcome {
            enrollment,
            created: res.rows_affected() == 1,
        })
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let sql =
            format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 AND course_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .bind(course_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 ORDER BY enrolled_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_enrollment_row).collect()
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments
            SET last_accessed_at = ?2, is_completed = ?3
            WHERE id = ?1 AND user_id = ?4 AND course_id = ?5
            ",
        )
        .bind(id_i64("enrollment_id", enrollment.id.value())?)
        .bind(enrollment.last_accessed_at)
        .bind(i64::from(enrollment.is_completed))
        .bind(id_i64("user_id", enrollment.user_id.value())?)
        .bind(enrollment.course_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
