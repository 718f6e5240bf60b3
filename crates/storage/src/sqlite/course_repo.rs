use finzo_core::model::{Course, CourseId};
use finzo_core::{ShapeKind, to_canonical_json};

use super::SqliteRepository;
use super::mapping::{conn, map_course_row, map_summary_row, ser};
use crate::repository::{CourseRepository, CourseSummary, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let payload =
            serde_json::to_string(&to_canonical_json(course, ShapeKind::Flat)).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, author, estimated_duration, total_sections, payload)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                author = excluded.author,
                estimated_duration = excluded.estimated_duration,
                total_sections = excluded.total_sections,
                payload = excluded.payload
            ",
        )
        .bind(course.id().as_str())
        .bind(course.title())
        .bind(course.description())
        .bind(course.meta().author.as_deref())
        .bind(course.meta().estimated_duration.as_deref())
        .bind(i64::from(course.section_count()))
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let row = sqlx::query("SELECT payload FROM courses WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => map_course_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, author, estimated_duration, total_sections
            FROM courses
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row).collect()
    }
}
