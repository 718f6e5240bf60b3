use chrono::{DateTime, Utc};
use finzo_core::model::{Course, CourseId, Enrollment, EnrollmentId, UserId};
use finzo_core::normalize::normalize_str;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{CourseSummary, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn enrollment_id_from_i64(v: i64) -> Result<EnrollmentId, StorageError> {
    Ok(EnrollmentId::new(i64_to_u64("enrollment_id", v)?))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn course_id_from_str(v: String) -> Result<CourseId, StorageError> {
    CourseId::new(v).map_err(ser)
}

/// Stored payloads go through the normalizer again so a row can never yield
/// a course the importer would have rejected.
pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    normalize_str(&payload).map_err(ser)
}

pub(crate) fn map_summary_row(row: &SqliteRow) -> Result<CourseSummary, StorageError> {
    let total: i64 = row.try_get("total_sections").map_err(ser)?;
    Ok(CourseSummary {
        id: course_id_from_str(row.try_get("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        total_sections: u32_from_i64("total_sections", total)?,
        author: row.try_get("author").map_err(ser)?,
        estimated_duration: row.try_get("estimated_duration").map_err(ser)?,
    })
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let enrolled_at: DateTime<Utc> = row.try_get("enrolled_at").map_err(ser)?;
    let last_accessed_at: DateTime<Utc> = row.try_get("last_accessed_at").map_err(ser)?;
    let is_completed: i64 = row.try_get("is_completed").map_err(ser)?;

    Ok(Enrollment {
        id: enrollment_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        course_id: course_id_from_str(row.try_get("course_id").map_err(ser)?)?,
        enrolled_at,
        last_accessed_at,
        is_completed: is_completed != 0,
    })
}

pub(crate) fn current_section_from_i64(v: i64) -> Result<u32, StorageError> {
    u32_from_i64("current_section", v)
}
