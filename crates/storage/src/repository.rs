use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finzo_core::model::{Course, CourseId, Enrollment, EnrollmentId, UserId, UserProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Catalog listing entry; avoids loading every section of every course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub total_sections: u32,
    pub author: Option<String>,
    pub estimated_duration: Option<String>,
}

impl CourseSummary {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id().clone(),
            title: course.title().to_owned(),
            description: course.description().to_owned(),
            total_sections: course.section_count(),
            author: course.meta().author.clone(),
            estimated_duration: course.meta().estimated_duration.clone(),
        }
    }
}

/// Result of an enrollment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    /// False when the user was already enrolled.
    pub created: bool,
}

/// Repository contract for the course catalog.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or replace a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError>;

    /// List every course, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_courses(&self) -> Result<Vec<CourseSummary>, StorageError>;
}

/// Repository contract for enrollments. One enrollment per (user, course).
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Enroll a user, returning the existing enrollment if there is one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollment cannot be stored.
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: &CourseId,
        at: DateTime<Utc>,
    ) -> Result<EnrollOutcome, StorageError>;

    /// Fetch the enrollment of a user in a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// List a user's enrollments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError>;

    /// Persist access time and completion flag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;
}

/// Persists `UserProgress` per enrollment.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load progress for an enrollment; `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn load_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<UserProgress>, StorageError>;

    /// Replace the stored progress for an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn save_progress(
        &self,
        enrollment_id: EnrollmentId,
        progress: &UserProgress,
    ) -> Result<(), StorageError>;
}

/// Remembers which user is signed in on this device.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn current_user(&self) -> Result<Option<UserId>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn sign_in(&self, user_id: UserId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be cleared.
    async fn sign_out(&self) -> Result<(), StorageError>;
}

#[derive(Default)]
struct EnrollmentTable {
    next_id: u64,
    rows: HashMap<(UserId, CourseId), Enrollment>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    enrollments: Arc<Mutex<EnrollmentTable>>,
    progress: Arc<Mutex<HashMap<EnrollmentId, UserProgress>>>,
    session: Arc<Mutex<Option<UserId>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.insert(course.id().clone(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut out: Vec<_> = guard.values().map(CourseSummary::from_course).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: &CourseId,
        at: DateTime<Utc>,
    ) -> Result<EnrollOutcome, StorageError> {
        let mut guard = self.enrollments.lock().map_err(poisoned)?;
        let key = (user_id, course_id.clone());
        if let Some(existing) = guard.rows.get(&key) {
            return Ok(EnrollOutcome {
                enrollment: existing.clone(),
                created: false,
            });
        }

        guard.next_id += 1;
        let enrollment = Enrollment::new(
            EnrollmentId::new(guard.next_id),
            user_id,
            course_id.clone(),
            at,
        );
        guard.rows.insert(key, enrollment.clone());
        Ok(EnrollOutcome {
            enrollment,
            created: true,
        })
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        Ok(guard.rows.get(&(user_id, course_id.clone())).cloned())
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        let mut out: Vec<_> = guard
            .rows
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|e| (e.enrolled_at, e.id));
        Ok(out)
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.enrollments.lock().map_err(poisoned)?;
        let key = (enrollment.user_id, enrollment.course_id.clone());
        match guard.rows.get_mut(&key) {
            Some(row) if row.id == enrollment.id => {
                *row = enrollment.clone();
                Ok(())
            }
            Some(_) => Err(StorageError::Conflict),
            None => Err(StorageError::NotFound),
        }
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn load_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&enrollment_id).cloned())
    }

    async fn save_progress(
        &self,
        enrollment_id: EnrollmentId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(enrollment_id, progress.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryRepository {
    async fn current_user(&self) -> Result<Option<UserId>, StorageError> {
        let guard = self.session.lock().map_err(poisoned)?;
        Ok(*guard)
    }

    async fn sign_in(&self, user_id: UserId) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(poisoned)?;
        *guard = Some(user_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let enrollments: Arc<dyn EnrollmentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressStore> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionStore> = Arc::new(repo);
        Self {
            courses,
            enrollments,
            progress,
            sessions,
        }
    }
}
