use std::path::Path;
use std::sync::Arc;

use finzo_core::model::{Course, CourseId};
use finzo_core::normalize;
use serde_json::Value;
use storage::repository::{CourseRepository, CourseSummary};

use crate::course_fetcher::CourseFetcher;
use crate::error::CatalogError;

/// Imports raw course payloads into the catalog and serves them back.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// Normalize a payload of any accepted shape and store it.
    ///
    /// `id_override` replaces whatever id the payload carries, for payloads
    /// that come without one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Normalization` if the payload is rejected.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn import_payload(
        &self,
        payload: &Value,
        id_override: Option<CourseId>,
    ) -> Result<Course, CatalogError> {
        let mut course = normalize::normalize(payload)?;
        if let Some(id) = id_override {
            course = course.with_id(id);
        }
        self.courses.upsert_course(&course).await?;
        tracing::info!(
            course = %course.id(),
            sections = course.section_count(),
            "imported course"
        );
        Ok(course)
    }

    /// Same as [`Self::import_payload`] for a JSON document held as text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Normalization` for invalid JSON or a rejected
    /// payload, and `CatalogError::Storage` if persistence fails.
    pub async fn import_str(
        &self,
        json: &str,
        id_override: Option<CourseId>,
    ) -> Result<Course, CatalogError> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| normalize::NormalizationError::InvalidJson(e.to_string()))?;
        self.import_payload(&payload, id_override).await
    }

    /// Import a course from a JSON file on disk.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise as
    /// [`Self::import_str`].
    pub async fn import_file(
        &self,
        path: &Path,
        id_override: Option<CourseId>,
    ) -> Result<Course, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_str(&json, id_override).await
    }

    /// Download a course from the backend and import it under `course_id`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Fetch` if the download fails, otherwise as
    /// [`Self::import_payload`].
    pub async fn import_remote(
        &self,
        fetcher: &CourseFetcher,
        course_id: &CourseId,
    ) -> Result<Course, CatalogError> {
        let payload = fetcher.fetch_raw(course_id.as_str()).await?;
        // Detail responses may lack the business id; the one requested wins.
        self.import_payload(&payload, Some(course_id.clone())).await
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<CourseSummary>, CatalogError> {
        Ok(self.courses.list_courses().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` (`NotFound` for unknown ids).
    pub async fn get_course(&self, id: &CourseId) -> Result<Course, CatalogError> {
        Ok(self.courses.get_course(id).await?)
    }
}
