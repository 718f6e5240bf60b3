//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use finzo_core::model::{CourseId, ParseIdError};
use finzo_core::{EvaluationError, NormalizationError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CourseFetcher`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("course request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    InvalidId(#[from] ParseIdError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LearningService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningError {
    #[error("no user is signed in")]
    NoActiveUser,
    #[error("course {0} does not exist")]
    UnknownCourse(CourseId),
    #[error("not enrolled in course {0}")]
    NotEnrolled(CourseId),
    #[error("section {index} does not exist in a course of {total} sections")]
    UnknownSection { index: u32, total: u32 },
    #[error("section {0} is locked until the previous section is passed")]
    SectionLocked(u32),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
