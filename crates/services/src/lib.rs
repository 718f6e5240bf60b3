#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod course_fetcher;
pub mod error;
pub mod learning_service;

pub use finzo_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use course_fetcher::{CourseFetcher, CourseFetcherConfig};
pub use error::{AppServicesError, CatalogError, FetchError, LearningError};
pub use learning_service::{CourseSession, EnrollmentOverview, LearningService, QuizSubmission};
