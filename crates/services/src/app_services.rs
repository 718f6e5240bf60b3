use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::course_fetcher::CourseFetcher;
use crate::error::AppServicesError;
use crate::learning_service::LearningService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    learning: Arc<LearningService>,
    fetcher: Arc<CourseFetcher>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        fetcher: CourseFetcher,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, fetcher))
    }

    /// Build services over in-memory repositories.
    #[must_use]
    pub fn in_memory(clock: Clock, fetcher: CourseFetcher) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, fetcher)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, fetcher: CourseFetcher) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.courses)));
        let learning = Arc::new(LearningService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sessions),
        ));
        Self {
            catalog,
            learning,
            fetcher: Arc::new(fetcher),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn learning(&self) -> Arc<LearningService> {
        Arc::clone(&self.learning)
    }

    #[must_use]
    pub fn fetcher(&self) -> Arc<CourseFetcher> {
        Arc::clone(&self.fetcher)
    }
}
