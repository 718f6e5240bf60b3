use std::env;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Clone, Debug)]
pub struct CourseFetcherConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl CourseFetcherConfig {
    /// Reads `FINZO_API_BASE_URL` and `FINZO_API_TOKEN`. A blank token counts
    /// as none.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("FINZO_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let token = env::var("FINZO_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self { base_url, token }
    }

    fn course_url(&self, course_id: &str) -> String {
        format!(
            "{}/courses/{}/",
            self.base_url.trim_end_matches('/'),
            course_id.trim()
        )
    }
}

/// Downloads raw course payloads from the Finzo backend. The payload is
/// returned untouched; normalization happens in the catalog.
#[derive(Clone)]
pub struct CourseFetcher {
    client: Client,
    config: CourseFetcherConfig,
}

impl CourseFetcher {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(CourseFetcherConfig::from_env())
    }

    #[must_use]
    pub fn new(config: CourseFetcherConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &CourseFetcherConfig {
        &self.config
    }

    /// Fetch the raw JSON payload of one course.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::HttpStatus` for non-success responses and
    /// `FetchError::Http` when the request fails or the body is not JSON.
    pub async fn fetch_raw(&self, course_id: &str) -> Result<Value, FetchError> {
        let url = self.config.course_url(course_id);
        tracing::debug!(%url, "fetching course");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            tracing::warn!(%url, status = %response.status(), "course fetch rejected");
            return Err(FetchError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}
