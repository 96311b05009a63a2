//! Access to TheMealDB JSON API.
//!
//! [`RecipeApi`] is the capability set the coordinators depend on;
//! [`MealDbClient`] is the HTTP implementation. Every call goes through one
//! routine: join the endpoint onto the base URL, GET it, require a 2xx
//! status, decode the `meals` envelope.

mod error;
#[cfg(test)]
pub(crate) mod stub;

pub use error::{ApiError, TransportError};

use crate::config::{ClientConfig, ConfigError};
use crate::model::{Category, CategoryEnvelope, Recipe, RecipeEnvelope};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// The five remote operations the app consumes.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// Full-text search by recipe name. An empty query returns no results
    /// without touching the network.
    async fn search_by_text(&self, query: &str) -> Result<Vec<Recipe>, ApiError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Summary records for every recipe in a category.
    async fn list_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError>;

    /// Full record by id, or `None` when the API has no match.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError>;

    async fn fetch_random(&self) -> Result<Option<Recipe>, ApiError>;
}

/// HTTP client for TheMealDB.
///
/// # Examples
///
/// ```no_run
/// use mealdb_kit::{ClientConfig, MealDbClient, RecipeApi};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MealDbClient::new(&ClientConfig::default())?;
/// let meals = client.search_by_text("arrabiata").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MealDbClient {
    base_url: Url,
    http: reqwest::Client,
}

impl MealDbClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(MealDbClient { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| ApiError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(%url, "GET");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "recipe API returned an error status");
            return Err(ApiError::Server {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!(endpoint, error = %e, "recipe API response did not decode");
            ApiError::Decoding(e)
        })
    }
}

#[async_trait]
impl RecipeApi for MealDbClient {
    async fn search_by_text(&self, query: &str) -> Result<Vec<Recipe>, ApiError> {
        // Rust strings are valid UTF-8, so encoding itself can't fail; only
        // the empty case short-circuits.
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = format!("search.php?s={}", urlencoding::encode(query));
        Ok(self.get::<RecipeEnvelope>(&endpoint).await?.into_list())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.get::<CategoryEnvelope>("list.php?c=list").await?.into_list())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError> {
        let endpoint = format!("filter.php?c={}", urlencoding::encode(category));
        Ok(self.get::<RecipeEnvelope>(&endpoint).await?.into_list())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError> {
        let endpoint = format!("lookup.php?i={}", urlencoding::encode(id));
        Ok(self.get::<RecipeEnvelope>(&endpoint).await?.into_first())
    }

    async fn fetch_random(&self) -> Result<Option<Recipe>, ApiError> {
        Ok(self.get::<RecipeEnvelope>("random.php").await?.into_first())
    }
}
