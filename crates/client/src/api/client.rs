//! HTTP client for the backend REST API.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::ApiError;
use crate::auth::SessionToken;
use crate::catalog::Product;
use crate::config::ClientConfig;

/// Cache key for product list responses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(super) enum ProductListKey {
    All,
    LowStock,
}

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    product_cache: Cache<ProductListKey, Arc<Vec<Product>>>,
}

/// Body of an error response. Only the message is of interest.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let product_cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                product_cache,
            }),
        })
    }

    /// Absolute URL of an endpoint path such as `/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the result is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.inner.base_url,
            path.trim_start_matches('/')
        ))?)
    }

    /// URL of `path` with `id` appended as a single path segment.
    ///
    /// The id is percent-encoded, so `/` or `?` inside it cannot change the
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base URL cannot take path segments.
    pub fn url_with_id(&self, path: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    pub(super) fn product_cache(&self) -> &Cache<ProductListKey, Arc<Vec<Product>>> {
        &self.inner.product_cache
    }

    /// Drop cached product lists, e.g. after an inventory edit.
    pub fn invalidate_products(&self) {
        self.inner.product_cache.invalidate_all();
    }

    /// Send a GET request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or bad JSON.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        self.get_at(self.url(path)?, token).await
    }

    /// Send a GET request to an already built URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or bad JSON.
    pub async fn get_at<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        self.send(self.inner.client.get(url), token).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or bad JSON.
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        self.send(self.inner.client.post(url).json(body), token).await
    }

    /// Send a PATCH request with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or bad JSON.
    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.patch_at(self.url(path)?, body, token).await
    }

    /// Send a PATCH request with a JSON body to an already built URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or bad JSON.
    pub async fn patch_at<B, T>(
        &self,
        url: Url,
        body: &B,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.inner.client.patch(url).json(body), token).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let request = match token {
            Some(token) if !token.is_empty() => request.bearer_auth(token.expose()),
            _ => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.trim().is_empty());
            warn!(
                status = %status,
                url = %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Status { status, message });
        }

        match serde_json::from_str(&response_text) {
            Ok(parsed) => {
                debug!(status = %status, url = %url, "API request succeeded");
                Ok(parsed)
            }
            Err(e) => {
                error!(
                    error = %e,
                    url = %url,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
