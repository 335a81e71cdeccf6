//! Product catalog client.
//!
//! Read-only access to the remote product catalog, used to hydrate
//! persisted cart/wishlist rows back into display-ready lines. Lookups are
//! cached via `moka` (5-minute TTL) since hydration fetches the same
//! products repeatedly across login cycles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use fernwood_core::{Product, ProductId};

use crate::config::StorefrontConfig;

/// Catalog cache TTL.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Catalog cache capacity (products).
const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when querying the product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No product with this id exists in the catalog (it may have been
    /// removed after being added to a cart).
    #[error("product {0} not found in catalog")]
    NotFound(ProductId),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Product lookups, as consumed by hydration.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch full product detail by id.
    async fn product_by_id(&self, id: ProductId) -> Result<Product, CatalogError>;
}

/// Client for the product catalog API.
///
/// Cheaply cloneable; lookups are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.catalog_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let url = format!("{}/products/{id}", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }

        // Body text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %body.chars().take(200).collect::<String>(),
                "catalog returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    #[instrument(skip(self))]
    async fn product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!(%id, "catalog cache hit");
            return Ok(product);
        }

        let product = self.fetch_product(id).await?;
        self.inner.cache.insert(id, product.clone()).await;
        Ok(product)
    }
}
