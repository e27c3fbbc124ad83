//! Inventory endpoints, with an in-memory cache for product lists.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::client::ProductListKey;
use super::{ApiClient, ApiError, ApiResponse};
use crate::catalog::Product;

/// Product listings.
#[allow(async_fn_in_trait)]
pub trait ProductApi {
    /// Every product, ungrouped.
    async fn products(&self) -> Result<Vec<Product>, ApiError>;

    /// Products at or below their ideal stock count.
    async fn low_stock_products(&self) -> Result<Vec<Product>, ApiError>;
}

impl ApiClient {
    async fn cached_products(
        &self,
        key: ProductListKey,
        path: &str,
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(cached) = self.product_cache().get(&key).await {
            debug!(?key, "Cache hit for product list");
            return Ok(cached.as_ref().clone());
        }

        let response: ApiResponse<Vec<Product>> =
            self.get::<ApiResponse<Value>>(path, None).await?.decode()?;
        let products = response.into_data()?;
        self.product_cache()
            .insert(key, Arc::new(products.clone()))
            .await;
        Ok(products)
    }
}

impl ProductApi for ApiClient {
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.cached_products(ProductListKey::All, "/inventory/getAllProductsUngrouped")
            .await
    }

    async fn low_stock_products(&self) -> Result<Vec<Product>, ApiError> {
        self.cached_products(
            ProductListKey::LowStock,
            "/inventory/getAllProductsUngroupedWithLowStock",
        )
        .await
    }
}
