//! HTTP implementation of the row store gateway.
//!
//! Speaks the backend's PostgREST-style REST interface: one resource per
//! table, filters as `column=eq.value` query parameters, inserts returning
//! the created row via `Prefer: return=representation`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::instrument;

use fernwood_core::{ProductId, RowId, UserId};

use crate::config::StorefrontConfig;

use super::{CartRow, GatewayError, RemoteStore, WishlistRow};

/// Path prefix for the backend's row-store resources.
const REST_PREFIX: &str = "rest/v1";

/// Cart rows table.
const CART_TABLE: &str = "cart_items";

/// Wishlist rows table.
const WISHLIST_TABLE: &str = "wishlist_items";

/// Row store client against the hosted backend.
#[derive(Clone)]
pub struct RestRowStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestRowStore {
    /// Create a new row store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build (e.g., the backend
    /// key is not a valid header value).
    pub fn new(config: &StorefrontConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        let key = config.backend_anon_key.expose_secret();
        let api_key = HeaderValue::from_str(key)
            .map_err(|e| GatewayError::Parse(format!("invalid backend key format: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| GatewayError::Parse(format!("invalid backend key format: {e}")))?;

        headers.insert("apikey", api_key);
        headers.insert("Authorization", bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url)
    }

    /// Turn a non-success response into `GatewayError::Api`, otherwise hand
    /// back the response for body parsing.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %message, "row store request failed");
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_rows<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, GatewayError> {
        let response = Self::check(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    async fn fetch_all<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        user_id: UserId,
    ) -> Result<Vec<T>, GatewayError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*".to_string()),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;

        Self::parse_rows(response).await
    }

    async fn find_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<T>, GatewayError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("product_id", format!("eq.{product_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        // An empty result set is the "not found" outcome, not an error.
        let rows: Vec<T> = Self::parse_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_row<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let rows: Vec<T> = Self::parse_rows(response).await?;
        rows.into_iter().next().ok_or(GatewayError::EmptyInsert)
    }

    async fn delete_row(&self, table: &str, row_id: RowId) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{row_id}"))])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for RestRowStore {
    #[instrument(skip(self))]
    async fn fetch_cart(&self, user_id: UserId) -> Result<Vec<CartRow>, GatewayError> {
        self.fetch_all(CART_TABLE, user_id).await
    }

    #[instrument(skip(self))]
    async fn fetch_wishlist(&self, user_id: UserId) -> Result<Vec<WishlistRow>, GatewayError> {
        self.fetch_all(WISHLIST_TABLE, user_id).await
    }

    #[instrument(skip(self))]
    async fn find_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartRow>, GatewayError> {
        self.find_one(CART_TABLE, user_id, product_id).await
    }

    #[instrument(skip(self))]
    async fn find_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishlistRow>, GatewayError> {
        self.find_one(WISHLIST_TABLE, user_id, product_id).await
    }

    #[instrument(skip(self))]
    async fn insert_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartRow, GatewayError> {
        self.insert_row(
            CART_TABLE,
            json!({
                "user_id": user_id,
                "product_id": product_id,
                "quantity": quantity,
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_cart_quantity(
        &self,
        row_id: RowId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .patch(self.table_url(CART_TABLE))
            .query(&[("id", format!("eq.{row_id}"))])
            .json(&json!({ "quantity": quantity }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_cart_row(&self, row_id: RowId) -> Result<(), GatewayError> {
        self.delete_row(CART_TABLE, row_id).await
    }

    #[instrument(skip(self))]
    async fn insert_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistRow, GatewayError> {
        self.insert_row(
            WISHLIST_TABLE,
            json!({
                "user_id": user_id,
                "product_id": product_id,
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_wishlist_row(&self, row_id: RowId) -> Result<(), GatewayError> {
        self.delete_row(WISHLIST_TABLE, row_id).await
    }
}
