//! Remote row store gateway.
//!
//! The hosted backend persists one row per (user, product) pair in two
//! tables: `cart_items` (with a quantity) and `wishlist_items` (presence
//! only). The backend assigns every row a UUID primary key; all mutations
//! are keyed by that id once it is known. Client-side ids are never assumed
//! to be valid remote identifiers.
//!
//! [`RemoteStore`] is the seam the sync orchestrator works against; the
//! production implementation is [`RestRowStore`], which speaks the backend's
//! PostgREST-style HTTP interface.

mod rest;

pub use rest::RestRowStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use fernwood_core::{ProductId, RowId, UserId};

/// Errors that can occur when talking to the row store.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An insert with `return=representation` came back empty.
    #[error("insert returned no row")]
    EmptyInsert,
}

/// A persisted cart row, as stored by the backend.
///
/// Unhydrated: carries only the ids and the quantity, not product display
/// data. Hydration joins this with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartRow {
    pub id: RowId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// A persisted wishlist row. Presence-only, no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WishlistRow {
    pub id: RowId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// Data access against the remote row store.
///
/// Every operation is independently failable. Existence lookups return
/// `Ok(None)` for absent rows - absence is a valid outcome, not an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch all cart rows for a user.
    async fn fetch_cart(&self, user_id: UserId) -> Result<Vec<CartRow>, GatewayError>;

    /// Fetch all wishlist rows for a user.
    async fn fetch_wishlist(&self, user_id: UserId) -> Result<Vec<WishlistRow>, GatewayError>;

    /// Look up the cart row for a (user, product) pair, if any.
    async fn find_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartRow>, GatewayError>;

    /// Look up the wishlist row for a (user, product) pair, if any.
    async fn find_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishlistRow>, GatewayError>;

    /// Insert a new cart row, returning it with its backend-assigned id.
    async fn insert_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartRow, GatewayError>;

    /// Set the quantity of an existing cart row.
    async fn update_cart_quantity(
        &self,
        row_id: RowId,
        quantity: u32,
    ) -> Result<(), GatewayError>;

    /// Delete a cart row.
    async fn delete_cart_row(&self, row_id: RowId) -> Result<(), GatewayError>;

    /// Insert a new wishlist row, returning it with its backend-assigned id.
    async fn insert_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistRow, GatewayError>;

    /// Delete a wishlist row.
    async fn delete_wishlist_row(&self, row_id: RowId) -> Result<(), GatewayError>;
}
