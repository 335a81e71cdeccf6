//! Cart and wishlist line types.
//!
//! A line is one product's presence in a cart or wishlist. Within a single
//! cart or wishlist there is at most one line per product id; cart lines
//! additionally carry a quantity that is always at least 1.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, RowId};
use super::product::Product;

/// One product in a cart, with its quantity.
///
/// `row_id` is present only once the line has been persisted to the remote
/// row store; it is the join key for remote updates and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    /// Always >= 1; a decrement at quantity 1 removes the line instead.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RowId>,
}

impl CartLine {
    /// Create a fresh, never-persisted line with quantity 1.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
            row_id: None,
        }
    }

    /// Product id of this line.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_price(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// One product in a wishlist. Presence-only, no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistLine {
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RowId>,
}

impl WishlistLine {
    /// Create a fresh, never-persisted wishlist line.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            row_id: None,
        }
    }

    /// Product id of this line.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}
