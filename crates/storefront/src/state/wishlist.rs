//! Wishlist state and its transition functions.
//!
//! Presence-only: at most one line per product id, no quantities.

use std::collections::HashSet;

use tracing::debug;

use fernwood_core::{Product, ProductId, RowId, WishlistLine};

/// Outcome of a wishlist transition, for user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    /// The product was appended.
    Added,
    /// The product was removed.
    Removed,
    /// The product was already present; state is unchanged.
    AlreadyPresent,
    /// Nothing matched; state is unchanged.
    NoOp,
}

/// The wishlist: ordered lines in insertion order, plus per-product
/// in-flight markers.
#[derive(Debug, Default)]
pub struct WishlistState {
    lines: Vec<WishlistLine>,
    /// Products with an in-flight remote operation. The UI disables the
    /// matching controls to prevent duplicate concurrent submissions.
    pending: HashSet<ProductId>,
}

impl WishlistState {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a product: remove it when present, append it when absent.
    pub fn toggle(&mut self, product: Product) -> WishlistChange {
        if self.contains(product.id) {
            self.lines.retain(|line| line.product_id() != product.id);
            debug!(product_id = %product.id, "wishlist toggle off");
            WishlistChange::Removed
        } else {
            self.lines.push(WishlistLine::new(product));
            WishlistChange::Added
        }
    }

    /// Add a product, rejecting silently when already present.
    pub fn add(&mut self, product: Product) -> WishlistChange {
        if self.contains(product.id) {
            return WishlistChange::AlreadyPresent;
        }

        self.lines.push(WishlistLine::new(product));
        WishlistChange::Added
    }

    /// Insert a line carrying a server-confirmed row id, replacing any
    /// existing line for the same product.
    pub fn upsert(&mut self, product: Product, row_id: RowId) -> WishlistChange {
        let product_id = product.id;
        let existed = self.contains(product_id);
        self.lines.retain(|line| line.product_id() != product_id);
        self.lines.push(WishlistLine {
            product,
            row_id: Some(row_id),
        });

        if existed {
            WishlistChange::AlreadyPresent
        } else {
            WishlistChange::Added
        }
    }

    /// Remove a product. No-op when absent.
    pub fn remove(&mut self, product_id: ProductId) -> WishlistChange {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id() != product_id);

        if self.lines.len() == before {
            WishlistChange::NoOp
        } else {
            WishlistChange::Removed
        }
    }

    /// Empty the wishlist.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Replace the whole wishlist with rehydrated lines.
    pub fn replace(&mut self, lines: Vec<WishlistLine>) {
        self.lines = lines;
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[WishlistLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&WishlistLine> {
        self.lines
            .iter()
            .find(|line| line.product_id() == product_id)
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lines
            .iter()
            .any(|line| line.product_id() == product_id)
    }

    /// Whether the wishlist has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Pending markers
    // =========================================================================

    /// Mark a product as having an in-flight remote operation.
    pub fn begin_pending(&mut self, product_id: ProductId) {
        self.pending.insert(product_id);
    }

    /// Clear the in-flight marker for a product.
    pub fn end_pending(&mut self, product_id: ProductId) {
        self.pending.remove(&product_id);
    }

    /// Whether a remote operation for this product is in flight.
    #[must_use]
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.pending.contains(&product_id)
    }
}
