//! Cart state and its transition functions.
//!
//! Invariants maintained by every transition:
//! - at most one line per product id
//! - `total_count` equals the sum of line quantities (recomputed after
//!   every mutation, never independently settable)
//! - line quantity is never 0: a decrement at quantity 1 removes the line

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::debug;

use fernwood_core::{CartLine, Product, ProductId, RowId};

/// Outcome of a cart transition, for user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added,
    /// An existing line's quantity changed.
    QuantityUpdated,
    /// The line was removed.
    Removed,
    /// Nothing matched; state is unchanged.
    NoOp,
}

/// The cart: ordered lines, cached count, drawer flag, and per-product
/// in-flight markers.
#[derive(Debug, Default)]
pub struct CartState {
    /// Lines in insertion order.
    lines: Vec<CartLine>,
    /// Cached sum of quantities.
    total_count: u32,
    /// Cart drawer visibility.
    drawer_open: bool,
    /// Products with an in-flight remote operation. The UI disables the
    /// matching controls to prevent duplicate concurrent submissions.
    pending: HashSet<ProductId>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Add a product: increment the existing line's quantity by 1, or append
    /// a new line with quantity 1.
    pub fn add(&mut self, product: Product) -> CartChange {
        let change = if let Some(line) = self.line_mut(product.id) {
            line.quantity += 1;
            CartChange::QuantityUpdated
        } else {
            self.lines.push(CartLine::new(product));
            CartChange::Added
        };

        self.recount();
        debug!(?change, total_count = self.total_count, "cart add");
        change
    }

    /// Remove the line for a product. No-op when absent.
    pub fn remove(&mut self, product_id: ProductId) -> CartChange {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id() != product_id);

        if self.lines.len() == before {
            return CartChange::NoOp;
        }

        self.recount();
        debug!(%product_id, total_count = self.total_count, "cart remove");
        CartChange::Removed
    }

    /// Increment a line's quantity by 1. No-op when absent.
    pub fn increase_quantity(&mut self, product_id: ProductId) -> CartChange {
        let Some(line) = self.line_mut(product_id) else {
            return CartChange::NoOp;
        };

        line.quantity += 1;
        self.recount();
        CartChange::QuantityUpdated
    }

    /// Decrement a line's quantity by 1, removing the line entirely at
    /// quantity 1. Quantity 0 is never a visible state.
    pub fn decrease_quantity(&mut self, product_id: ProductId) -> CartChange {
        let Some(line) = self.line_mut(product_id) else {
            return CartChange::NoOp;
        };

        let change = if line.quantity > 1 {
            line.quantity -= 1;
            CartChange::QuantityUpdated
        } else {
            self.lines.retain(|line| line.product_id() != product_id);
            CartChange::Removed
        };

        self.recount();
        change
    }

    /// Insert or overwrite a line with a server-confirmed quantity and row
    /// id. Used by the authenticated path, where the backend's value wins.
    pub fn upsert(&mut self, product: Product, quantity: u32, row_id: RowId) -> CartChange {
        let change = if let Some(line) = self.line_mut(product.id) {
            line.quantity = quantity;
            line.row_id = Some(row_id);
            CartChange::QuantityUpdated
        } else {
            self.lines.push(CartLine {
                product,
                quantity,
                row_id: Some(row_id),
            });
            CartChange::Added
        };

        self.recount();
        change
    }

    /// Empty the cart. Pending markers survive: they track in-flight remote
    /// calls, not lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recount();
    }

    /// Replace the whole cart with rehydrated lines (e.g., after login).
    pub fn replace(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
        self.recount();
    }

    fn recount(&mut self) {
        self.total_count = self.lines.iter().map(|line| line.quantity).sum();
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id() == product_id)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.product_id() == product_id)
    }

    /// Cached sum of line quantities.
    #[must_use]
    pub const fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_price).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Drawer
    // =========================================================================

    pub fn open_drawer(&mut self) {
        self.drawer_open = true;
    }

    pub fn close_drawer(&mut self) {
        self.drawer_open = false;
    }

    #[must_use]
    pub const fn is_drawer_open(&self) -> bool {
        self.drawer_open
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
