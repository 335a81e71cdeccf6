//! Sync orchestrator: reconciles guest state with the remote row store
//! across session transitions, and routes every cart/wishlist mutation
//! through the local-only or write-through path.
//!
//! # Session state machine
//!
//! - **Guest** - all mutations run against local state only, persisted
//!   under the guest storage keys.
//! - **Syncing in** - the first `User` notification after a login or
//!   registration runs the merge protocol: guest lines are merged into the
//!   remote store (additive quantities for the cart, presence-only for the
//!   wishlist), local state is cleared, then rehydrated from the
//!   now-authoritative remote rows. A one-shot latch makes this run exactly
//!   once per login even though the auth provider re-announces sessions on
//!   token refresh and tab focus.
//! - **Authenticated** - every mutation resolves the remote row, issues the
//!   matching insert/update/delete, and applies the local transition only
//!   after the backend confirms. No rollback is ever needed because local
//!   state moves only on confirmed values.
//! - **Syncing out** - a `Guest` notification clears local state, but only
//!   when an explicit logout intent was recorded via [`SyncOrchestrator::begin_logout`].
//!   A `Guest` reading that arrives before the initial auth check resolves
//!   must not wipe a restored guest cart.
//!
//! Merge writes for distinct products run concurrently; the
//! merge-then-clear-then-rehydrate sequence is strictly ordered. Clear and
//! rehydrate run only when every merge write succeeded - on failure the
//! guest state is retained untouched so the next notification can retry.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::try_join_all;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use fernwood_core::{CartLine, Product, ProductId, RowId, UserId, WishlistLine};

use crate::catalog::ProductCatalog;
use crate::error::{Result, StoreError};
use crate::gateway::RemoteStore;
use crate::persist::{self, GuestStorage};
use crate::session::{Session, SessionFeed};
use crate::state::{CartChange, CartState, WishlistChange, WishlistState};

/// The cart/wishlist subsystem facade.
///
/// Owns the local states, the remote gateway, and the catalog client, and
/// exposes the mutation entry points the UI layer calls. Construct once at
/// application start and share by reference.
pub struct SyncOrchestrator<S, C> {
    remote: S,
    catalog: C,
    feed: SessionFeed,
    storage: Box<dyn GuestStorage>,
    cart: Mutex<CartState>,
    wishlist: Mutex<WishlistState>,
    /// One-shot latch: the login merge runs exactly once per login.
    synced_in: AtomicBool,
    /// Explicit logout intent; a `Guest` notification clears state only
    /// when this is set.
    logout_intent: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl<S: RemoteStore, C: ProductCatalog> SyncOrchestrator<S, C> {
    /// Create the orchestrator, restoring any persisted guest state.
    #[must_use]
    pub fn new(remote: S, catalog: C, feed: SessionFeed, storage: Box<dyn GuestStorage>) -> Self {
        let mut cart = CartState::new();
        cart.replace(persist::load_cart(storage.as_ref()));

        let mut wishlist = WishlistState::new();
        wishlist.replace(persist::load_wishlist(storage.as_ref()));

        Self {
            remote,
            catalog,
            feed,
            storage,
            cart: Mutex::new(cart),
            wishlist: Mutex::new(wishlist),
            synced_in: AtomicBool::new(false),
            logout_intent: AtomicBool::new(false),
        }
    }

    /// The session as of right now.
    #[must_use]
    pub fn current_session(&self) -> Session {
        self.feed.current()
    }

    // =========================================================================
    // Cart mutations (dual-mode)
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// Guest: increments the existing line or appends a new one. Signed in:
    /// writes through to the row store (additive update or fresh insert)
    /// and applies the confirmed quantity locally.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails; local
    /// state is left unchanged in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: Product) -> Result<CartChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut cart = lock(&self.cart);
            let change = cart.add(product);
            persist::save_cart(self.storage.as_ref(), cart.lines());
            return Ok(change);
        };

        let product_id = product.id;
        if !self.try_begin_cart_pending(product_id) {
            return Ok(CartChange::NoOp);
        }

        let outcome = self.remote_cart_add(user_id, product_id).await;

        let mut cart = lock(&self.cart);
        cart.end_pending(product_id);
        let (quantity, row_id) = outcome?;
        Ok(cart.upsert(product, quantity, row_id))
    }

    /// Remove a product's line from the cart.
    ///
    /// A product absent from local state is a no-op and issues no remote
    /// call.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the remote delete fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<CartChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut cart = lock(&self.cart);
            let change = cart.remove(product_id);
            persist::save_cart(self.storage.as_ref(), cart.lines());
            return Ok(change);
        };

        let Some(line) = self.cart_line(product_id) else {
            return Ok(CartChange::NoOp);
        };

        if !self.try_begin_cart_pending(product_id) {
            return Ok(CartChange::NoOp);
        }

        let outcome = self.delete_remote_cart_row(user_id, &line).await;

        let mut cart = lock(&self.cart);
        cart.end_pending(product_id);
        outcome?;
        Ok(cart.remove(product_id))
    }

    /// Increment a cart line's quantity by 1. No-op when the product is not
    /// in the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails.
    #[instrument(skip(self))]
    pub async fn increase_quantity(&self, product_id: ProductId) -> Result<CartChange> {
        self.adjust_quantity(product_id, QuantityStep::Up).await
    }

    /// Decrement a cart line's quantity by 1, removing the line entirely at
    /// quantity 1. No-op when the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails.
    #[instrument(skip(self))]
    pub async fn decrease_quantity(&self, product_id: ProductId) -> Result<CartChange> {
        self.adjust_quantity(product_id, QuantityStep::Down).await
    }

    async fn adjust_quantity(&self, product_id: ProductId, step: QuantityStep) -> Result<CartChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut cart = lock(&self.cart);
            let change = match step {
                QuantityStep::Up => cart.increase_quantity(product_id),
                QuantityStep::Down => cart.decrease_quantity(product_id),
            };
            persist::save_cart(self.storage.as_ref(), cart.lines());
            return Ok(change);
        };

        let Some(line) = self.cart_line(product_id) else {
            return Ok(CartChange::NoOp);
        };

        if !self.try_begin_cart_pending(product_id) {
            return Ok(CartChange::NoOp);
        }

        let outcome = self.remote_cart_adjust(user_id, &line, step).await;

        let mut cart = lock(&self.cart);
        cart.end_pending(product_id);
        match outcome? {
            Some((quantity, row_id)) => Ok(cart.upsert(line.product, quantity, row_id)),
            None => Ok(cart.remove(product_id)),
        }
    }

    // =========================================================================
    // Wishlist mutations (dual-mode)
    // =========================================================================

    /// Toggle a product on the wishlist: remove when present, add when
    /// absent. Signed in, presence is decided by the remote row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle_wishlist(&self, product: Product) -> Result<WishlistChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut wishlist = lock(&self.wishlist);
            let change = wishlist.toggle(product);
            persist::save_wishlist(self.storage.as_ref(), wishlist.lines());
            return Ok(change);
        };

        let product_id = product.id;
        if !self.try_begin_wishlist_pending(product_id) {
            return Ok(WishlistChange::NoOp);
        }

        let outcome = self.remote_wishlist_toggle(user_id, product_id).await;

        let mut wishlist = lock(&self.wishlist);
        wishlist.end_pending(product_id);
        match outcome? {
            Some(row_id) => {
                wishlist.upsert(product, row_id);
                Ok(WishlistChange::Added)
            }
            None => {
                wishlist.remove(product_id);
                Ok(WishlistChange::Removed)
            }
        }
    }

    /// Add a product to the wishlist, rejecting silently when it is already
    /// there.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_wishlist(&self, product: Product) -> Result<WishlistChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut wishlist = lock(&self.wishlist);
            let change = wishlist.add(product);
            if change == WishlistChange::Added {
                persist::save_wishlist(self.storage.as_ref(), wishlist.lines());
            }
            return Ok(change);
        };

        let product_id = product.id;
        if !self.try_begin_wishlist_pending(product_id) {
            return Ok(WishlistChange::NoOp);
        }

        let outcome = self.remote_wishlist_add(user_id, product_id).await;

        let mut wishlist = lock(&self.wishlist);
        wishlist.end_pending(product_id);
        let (row_id, already_present) = outcome?;
        wishlist.upsert(product, row_id);
        if already_present {
            Ok(WishlistChange::AlreadyPresent)
        } else {
            Ok(WishlistChange::Added)
        }
    }

    /// Remove a product from the wishlist. A product absent from local
    /// state is a no-op and issues no remote call.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when a remote lookup or write fails.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<WishlistChange> {
        let Some(user_id) = self.current_session().user_id() else {
            let mut wishlist = lock(&self.wishlist);
            let change = wishlist.remove(product_id);
            persist::save_wishlist(self.storage.as_ref(), wishlist.lines());
            return Ok(change);
        };

        let row_id = {
            let wishlist = lock(&self.wishlist);
            match wishlist.line(product_id) {
                None => return Ok(WishlistChange::NoOp),
                Some(line) => line.row_id,
            }
        };

        if !self.try_begin_wishlist_pending(product_id) {
            return Ok(WishlistChange::NoOp);
        }

        let outcome = self
            .delete_remote_wishlist_row(user_id, product_id, row_id)
            .await;

        let mut wishlist = lock(&self.wishlist);
        wishlist.end_pending(product_id);
        outcome?;
        Ok(wishlist.remove(product_id))
    }

    // =========================================================================
    // Session transitions
    // =========================================================================

    /// Record that the user asked to sign out. The next `Guest`
    /// notification will clear local state; a `Guest` notification without
    /// this intent (e.g., the initial auth check resolving) clears nothing.
    pub fn begin_logout(&self) {
        self.logout_intent.store(true, Ordering::SeqCst);
    }

    /// React to a session notification.
    ///
    /// Duplicate `User` notifications are absorbed by the one-shot latch;
    /// the merge protocol runs exactly once per login. A failed merge
    /// releases the latch and leaves guest state untouched so the next
    /// notification retries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the merge or rehydration fails.
    #[instrument(skip(self))]
    pub async fn handle_transition(&self, session: Session) -> Result<()> {
        match session {
            Session::User(user_id) => {
                if self.synced_in.swap(true, Ordering::SeqCst) {
                    // Already synced for this login; repeated notification.
                    return Ok(());
                }

                let result = self.sync_in(user_id).await;
                if result.is_err() {
                    // Guest state was retained; allow a retry.
                    self.synced_in.store(false, Ordering::SeqCst);
                }
                result
            }
            Session::Guest => {
                if self.logout_intent.swap(false, Ordering::SeqCst) {
                    self.sync_out();
                }
                Ok(())
            }
        }
    }

    /// Drive [`Self::handle_transition`] from the session feed until the
    /// host drops the sending side.
    ///
    /// Transition failures are logged and the loop continues; the guest
    /// state they preserve is retried on the next notification. A logout
    /// arriving while a login merge is still in flight is an accepted race:
    /// the latch prevents re-entrant merges but does not cancel a running
    /// one.
    pub async fn run(&self) {
        let mut feed = self.feed.clone();
        while let Ok(session) = feed.changed().await {
            if let Err(e) = self.handle_transition(session).await {
                warn!(error = %e, "session transition failed");
            }
        }
    }

    /// Merge guest state into the remote store, then clear and rehydrate.
    async fn sync_in(&self, user_id: UserId) -> Result<()> {
        self.sync_guest_cart_to_remote(user_id).await?;
        self.sync_guest_wishlist_to_remote(user_id).await?;

        // Merge confirmed; the remote rows are now authoritative.
        self.clear_local_cart();
        self.clear_local_wishlist();

        self.fetch_and_hydrate_cart(user_id).await?;
        self.fetch_and_hydrate_wishlist(user_id).await?;

        info!(%user_id, "guest state merged and rehydrated");
        Ok(())
    }

    /// Clear local state after an explicit logout. The remote rows remain
    /// the durable copy for the next login.
    fn sync_out(&self) {
        self.clear_local_cart();
        self.clear_local_wishlist();
        self.synced_in.store(false, Ordering::SeqCst);
        info!("local state cleared on logout");
    }

    // =========================================================================
    // Merge protocol
    // =========================================================================

    /// Merge every guest cart line into the remote store. Quantities are
    /// additive: a product already in the remote cart ends up with the sum
    /// of both quantities. Writes for distinct products run concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failing write; no clearing happens in that case.
    pub async fn sync_guest_cart_to_remote(&self, user_id: UserId) -> Result<()> {
        let lines: Vec<CartLine> = lock(&self.cart).lines().to_vec();
        if lines.is_empty() {
            return Ok(());
        }

        try_join_all(
            lines
                .iter()
                .map(|line| self.merge_cart_line(user_id, line)),
        )
        .await?;
        Ok(())
    }

    /// Merge every guest wishlist line into the remote store.
    /// Presence-only: a product already in the remote wishlist is left
    /// alone, never duplicated.
    ///
    /// # Errors
    ///
    /// Returns the first failing write; no clearing happens in that case.
    pub async fn sync_guest_wishlist_to_remote(&self, user_id: UserId) -> Result<()> {
        let lines: Vec<WishlistLine> = lock(&self.wishlist).lines().to_vec();
        if lines.is_empty() {
            return Ok(());
        }

        try_join_all(
            lines
                .iter()
                .map(|line| self.merge_wishlist_line(user_id, line)),
        )
        .await?;
        Ok(())
    }

    async fn merge_cart_line(&self, user_id: UserId, line: &CartLine) -> Result<()> {
        let existing = self
            .remote
            .find_cart_row(user_id, line.product_id())
            .await
            .map_err(StoreError::RemoteRead)?;

        match existing {
            Some(row) => self
                .remote
                .update_cart_quantity(row.id, row.quantity + line.quantity)
                .await
                .map_err(StoreError::RemoteWrite),
            None => self
                .remote
                .insert_cart_row(user_id, line.product_id(), line.quantity)
                .await
                .map(|_| ())
                .map_err(StoreError::RemoteWrite),
        }
    }

    async fn merge_wishlist_line(&self, user_id: UserId, line: &WishlistLine) -> Result<()> {
        let existing = self
            .remote
            .find_wishlist_row(user_id, line.product_id())
            .await
            .map_err(StoreError::RemoteRead)?;

        if existing.is_some() {
            return Ok(());
        }

        self.remote
            .insert_wishlist_row(user_id, line.product_id())
            .await
            .map(|_| ())
            .map_err(StoreError::RemoteWrite)
    }

    // =========================================================================
    // Rehydration
    // =========================================================================

    /// Fetch the user's remote cart rows and hydrate them with catalog
    /// product data, replacing local cart state.
    ///
    /// # Errors
    ///
    /// Any failed fetch or product lookup fails the whole batch and leaves
    /// local state unchanged. Rows referencing products since removed from
    /// the catalog are not skipped.
    #[instrument(skip(self))]
    pub async fn fetch_and_hydrate_cart(&self, user_id: UserId) -> Result<()> {
        let rows = self
            .remote
            .fetch_cart(user_id)
            .await
            .map_err(StoreError::RemoteRead)?;

        let lines = try_join_all(rows.into_iter().map(|row| async move {
            let product = self.catalog.product_by_id(row.product_id).await?;
            Ok::<_, StoreError>(CartLine {
                product,
                quantity: row.quantity,
                row_id: Some(row.id),
            })
        }))
        .await?;

        lock(&self.cart).replace(lines);
        Ok(())
    }

    /// Fetch the user's remote wishlist rows and hydrate them with catalog
    /// product data, replacing local wishlist state.
    ///
    /// # Errors
    ///
    /// Any failed fetch or product lookup fails the whole batch and leaves
    /// local state unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_and_hydrate_wishlist(&self, user_id: UserId) -> Result<()> {
        let rows = self
            .remote
            .fetch_wishlist(user_id)
            .await
            .map_err(StoreError::RemoteRead)?;

        let lines = try_join_all(rows.into_iter().map(|row| async move {
            let product = self.catalog.product_by_id(row.product_id).await?;
            Ok::<_, StoreError>(WishlistLine {
                product,
                row_id: Some(row.id),
            })
        }))
        .await?;

        lock(&self.wishlist).replace(lines);
        Ok(())
    }

    /// Empty the local cart and drop its persisted guest copy.
    pub fn clear_local_cart(&self) {
        lock(&self.cart).clear();
        persist::clear_cart(self.storage.as_ref());
    }

    /// Empty the local wishlist and drop its persisted guest copy.
    pub fn clear_local_wishlist(&self) {
        lock(&self.wishlist).clear();
        persist::clear_wishlist(self.storage.as_ref());
    }

    // =========================================================================
    // Authenticated write-through helpers
    // =========================================================================

    async fn remote_cart_add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(u32, RowId)> {
        let existing = self
            .remote
            .find_cart_row(user_id, product_id)
            .await
            .map_err(StoreError::RemoteRead)?;

        match existing {
            Some(row) => {
                let quantity = row.quantity + 1;
                self.remote
                    .update_cart_quantity(row.id, quantity)
                    .await
                    .map_err(StoreError::RemoteWrite)?;
                Ok((quantity, row.id))
            }
            None => {
                let row = self
                    .remote
                    .insert_cart_row(user_id, product_id, 1)
                    .await
                    .map_err(StoreError::RemoteWrite)?;
                Ok((row.quantity, row.id))
            }
        }
    }

    /// Adjust a line's remote quantity one step. Returns the confirmed
    /// `(quantity, row_id)`, or `None` when the step deleted the row.
    async fn remote_cart_adjust(
        &self,
        user_id: UserId,
        line: &CartLine,
        step: QuantityStep,
    ) -> Result<Option<(u32, RowId)>> {
        // Rehydrated lines carry their row id; fall back to the existence
        // lookup for lines that somehow predate it.
        let (row_id, base) = match line.row_id {
            Some(row_id) => (Some(row_id), line.quantity),
            None => {
                let row = self
                    .remote
                    .find_cart_row(user_id, line.product_id())
                    .await
                    .map_err(StoreError::RemoteRead)?;
                match row {
                    Some(row) => (Some(row.id), row.quantity),
                    None => (None, line.quantity),
                }
            }
        };

        match step {
            QuantityStep::Up => {
                let quantity = base + 1;
                let row_id = match row_id {
                    Some(row_id) => {
                        self.remote
                            .update_cart_quantity(row_id, quantity)
                            .await
                            .map_err(StoreError::RemoteWrite)?;
                        row_id
                    }
                    None => {
                        self.remote
                            .insert_cart_row(user_id, line.product_id(), quantity)
                            .await
                            .map_err(StoreError::RemoteWrite)?
                            .id
                    }
                };
                Ok(Some((quantity, row_id)))
            }
            QuantityStep::Down => {
                if base > 1 {
                    let quantity = base - 1;
                    let row_id = match row_id {
                        Some(row_id) => {
                            self.remote
                                .update_cart_quantity(row_id, quantity)
                                .await
                                .map_err(StoreError::RemoteWrite)?;
                            row_id
                        }
                        None => {
                            self.remote
                                .insert_cart_row(user_id, line.product_id(), quantity)
                                .await
                                .map_err(StoreError::RemoteWrite)?
                                .id
                        }
                    };
                    Ok(Some((quantity, row_id)))
                } else {
                    if let Some(row_id) = row_id {
                        self.remote
                            .delete_cart_row(row_id)
                            .await
                            .map_err(StoreError::RemoteWrite)?;
                    }
                    Ok(None)
                }
            }
        }
    }

    async fn delete_remote_cart_row(&self, user_id: UserId, line: &CartLine) -> Result<()> {
        let row_id = match line.row_id {
            Some(row_id) => Some(row_id),
            None => self
                .remote
                .find_cart_row(user_id, line.product_id())
                .await
                .map_err(StoreError::RemoteRead)?
                .map(|row| row.id),
        };

        if let Some(row_id) = row_id {
            self.remote
                .delete_cart_row(row_id)
                .await
                .map_err(StoreError::RemoteWrite)?;
        }

        Ok(())
    }

    /// Toggle the remote wishlist row. Returns the inserted row id, or
    /// `None` when the toggle deleted an existing row.
    async fn remote_wishlist_toggle(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<RowId>> {
        let existing = self
            .remote
            .find_wishlist_row(user_id, product_id)
            .await
            .map_err(StoreError::RemoteRead)?;

        if let Some(row) = existing {
            self.remote
                .delete_wishlist_row(row.id)
                .await
                .map_err(StoreError::RemoteWrite)?;
            Ok(None)
        } else {
            let row = self
                .remote
                .insert_wishlist_row(user_id, product_id)
                .await
                .map_err(StoreError::RemoteWrite)?;
            Ok(Some(row.id))
        }
    }

    /// Insert a remote wishlist row unless one already exists. Returns the
    /// row id and whether the product was already present.
    async fn remote_wishlist_add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(RowId, bool)> {
        let existing = self
            .remote
            .find_wishlist_row(user_id, product_id)
            .await
            .map_err(StoreError::RemoteRead)?;

        if let Some(row) = existing {
            return Ok((row.id, true));
        }

        let row = self
            .remote
            .insert_wishlist_row(user_id, product_id)
            .await
            .map_err(StoreError::RemoteWrite)?;
        Ok((row.id, false))
    }

    async fn delete_remote_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
        row_id: Option<RowId>,
    ) -> Result<()> {
        let row_id = match row_id {
            Some(row_id) => Some(row_id),
            None => self
                .remote
                .find_wishlist_row(user_id, product_id)
                .await
                .map_err(StoreError::RemoteRead)?
                .map(|row| row.id),
        };

        if let Some(row_id) = row_id {
            self.remote
                .delete_wishlist_row(row_id)
                .await
                .map_err(StoreError::RemoteWrite)?;
        }

        Ok(())
    }

    fn cart_line(&self, product_id: ProductId) -> Option<CartLine> {
        lock(&self.cart).line(product_id).cloned()
    }

    /// Mark the product pending unless a cart operation is already in
    /// flight.
    fn try_begin_cart_pending(&self, product_id: ProductId) -> bool {
        let mut cart = lock(&self.cart);
        if cart.is_pending(product_id) {
            return false;
        }
        cart.begin_pending(product_id);
        true
    }

    /// Mark the product pending unless a wishlist operation is already in
    /// flight.
    fn try_begin_wishlist_pending(&self, product_id: ProductId) -> bool {
        let mut wishlist = lock(&self.wishlist);
        if wishlist.is_pending(product_id) {
            return false;
        }
        wishlist.begin_pending(product_id);
        true
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the cart lines, in insertion order.
    #[must_use]
    pub fn cart_snapshot(&self) -> Vec<CartLine> {
        lock(&self.cart).lines().to_vec()
    }

    /// Snapshot of the wishlist lines, in insertion order.
    #[must_use]
    pub fn wishlist_snapshot(&self) -> Vec<WishlistLine> {
        lock(&self.wishlist).lines().to_vec()
    }

    /// Total number of items in the cart (sum of line quantities).
    #[must_use]
    pub fn total_count(&self) -> u32 {
        lock(&self.cart).total_count()
    }

    /// Sum of `price * quantity` over all cart lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        lock(&self.cart).subtotal()
    }

    /// Whether a remote cart operation for this product is in flight. The
    /// UI disables the matching cart controls while this is true.
    #[must_use]
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        lock(&self.cart).is_pending(product_id)
    }

    /// Whether a remote wishlist operation for this product is in flight.
    /// The UI disables the matching wishlist controls while this is true.
    #[must_use]
    pub fn is_wishlist_pending(&self, product_id: ProductId) -> bool {
        lock(&self.wishlist).is_pending(product_id)
    }

    /// Open the cart drawer.
    pub fn open_cart_drawer(&self) {
        lock(&self.cart).open_drawer();
    }

    /// Close the cart drawer.
    pub fn close_cart_drawer(&self) {
        lock(&self.cart).close_drawer();
    }

    /// Whether the cart drawer is open.
    #[must_use]
    pub fn is_cart_drawer_open(&self) -> bool {
        lock(&self.cart).is_drawer_open()
    }
}

/// Direction of a one-step quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuantityStep {
    Up,
    Down,
}
