//! End-to-end login/logout synchronization scenarios.
//!
//! Exercises the orchestrator against in-memory implementations of the row
//! store and the product catalog, covering the merge protocol, the
//! one-shot latch, logout clearing, and the authenticated write-through
//! path.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use fernwood_core::{Product, ProductId, RowId, UserId};
use fernwood_storefront::catalog::{CatalogError, ProductCatalog};
use fernwood_storefront::gateway::{CartRow, GatewayError, RemoteStore, WishlistRow};
use fernwood_storefront::persist::{self, GuestStorage, MemoryStorage};
use fernwood_storefront::session::{Session, session_feed};
use fernwood_storefront::state::{CartChange, WishlistChange};
use fernwood_storefront::{StoreError, SyncOrchestrator};

// =============================================================================
// In-memory fakes
// =============================================================================

#[derive(Default)]
struct MemoryStoreInner {
    cart: Mutex<Vec<CartRow>>,
    wishlist: Mutex<Vec<WishlistRow>>,
    ops: Mutex<Vec<&'static str>>,
    fail_cart_writes: AtomicBool,
    fail_wishlist_writes: AtomicBool,
}

/// In-memory row store with an operation log and write-failure injection.
#[derive(Clone, Default)]
struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    fn new() -> Self {
        Self::default()
    }

    fn record(&self, op: &'static str) {
        self.inner.ops.lock().unwrap().push(op);
    }

    fn op_count(&self, op: &'static str) -> usize {
        self.inner.ops.lock().unwrap().iter().filter(|o| **o == op).count()
    }

    fn total_ops(&self) -> usize {
        self.inner.ops.lock().unwrap().len()
    }

    fn fail_cart_writes(&self, fail: bool) {
        self.inner.fail_cart_writes.store(fail, Ordering::SeqCst);
    }

    fn fail_wishlist_writes(&self, fail: bool) {
        self.inner.fail_wishlist_writes.store(fail, Ordering::SeqCst);
    }

    fn seed_cart_row(&self, user_id: UserId, product_id: ProductId, quantity: u32) -> RowId {
        let id = RowId::new(Uuid::new_v4());
        self.inner.cart.lock().unwrap().push(CartRow {
            id,
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        });
        id
    }

    fn seed_wishlist_row(&self, user_id: UserId, product_id: ProductId) -> RowId {
        let id = RowId::new(Uuid::new_v4());
        self.inner.wishlist.lock().unwrap().push(WishlistRow {
            id,
            user_id,
            product_id,
            created_at: Utc::now(),
        });
        id
    }

    fn cart_rows(&self, user_id: UserId) -> Vec<CartRow> {
        self.inner
            .cart
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect()
    }

    fn wishlist_rows(&self, user_id: UserId) -> Vec<WishlistRow> {
        self.inner
            .wishlist
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect()
    }

    fn check_cart_write(&self) -> Result<(), GatewayError> {
        if self.inner.fail_cart_writes.load(Ordering::SeqCst) {
            Err(GatewayError::Api {
                status: 500,
                message: "injected write failure".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn check_wishlist_write(&self) -> Result<(), GatewayError> {
        if self.inner.fail_wishlist_writes.load(Ordering::SeqCst) {
            Err(GatewayError::Api {
                status: 500,
                message: "injected write failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch_cart(&self, user_id: UserId) -> Result<Vec<CartRow>, GatewayError> {
        self.record("fetch_cart");
        Ok(self.cart_rows(user_id))
    }

    async fn fetch_wishlist(&self, user_id: UserId) -> Result<Vec<WishlistRow>, GatewayError> {
        self.record("fetch_wishlist");
        Ok(self.wishlist_rows(user_id))
    }

    async fn find_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartRow>, GatewayError> {
        self.record("find_cart_row");
        Ok(self
            .inner
            .cart
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.user_id == user_id && row.product_id == product_id)
            .cloned())
    }

    async fn find_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishlistRow>, GatewayError> {
        self.record("find_wishlist_row");
        Ok(self
            .inner
            .wishlist
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.user_id == user_id && row.product_id == product_id)
            .cloned())
    }

    async fn insert_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartRow, GatewayError> {
        self.record("insert_cart_row");
        self.check_cart_write()?;
        let row = CartRow {
            id: RowId::new(Uuid::new_v4()),
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        };
        self.inner.cart.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_cart_quantity(
        &self,
        row_id: RowId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        self.record("update_cart_quantity");
        self.check_cart_write()?;
        let mut cart = self.inner.cart.lock().unwrap();
        let row = cart
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or(GatewayError::Api {
                status: 404,
                message: "no such row".to_string(),
            })?;
        row.quantity = quantity;
        Ok(())
    }

    async fn delete_cart_row(&self, row_id: RowId) -> Result<(), GatewayError> {
        self.record("delete_cart_row");
        self.check_cart_write()?;
        self.inner.cart.lock().unwrap().retain(|row| row.id != row_id);
        Ok(())
    }

    async fn insert_wishlist_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistRow, GatewayError> {
        self.record("insert_wishlist_row");
        self.check_wishlist_write()?;
        let row = WishlistRow {
            id: RowId::new(Uuid::new_v4()),
            user_id,
            product_id,
            created_at: Utc::now(),
        };
        self.inner.wishlist.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn delete_wishlist_row(&self, row_id: RowId) -> Result<(), GatewayError> {
        self.record("delete_wishlist_row");
        self.check_wishlist_write()?;
        self.inner
            .wishlist
            .lock()
            .unwrap()
            .retain(|row| row.id != row_id);
        Ok(())
    }
}

/// In-memory catalog; unknown products fail lookups like a 404 would.
#[derive(Clone, Default)]
struct MemoryCatalog {
    products: Arc<Mutex<HashMap<ProductId, Product>>>,
}

impl MemoryCatalog {
    fn with(products: &[Product]) -> Self {
        let catalog = Self::default();
        let mut map = catalog.products.lock().unwrap();
        for product in products {
            map.insert(product.id, product.clone());
        }
        drop(map);
        catalog
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn product(id: i64, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        description: None,
        category: Some("furniture".to_string()),
        price: Decimal::from(price),
        thumbnail: format!("https://cdn.example.com/{id}.webp"),
    }
}

struct Fixture {
    store: MemoryStore,
    storage: Arc<MemoryStorage>,
    session_tx: tokio::sync::watch::Sender<Session>,
    orchestrator: SyncOrchestrator<MemoryStore, MemoryCatalog>,
    user: UserId,
}

fn fixture(products: &[Product]) -> Fixture {
    let store = MemoryStore::new();
    let catalog = MemoryCatalog::with(products);
    let storage = Arc::new(MemoryStorage::new());
    let (session_tx, feed) = session_feed(Session::Guest);

    let orchestrator = SyncOrchestrator::new(
        store.clone(),
        catalog,
        feed,
        Box::new(Arc::clone(&storage)),
    );

    Fixture {
        store,
        storage,
        session_tx,
        orchestrator,
        user: UserId::new(Uuid::new_v4()),
    }
}

async fn login(fx: &Fixture) {
    fx.session_tx.send(Session::User(fx.user)).unwrap();
    fx.orchestrator
        .handle_transition(Session::User(fx.user))
        .await
        .expect("login sync");
}

// =============================================================================
// Merge protocol
// =============================================================================

#[tokio::test]
async fn merge_is_additive_for_existing_remote_lines() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    // Guest cart: P with quantity 2.
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    // Remote cart already holds P with quantity 3.
    fx.store.seed_cart_row(fx.user, p.id, 3);

    login(&fx).await;

    let rows = fx.store.cart_rows(fx.user);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5);

    let local = fx.orchestrator.cart_snapshot();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].quantity, 5);
    assert_eq!(local[0].row_id, Some(rows[0].id));
    assert_eq!(fx.orchestrator.total_count(), 5);
}

#[tokio::test]
async fn merge_inserts_lines_absent_remotely() {
    let q = product(2, 25);
    let fx = fixture(&[q.clone()]);

    fx.orchestrator.add_to_cart(q.clone()).await.unwrap();
    fx.orchestrator.add_to_cart(q.clone()).await.unwrap();

    login(&fx).await;

    let rows = fx.store.cart_rows(fx.user);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, q.id);
    assert_eq!(rows[0].quantity, 2);

    // The rehydrated line carries the backend-assigned row id.
    let local = fx.orchestrator.cart_snapshot();
    assert_eq!(local[0].row_id, Some(rows[0].id));
}

#[tokio::test]
async fn wishlist_merge_never_duplicates() {
    let r = product(3, 40);
    let fx = fixture(&[r.clone()]);

    fx.orchestrator.toggle_wishlist(r.clone()).await.unwrap();
    fx.store.seed_wishlist_row(fx.user, r.id);

    login(&fx).await;

    let rows = fx.store.wishlist_rows(fx.user);
    assert_eq!(rows.len(), 1, "exactly one remote wishlist row for R");
    assert_eq!(fx.store.op_count("insert_wishlist_row"), 0);

    let local = fx.orchestrator.wishlist_snapshot();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].row_id, Some(rows[0].id));
}

#[tokio::test]
async fn empty_guest_state_skips_merge_writes() {
    let fx = fixture(&[]);

    login(&fx).await;

    assert_eq!(fx.store.op_count("insert_cart_row"), 0);
    assert_eq!(fx.store.op_count("update_cart_quantity"), 0);
    assert_eq!(fx.store.op_count("insert_wishlist_row"), 0);
    // Rehydration still ran.
    assert_eq!(fx.store.op_count("fetch_cart"), 1);
    assert_eq!(fx.store.op_count("fetch_wishlist"), 1);
}

#[tokio::test]
async fn login_merge_runs_exactly_once_despite_repeated_notifications() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();
    fx.store.seed_cart_row(fx.user, p.id, 3);

    // Two consecutive "session became Some(u)" notifications, no logout.
    login(&fx).await;
    login(&fx).await;

    let rows = fx.store.cart_rows(fx.user);
    assert_eq!(rows[0].quantity, 4, "merge applied once, not twice");
    assert_eq!(fx.store.op_count("update_cart_quantity"), 1);
    assert_eq!(fx.store.op_count("fetch_cart"), 1);
}

#[tokio::test]
async fn failed_merge_retains_guest_state_for_retry() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    fx.store.fail_cart_writes(true);
    let err = fx
        .orchestrator
        .handle_transition(Session::User(fx.user))
        .await
        .expect_err("merge must fail");
    assert!(matches!(err, StoreError::RemoteWrite(_)));

    // Guest state untouched, persisted copy intact.
    let local = fx.orchestrator.cart_snapshot();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].quantity, 2);
    assert!(fx.storage.get(persist::CART_KEY).is_some());

    // The latch released; the next notification retries and succeeds.
    fx.store.fail_cart_writes(false);
    fx.orchestrator
        .handle_transition(Session::User(fx.user))
        .await
        .expect("retry succeeds");
    assert_eq!(fx.store.cart_rows(fx.user)[0].quantity, 2);
}

#[tokio::test]
async fn hydration_failure_leaves_local_state_unchanged() {
    let fx = fixture(&[]); // catalog knows nothing

    let missing = ProductId::new(404);
    fx.store.seed_cart_row(fx.user, missing, 1);

    // Give local state something observable first.
    let p = product(7, 10);
    fx.orchestrator.add_to_cart(p).await.unwrap();

    let err = fx
        .orchestrator
        .fetch_and_hydrate_cart(fx.user)
        .await
        .expect_err("hydration must fail");
    assert!(matches!(err, StoreError::Hydration(_)));

    let local = fx.orchestrator.cart_snapshot();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].product_id(), ProductId::new(7));
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn logout_clears_local_state_only_with_intent() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    // A Guest notification without logout intent (initial auth check
    // resolving) must not wipe the restored guest cart.
    fx.orchestrator
        .handle_transition(Session::Guest)
        .await
        .unwrap();
    assert_eq!(fx.orchestrator.cart_snapshot().len(), 1);

    login(&fx).await;

    fx.orchestrator.begin_logout();
    fx.session_tx.send(Session::Guest).unwrap();
    fx.orchestrator
        .handle_transition(Session::Guest)
        .await
        .unwrap();

    assert!(fx.orchestrator.cart_snapshot().is_empty());
    assert!(fx.orchestrator.wishlist_snapshot().is_empty());
    // Remote rows remain the durable copy.
    assert_eq!(fx.store.cart_rows(fx.user).len(), 1);
}

#[tokio::test]
async fn login_after_logout_syncs_again() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;
    assert_eq!(fx.store.op_count("fetch_cart"), 1);

    fx.orchestrator.begin_logout();
    fx.session_tx.send(Session::Guest).unwrap();
    fx.orchestrator
        .handle_transition(Session::Guest)
        .await
        .unwrap();

    // Second login runs the sync pass again (latch was reset on logout).
    login(&fx).await;
    assert_eq!(fx.store.op_count("fetch_cart"), 2);
}

// =============================================================================
// Authenticated write-through
// =============================================================================

#[tokio::test]
async fn authenticated_add_writes_through_and_applies_confirmed_value() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;

    assert_eq!(
        fx.orchestrator.add_to_cart(p.clone()).await.unwrap(),
        CartChange::Added
    );
    assert_eq!(
        fx.orchestrator.add_to_cart(p.clone()).await.unwrap(),
        CartChange::QuantityUpdated
    );

    let rows = fx.store.cart_rows(fx.user);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 2);
    assert_eq!(fx.orchestrator.total_count(), 2);
    assert_eq!(fx.orchestrator.subtotal(), Decimal::from(20));
}

#[tokio::test]
async fn authenticated_remove_of_absent_product_issues_no_remote_call() {
    let fx = fixture(&[]);

    login(&fx).await;
    let baseline = fx.store.total_ops();

    let change = fx
        .orchestrator
        .remove_from_cart(ProductId::new(99))
        .await
        .unwrap();

    assert_eq!(change, CartChange::NoOp);
    assert_eq!(fx.store.total_ops(), baseline, "no remote call issued");
}

#[tokio::test]
async fn authenticated_decrease_at_quantity_one_deletes_the_row() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    let change = fx.orchestrator.decrease_quantity(p.id).await.unwrap();
    assert_eq!(change, CartChange::Removed);
    assert!(fx.store.cart_rows(fx.user).is_empty());
    assert!(fx.orchestrator.cart_snapshot().is_empty());
}

#[tokio::test]
async fn authenticated_increase_updates_remote_then_local() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    let change = fx.orchestrator.increase_quantity(p.id).await.unwrap();
    assert_eq!(change, CartChange::QuantityUpdated);
    assert_eq!(fx.store.cart_rows(fx.user)[0].quantity, 2);
    assert_eq!(fx.orchestrator.total_count(), 2);
}

#[tokio::test]
async fn failed_remote_write_leaves_local_state_unchanged() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    fx.store.fail_cart_writes(true);
    let err = fx
        .orchestrator
        .add_to_cart(p.clone())
        .await
        .expect_err("write must fail");
    assert!(matches!(err, StoreError::RemoteWrite(_)));

    // Last-confirmed value, and the pending marker was released.
    assert_eq!(fx.orchestrator.total_count(), 1);
    assert!(!fx.orchestrator.is_pending(p.id));
}

#[tokio::test]
async fn authenticated_wishlist_toggle_round_trips() {
    let p = product(5, 60);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;

    assert_eq!(
        fx.orchestrator.toggle_wishlist(p.clone()).await.unwrap(),
        WishlistChange::Added
    );
    assert_eq!(fx.store.wishlist_rows(fx.user).len(), 1);

    assert_eq!(
        fx.orchestrator.toggle_wishlist(p.clone()).await.unwrap(),
        WishlistChange::Removed
    );
    assert!(fx.store.wishlist_rows(fx.user).is_empty());
    assert!(fx.orchestrator.wishlist_snapshot().is_empty());
}

#[tokio::test]
async fn authenticated_wishlist_add_is_idempotent_remotely() {
    let p = product(5, 60);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;

    assert_eq!(
        fx.orchestrator.add_to_wishlist(p.clone()).await.unwrap(),
        WishlistChange::Added
    );
    assert_eq!(
        fx.orchestrator.add_to_wishlist(p.clone()).await.unwrap(),
        WishlistChange::AlreadyPresent
    );
    assert_eq!(fx.store.wishlist_rows(fx.user).len(), 1);
}

#[tokio::test]
async fn failed_wishlist_write_leaves_local_unchanged_and_releases_pending() {
    let p = product(5, 60);
    let fx = fixture(&[p.clone()]);

    login(&fx).await;

    fx.store.fail_wishlist_writes(true);
    let err = fx
        .orchestrator
        .toggle_wishlist(p.clone())
        .await
        .expect_err("write must fail");
    assert!(matches!(err, StoreError::RemoteWrite(_)));

    assert!(fx.orchestrator.wishlist_snapshot().is_empty());
    assert!(!fx.orchestrator.is_wishlist_pending(p.id));

    // The released marker allows a retry once the backend recovers.
    fx.store.fail_wishlist_writes(false);
    assert_eq!(
        fx.orchestrator.toggle_wishlist(p.clone()).await.unwrap(),
        WishlistChange::Added
    );
    assert!(!fx.orchestrator.is_wishlist_pending(p.id));
}

// =============================================================================
// Guest persistence across restarts
// =============================================================================

#[tokio::test]
async fn guest_cart_survives_a_restart() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);

    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    // Rebuild the orchestrator over the same storage, as a reload would.
    let (_tx, feed) = session_feed(Session::Guest);
    let reborn = SyncOrchestrator::new(
        MemoryStore::new(),
        MemoryCatalog::with(&[p.clone()]),
        feed,
        Box::new(Arc::clone(&fx.storage)),
    );

    assert_eq!(reborn.total_count(), 2);
    assert_eq!(reborn.cart_snapshot()[0].product_id(), p.id);
}

// =============================================================================
// Feed-driven loop
// =============================================================================

#[tokio::test]
async fn run_loop_reacts_to_session_notifications() {
    let p = product(1, 10);
    let fx = fixture(&[p.clone()]);
    fx.orchestrator.add_to_cart(p.clone()).await.unwrap();

    let store = fx.store.clone();
    let user = fx.user;
    let orchestrator = Arc::new(fx.orchestrator);

    let runner = Arc::clone(&orchestrator);
    let handle = tokio::spawn(async move { runner.run().await });

    fx.session_tx.send(Session::User(user)).unwrap();

    // Wait for the merge to land.
    for _ in 0..100 {
        if !store.cart_rows(user).is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(store.cart_rows(user).len(), 1);
    assert!(orchestrator.cart_snapshot()[0].row_id.is_some());

    drop(fx.session_tx); // closes the feed; run() exits
    handle.await.unwrap();
}
