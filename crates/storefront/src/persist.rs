//! Guest-mode persistence for cart and wishlist state.
//!
//! Guest state survives page loads by being serialized into the host's
//! durable key-value storage (browser local storage, or anything else the
//! host provides through [`GuestStorage`]) under the fixed keys `"cart"`
//! and `"wishlist"`. Payloads are wrapped in a versioned envelope; a
//! version mismatch or parse failure discards the stored payload rather
//! than erroring, so a stale snapshot can never wedge startup.
//!
//! Only guest state is persisted. Once a session exists the remote row
//! store is the source of truth and the local copies are dropped.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::warn;

use fernwood_core::{CartLine, WishlistLine};

/// Storage key for the guest cart.
pub const CART_KEY: &str = "cart";

/// Storage key for the guest wishlist.
pub const WISHLIST_KEY: &str = "wishlist";

/// Current envelope schema version.
const SCHEMA_VERSION: u32 = 1;

/// Durable key-value storage provided by the host application.
pub trait GuestStorage: Send + Sync {
    /// Read the value stored under a key, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove a key and its value.
    fn remove(&self, key: &str);
}

impl<T: GuestStorage + ?Sized> GuestStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// Versioned wrapper around a persisted payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema: u32,
    lines: T,
}

fn load<T: DeserializeOwned>(storage: &dyn GuestStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;

    let envelope: Envelope<T> = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(key, error = %e, "discarding unparsable guest snapshot");
            storage.remove(key);
            return None;
        }
    };

    if envelope.schema != SCHEMA_VERSION {
        warn!(
            key,
            found = envelope.schema,
            expected = SCHEMA_VERSION,
            "discarding guest snapshot with mismatched schema"
        );
        storage.remove(key);
        return None;
    }

    Some(envelope.lines)
}

fn save<T: Serialize>(storage: &dyn GuestStorage, key: &str, lines: &T) {
    let envelope = Envelope {
        schema: SCHEMA_VERSION,
        lines,
    };

    match serde_json::to_string(&envelope) {
        Ok(raw) => storage.set(key, &raw),
        Err(e) => warn!(key, error = %e, "failed to serialize guest snapshot"),
    }
}

/// Load the persisted guest cart, discarding unusable snapshots.
#[must_use]
pub fn load_cart(storage: &dyn GuestStorage) -> Vec<CartLine> {
    load(storage, CART_KEY).unwrap_or_default()
}

/// Persist the guest cart.
pub fn save_cart(storage: &dyn GuestStorage, lines: &[CartLine]) {
    save(storage, CART_KEY, &lines);
}

/// Drop the persisted guest cart.
pub fn clear_cart(storage: &dyn GuestStorage) {
    storage.remove(CART_KEY);
}

/// Load the persisted guest wishlist, discarding unusable snapshots.
#[must_use]
pub fn load_wishlist(storage: &dyn GuestStorage) -> Vec<WishlistLine> {
    load(storage, WISHLIST_KEY).unwrap_or_default()
}

/// Persist the guest wishlist.
pub fn save_wishlist(storage: &dyn GuestStorage, lines: &[WishlistLine]) {
    save(storage, WISHLIST_KEY, &lines);
}

/// Drop the persisted guest wishlist.
pub fn clear_wishlist(storage: &dyn GuestStorage) {
    storage.remove(WISHLIST_KEY);
}

/// In-memory [`GuestStorage`] for tests and native hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GuestStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}
