//! Fernwood Storefront - cart and wishlist state with remote sync.
//!
//! This crate implements the client-side cart/wishlist subsystem of the
//! Fernwood storefront:
//!
//! - Guest cart and wishlist state held locally and persisted under fixed
//!   storage keys, mutated by pure reducers ([`state`], [`persist`])
//! - A row-store gateway against the hosted backend that persists cart and
//!   wishlist rows per authenticated user ([`gateway`])
//! - A product catalog client used to hydrate persisted rows back into
//!   display-ready lines ([`catalog`])
//! - The sync orchestrator that merges guest state into the remote store on
//!   login, rehydrates from the remote store, clears on logout, and routes
//!   every cart/wishlist mutation through the local-only or write-through
//!   path depending on the current session ([`sync`], [`session`])
//!
//! The auth provider and the product catalog are external collaborators:
//! this crate only reads the current session and product details, never
//! owns them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod persist;
pub mod session;
pub mod state;
pub mod sync;

pub use error::StoreError;
pub use session::{Session, SessionFeed, session_feed};
pub use sync::SyncOrchestrator;
