//! Local cart and wishlist state.
//!
//! These are plain state holders with pure, synchronous transition
//! functions - no global store, no subscriber machinery. The sync
//! orchestrator owns one of each and decides when transitions run; the UI
//! layer renders snapshots and turns the returned change notices into
//! toasts.

pub mod cart;
pub mod wishlist;

pub use cart::{CartChange, CartState};
pub use wishlist::{WishlistChange, WishlistState};
