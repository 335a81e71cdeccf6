//! Fernwood Core - Shared types library.
//!
//! This crate provides the common types used across Fernwood components:
//! - `storefront` - Cart/wishlist state and remote synchronization
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no mutable
//! state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the catalog product model, cart and wishlist
//!   lines, and money formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
