//! Core types for Fernwood.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line;
pub mod money;
pub mod product;

pub use id::*;
pub use line::{CartLine, WishlistLine};
pub use money::format_usd;
pub use product::Product;
