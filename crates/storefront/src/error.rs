//! Unified error handling for the cart/wishlist subsystem.
//!
//! Every failure is per-operation and recoverable: the user retries the
//! triggering action. Nothing here is fatal to the host application.
//!
//! A "row not found" result from the gateway is not an error - gateway
//! lookups return `Ok(None)` for absent rows, which is what distinguishes
//! the insert branch from the update branch during sync.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::gateway::GatewayError;

/// Subsystem error, split by the kind of remote operation that failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read (fetch or existence lookup) against the row store failed.
    /// Dependent UI should show an empty/error state rather than a guess.
    #[error("remote read failed: {0}")]
    RemoteRead(#[source] GatewayError),

    /// A write (insert/update/delete) against the row store failed.
    /// Local state is left at its last-confirmed value.
    #[error("remote write failed: {0}")]
    RemoteWrite(#[source] GatewayError),

    /// A product lookup during rehydration failed. One failed lookup fails
    /// the whole batch; local state is left unchanged.
    #[error("hydration failed: {0}")]
    Hydration(#[from] CatalogError),
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
