//! Error types for the product registry.

use crate::catalog::CatalogError;
use crate::model::{ProductId, ValidationError};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by [`RegistryClient`](super::RegistryClient) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No product with this id in the current session.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Only surfaced by an explicit `refresh_remote`; every other operation degrades.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The store failed. After a mutation the change is kept in memory; after a `load`
    /// the session is left empty and [`PartitionUnreadable`](Self::PartitionUnreadable).
    #[error("Product storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The session's stored products could not be read. Writes are refused until a later
    /// `load` succeeds, so the stored set is never overwritten by a partial view.
    #[error("Stored products of the current session are unreadable")]
    PartitionUnreadable,

    /// A refresh finished after the session it was started for had ended.
    #[error("Session changed before the refresh completed")]
    StaleSession,

    #[error("Registry actor closed")]
    ActorClosed,

    #[error("Registry actor dropped the response")]
    ActorDropped,
}
