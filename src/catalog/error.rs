//! Error types for the remote catalog.

use thiserror::Error;

/// Errors that can occur while talking to the catalog API.
///
/// None of these are fatal to the registry: they are logged and the registry keeps
/// serving its previous view.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a response (DNS, TLS, timeout, connection reset, ...).
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Catalog returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not have any of the accepted shapes.
    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),

    /// No catalog is reachable (offline mode, test doubles).
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}
