use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API refused the request; `message` is what it said.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Auth response could not be decoded: {0}")]
    Decode(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StorageError),
}
