//! # Persistent Key-Value Store
//!
//! Opaque, string-keyed blob storage with synchronous get/set/remove, standing in for the
//! browser's local storage. Values are JSON documents; the typed helpers on
//! [`JsonStore`] do the encoding.
//!
//! ## Backends
//!
//! - [`MemoryStore`] - in-process map with an optional byte quota, used by tests and as a
//!   scratch store.
//! - [`FileStore`] - one JSON file per key inside a data directory, used by the CLI.
//!
//! ## Keys
//!
//! | key | contents |
//! |-----|----------|
//! | `all_products_<user>` / `all_products_guest` | merged product set of one session |
//! | `wishlist` | wishlist products (global) |
//! | `cart` | cart lines (global) |
//! | `token` | bearer token |
//! | `user` | cached profile |

pub mod error;
pub mod file;
pub mod memory;

pub use error::*;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::model::UserId;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const WISHLIST_KEY: &str = "wishlist";
pub const CART_KEY: &str = "cart";

const PRODUCTS_KEY_PREFIX: &str = "all_products_";
const GUEST_PARTITION: &str = "guest";

/// Session-scoped key holding the merged product set.
pub fn products_key(identity: Option<&UserId>) -> String {
    match identity {
        Some(id) => format!("{PRODUCTS_KEY_PREFIX}{id}"),
        None => format!("{PRODUCTS_KEY_PREFIX}{GUEST_PARTITION}"),
    }
}

/// Synchronous blob storage.
///
/// Implementations must be safe to share between the registry actor, the session and the
/// wishlist/cart, hence `Send + Sync` with interior mutability.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed JSON access on top of any [`KeyValueStore`].
pub trait JsonStore {
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> JsonStore for S {
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_key_is_scoped_by_identity() {
        assert_eq!(products_key(Some(&UserId::from("5"))), "all_products_5");
        assert_eq!(products_key(None), "all_products_guest");
    }

    #[test]
    fn test_json_helpers_round_trip_through_dyn_store() {
        let store: std::sync::Arc<dyn KeyValueStore> = std::sync::Arc::new(MemoryStore::new());
        store.save_json("numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<u32>> = store.load_json("numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
        let missing: Option<Vec<u32>> = store.load_json("absent").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_load_json_reports_corrupt_blob() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let result: Result<Option<Vec<u32>>, _> = store.load_json("broken");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
