//! The wishlist: a global (not per-user) list of products, stored under `wishlist`.

use crate::model::{Product, ProductId};
use crate::storage::{JsonStore, KeyValueStore, StorageError, WISHLIST_KEY};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Wishlist {
    store: Arc<dyn KeyValueStore>,
    items: Vec<Product>,
}

impl Wishlist {
    /// Reads the stored list. A blob that no longer decodes counts as empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let items = match store.load_json::<Vec<Product>>(WISHLIST_KEY) {
            Ok(items) => items.unwrap_or_default(),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "Stored wishlist unreadable, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { store, items })
    }

    /// Adds `product` unless a product with the same id is already listed.
    /// Returns whether the list changed.
    pub fn add(&mut self, product: Product) -> Result<bool, StorageError> {
        if self.contains(&product.id) {
            return Ok(false);
        }
        debug!(id = %product.id, "Wishlist add");
        self.items.push(product);
        self.save()?;
        Ok(true)
    }

    pub fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let before = self.items.len();
        self.items.retain(|p| &p.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|p| &p.id == id)
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn save(&self) -> Result<(), StorageError> {
        self.store.save_json(WISHLIST_KEY, &self.items)
    }
}
