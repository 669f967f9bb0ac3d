//! The shopping cart, stored under `cart`.
//!
//! Lines are product snapshots with a quantity; the stored shape is the product's own
//! fields plus `quantity`.

use crate::model::{Product, ProductId};
use crate::storage::{JsonStore, KeyValueStore, StorageError, CART_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Orders strictly above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: f64 = 50.0;
pub const SHIPPING_FEE: f64 = 5.99;
pub const TAX_RATE: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartSummary {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl CartSummary {
    pub fn for_subtotal(subtotal: f64) -> Self {
        if subtotal <= 0.0 {
            return Self::default();
        }
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
            0.0
        } else {
            SHIPPING_FEE
        };
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let items = match store.load_json::<Vec<CartItem>>(CART_KEY) {
            Ok(items) => items.unwrap_or_default(),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "Stored cart unreadable, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { store, items })
    }

    /// Adds `quantity` units, merging into an existing line for the same product.
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<(), StorageError> {
        if quantity == 0 {
            return Ok(());
        }
        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem { product, quantity }),
        }
        debug!(lines = self.items.len(), count = self.count(), "Cart add");
        self.save()
    }

    /// Sets the quantity of a line; 0 removes it. Returns whether the line existed.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<bool, StorageError> {
        if quantity == 0 {
            return self.remove(id);
        }
        let Some(item) = self.items.iter_mut().find(|item| &item.product.id == id) else {
            return Ok(false);
        };
        item.quantity = quantity;
        self.save()?;
        Ok(true)
    }

    pub fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let before = self.items.len();
        self.items.retain(|item| &item.product.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        self.save()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Total number of units across all lines.
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary::for_subtotal(self.subtotal())
    }

    fn save(&self) -> Result<(), StorageError> {
        self.store.save_json(CART_KEY, &self.items)
    }
}
