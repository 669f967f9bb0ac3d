//! Represents a catalog item as the storefront sees it.
//!
//! A product is either **remote-origin** (owned by the catalog API, replaced wholesale on
//! every refresh) or **local-origin** (created on this device, authoritative locally). The
//! [`Origin`] tag is set once when the record is created and routes every later update and
//! delete.
//!
//! Stored records written by earlier storefront versions carry `source` (`"api"` or
//! `"local"`) and `isLocal` instead of `origin`. Those are honored in that order; only a
//! record with no tag at all falls back to the id namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::user::UserId;
use super::validation::{check_range, check_title, ValidationError};

/// Reserved prefix of locally generated identifiers.
///
/// Remote records carrying this prefix are refused on ingest, which keeps the two id
/// spaces disjoint.
pub const LOCAL_ID_PREFIX: &str = "local_";

pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const DEFAULT_BRAND: &str = "Unknown";
pub const DEFAULT_THUMBNAIL: &str = "https://via.placeholder.com/300x200?text=No+Image";
pub const DEFAULT_TITLE: &str = "Untitled";

/// Type-safe identifier for Products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(#[serde(deserialize_with = "super::string_or_number")] String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id lives in the locally reserved namespace.
    pub fn has_local_prefix(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Where a product record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[serde(alias = "api")]
    Remote,
    Local,
}

impl Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Remote => f.pad("remote"),
            Origin::Local => f.pad("local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredProduct")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub rating: f64,
    pub stock: u32,
    pub category: String,
    pub brand: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read side of [`Product`]: everything but the id may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProduct {
    id: ProductId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    discount_percentage: Option<f64>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    stock: Option<u32>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    origin: Option<Origin>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    is_local: Option<bool>,
    #[serde(default, alias = "userId")]
    owner: Option<UserId>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl StoredProduct {
    fn resolve_origin(&self) -> Origin {
        let from_source = match self.source.as_deref() {
            Some("local") => Some(Origin::Local),
            Some("api") | Some("remote") => Some(Origin::Remote),
            _ => None,
        };
        let from_flag = self
            .is_local
            .map(|local| if local { Origin::Local } else { Origin::Remote });
        self.origin.or(from_source).or(from_flag).unwrap_or(if self.id.has_local_prefix() {
            Origin::Local
        } else {
            Origin::Remote
        })
    }
}

impl From<StoredProduct> for Product {
    fn from(stored: StoredProduct) -> Self {
        let origin = stored.resolve_origin();
        Self {
            origin,
            title: non_blank(stored.title, DEFAULT_TITLE),
            description: stored.description.unwrap_or_default(),
            price: stored.price.unwrap_or(0.0),
            discount_percentage: stored.discount_percentage.unwrap_or(0.0),
            rating: stored.rating.unwrap_or(0.0),
            stock: stored.stock.unwrap_or(0),
            category: non_blank(stored.category, DEFAULT_CATEGORY),
            brand: non_blank(stored.brand, DEFAULT_BRAND),
            thumbnail: non_blank(stored.thumbnail, DEFAULT_THUMBNAIL),
            images: stored.images.unwrap_or_default(),
            owner: stored.owner,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            id: stored.id,
        }
    }
}

impl Product {
    /// Builds a local-origin product from a validated draft.
    ///
    /// Unspecified optional fields receive the storefront defaults.
    pub fn from_draft(
        id: ProductId,
        draft: ProductDraft,
        owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            price: draft.price.unwrap_or(0.0),
            discount_percentage: draft.discount_percentage.unwrap_or(0.0),
            rating: draft.rating.unwrap_or(0.0),
            stock: draft.stock.unwrap_or(0),
            category: non_blank(draft.category, DEFAULT_CATEGORY),
            brand: non_blank(draft.brand, DEFAULT_BRAND),
            thumbnail: non_blank(draft.thumbnail, DEFAULT_THUMBNAIL),
            images: draft.images.unwrap_or_default(),
            origin: Origin::Local,
            owner,
            created_at: Some(now),
            updated_at: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.origin == Origin::Local
    }

    /// Case-insensitive substring match over every string field.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            self.id.as_str(),
            &self.title,
            &self.description,
            &self.category,
            &self.brand,
            &self.thumbnail,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

fn non_blank(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Payload for creating a product. Only `title` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub rating: Option<f64>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
}

impl ProductDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(Some(&self.title))?;
        check_numbers(self.price, self.discount_percentage, self.rating)
    }
}

/// Payload for updating a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub rating: Option<f64>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(self.title.as_deref())?;
        check_numbers(self.price, self.discount_percentage, self.rating)
    }

    /// Merges the present fields into `product` and stamps `updated_at`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            product.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(discount) = self.discount_percentage {
            product.discount_percentage = discount;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(brand) = &self.brand {
            product.brand = brand.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            product.thumbnail = thumbnail.clone();
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
        product.updated_at = Some(now);
    }
}

fn check_numbers(
    price: Option<f64>,
    discount: Option<f64>,
    rating: Option<f64>,
) -> Result<(), ValidationError> {
    check_range("price", price, 0.0, f64::MAX)?;
    check_range("discountPercentage", discount, 0.0, 100.0)?;
    check_range("rating", rating, 0.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Product {
        Product::from_draft(
            ProductId::from("local_1_abc"),
            ProductDraft::new("Lamp").price(29.99).stock(5).category("home"),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_from_draft_fills_defaults() {
        let product = lamp();
        assert_eq!(product.origin, Origin::Local);
        assert_eq!(product.brand, DEFAULT_BRAND);
        assert_eq!(product.thumbnail, DEFAULT_THUMBNAIL);
        assert_eq!(product.category, "home");
        assert_eq!(product.description, "");
        assert!(product.created_at.is_some());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut product = lamp();
        let patch = ProductPatch {
            price: Some(19.5),
            brand: Some("Lumen".into()),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut product, Utc::now());

        assert_eq!(product.price, 19.5);
        assert_eq!(product.brand, "Lumen");
        assert_eq!(product.title, "Lamp");
        assert_eq!(product.stock, 5);
        assert!(product.updated_at.is_some());
    }

    #[test]
    fn test_matches_is_case_insensitive_across_fields() {
        let mut product = lamp();
        product.description = "Brass desk LAMP with dimmer".into();
        assert!(product.matches("dimmer"));
        assert!(product.matches("home"));
        assert!(product.matches("local_1"));
        assert!(!product.matches("shoe"));
    }

    #[test]
    fn test_numeric_ids_deserialize_as_strings() {
        let id: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        let id: ProductId = serde_json::from_str("\"local_9_x\"").unwrap();
        assert!(id.has_local_prefix());
    }

    #[test]
    fn test_legacy_api_origin_alias() {
        let origin: Origin = serde_json::from_str("\"api\"").unwrap();
        assert_eq!(origin, Origin::Remote);
        assert_eq!(serde_json::to_string(&Origin::Local).unwrap(), "\"local\"");
    }

    #[test]
    fn test_stored_record_round_trips() {
        let product = lamp();
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["origin"], "local");
        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_legacy_records_resolve_origin_from_source_and_flag() {
        let records: Vec<Product> = serde_json::from_value(serde_json::json!([
            {"id": "local_1700000000000_abcdefghi", "title": "Lamp", "price": 29.99,
             "isLocal": true, "source": "local", "userId": 1,
             "createdAt": "2024-01-05T10:00:00.000Z"},
            {"id": 1, "title": "Essence Mascara", "price": 9.99, "isLocal": false, "source": "api"},
            {"id": 2, "title": "Flagged only", "isLocal": true},
            {"id": 3, "title": "Source wins", "source": "api", "isLocal": true},
            {"id": "local_5_x", "title": "No tag at all"}
        ]))
        .unwrap();

        assert_eq!(records[0].origin, Origin::Local);
        assert_eq!(records[0].owner, Some(UserId::from(1u64)));
        assert!(records[0].created_at.is_some());
        assert_eq!(records[0].category, DEFAULT_CATEGORY);
        assert_eq!(records[1].origin, Origin::Remote);
        assert_eq!(records[1].id.as_str(), "1");
        assert_eq!(records[2].origin, Origin::Local);
        assert_eq!(records[3].origin, Origin::Remote);
        assert_eq!(records[4].origin, Origin::Local);
    }

    #[test]
    fn test_draft_validation() {
        assert!(ProductDraft::new("Lamp").price(10.0).validate().is_ok());
        assert_eq!(
            ProductDraft::new(" ").validate(),
            Err(ValidationError::MissingTitle)
        );
        let mut draft = ProductDraft::new("Lamp");
        draft.rating = Some(7.0);
        assert!(draft.validate().is_err());
    }
}
