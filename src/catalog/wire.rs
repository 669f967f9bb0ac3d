//! Wire shapes of the catalog API and the normalization applied on ingest.
//!
//! The API is treated as untrusted: every field of a [`RemoteProduct`] is optional, numbers
//! may arrive as strings, and list endpoints answer either with an envelope or a bare array.
//! A field of the wrong JSON type decodes as absent, so only a missing or reserved id can
//! cost a record.

use crate::model::{
    Origin, Product, ProductDraft, ProductId, ProductPatch, DEFAULT_BRAND, DEFAULT_CATEGORY,
    DEFAULT_THUMBNAIL, DEFAULT_TITLE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// A product record exactly as the API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProduct {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<ProductId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    pub price: Option<Value>,
    pub discount_percentage: Option<Value>,
    pub rating: Option<Value>,
    pub stock: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_images")]
    pub images: Option<Vec<String>>,
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ProductId>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(ProductId::new(id)),
        Some(Value::Number(id)) => Some(ProductId::new(id.to_string())),
        _ => None,
    })
}

/// Strings pass through and numbers keep their textual form. Anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A list keeps its string entries; a lone string becomes a one-image list.
fn lenient_images<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(url) => Some(url),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(url)) if !url.trim().is_empty() => Some(vec![url]),
        _ => None,
    })
}

impl RemoteProduct {
    pub fn new(id: impl Into<ProductId>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(Value::from(price));
        self
    }

    pub fn stock(mut self, stock: u32) -> Self {
        self.stock = Some(Value::from(stock));
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

    /// Converts the record into a remote-origin [`Product`], filling documented defaults.
    ///
    /// Returns `None` when the record has no id, or an id in the locally reserved
    /// namespace.
    pub fn normalize(self) -> Option<Product> {
        let id = self.id?;
        if id.has_local_prefix() {
            warn!(%id, "Dropping remote record with reserved local id");
            return None;
        }
        Some(Product {
            id,
            title: text_or(self.title, DEFAULT_TITLE),
            description: self.description.unwrap_or_default(),
            price: self.price.as_ref().map(coerce_number).unwrap_or(0.0),
            discount_percentage: self
                .discount_percentage
                .as_ref()
                .map(|v| coerce_number(v).min(100.0))
                .unwrap_or(0.0),
            rating: self
                .rating
                .as_ref()
                .map(|v| coerce_number(v).min(5.0))
                .unwrap_or(0.0),
            stock: self.stock.as_ref().map(coerce_count).unwrap_or(0),
            category: text_or(self.category, DEFAULT_CATEGORY),
            brand: text_or(self.brand, DEFAULT_BRAND),
            thumbnail: text_or(self.thumbnail, DEFAULT_THUMBNAIL),
            images: self.images.unwrap_or_default(),
            origin: Origin::Remote,
            owner: None,
            created_at: None,
            updated_at: None,
        })
    }

    /// Copies the fields this record carries onto `product`, keeping its id and origin.
    pub fn overlay(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(title) = self.title.as_ref().filter(|t| !t.trim().is_empty()) {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = &self.price {
            product.price = coerce_number(price);
        }
        if let Some(discount) = &self.discount_percentage {
            product.discount_percentage = coerce_number(discount).min(100.0);
        }
        if let Some(rating) = &self.rating {
            product.rating = coerce_number(rating).min(5.0);
        }
        if let Some(stock) = &self.stock {
            product.stock = coerce_count(stock);
        }
        if let Some(category) = self.category.as_ref().filter(|c| !c.trim().is_empty()) {
            product.category = category.clone();
        }
        if let Some(brand) = self.brand.as_ref().filter(|b| !b.trim().is_empty()) {
            product.brand = brand.clone();
        }
        if let Some(thumbnail) = self.thumbnail.as_ref().filter(|t| !t.trim().is_empty()) {
            product.thumbnail = thumbnail.clone();
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
        product.updated_at = Some(now);
    }
}

fn text_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Numbers, numeric strings, or 0. Negative and non-finite values become 0.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

fn coerce_count(value: &Value) -> u32 {
    let n = coerce_number(value).trunc();
    if n >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        n as u32
    }
}

/// Normalizes a batch of remote records, dropping unusable ones and duplicate ids.
pub fn normalize_all(records: Vec<RemoteProduct>) -> Vec<Product> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter_map(RemoteProduct::normalize)
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PageEnvelope")]
pub struct ProductPage {
    pub products: Vec<RemoteProduct>,
    pub total: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl ProductPage {
    pub fn new(products: Vec<RemoteProduct>) -> Self {
        let total = products.len() as u64;
        Self {
            products,
            total: Some(total),
            skip: Some(0),
            limit: Some(total),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageEnvelope {
    Wrapped {
        products: Vec<Value>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        skip: Option<u64>,
        #[serde(default)]
        limit: Option<u64>,
    },
    Bare(Vec<Value>),
}

impl From<PageEnvelope> for ProductPage {
    fn from(envelope: PageEnvelope) -> Self {
        let (raw, total, skip, limit) = match envelope {
            PageEnvelope::Wrapped {
                products,
                total,
                skip,
                limit,
            } => (products, total, skip, limit),
            PageEnvelope::Bare(products) => (products, None, None, None),
        };
        let products = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RemoteProduct>(value) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed catalog record");
                    None
                }
            })
            .collect();
        Self {
            products,
            total,
            skip,
            limit,
        }
    }
}

/// A catalog category. Older API versions answer with bare slugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCategory")]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCategory {
    Full {
        slug: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
    Slug(String),
}

impl From<RawCategory> for Category {
    fn from(raw: RawCategory) -> Self {
        match raw {
            RawCategory::Full { slug, name, url } => Self {
                name: name.unwrap_or_else(|| slug.clone()),
                slug,
                url,
            },
            RawCategory::Slug(slug) => Self {
                name: slug.clone(),
                slug,
                url: None,
            },
        }
    }
}

/// Body of `POST /products/add` and `PUT /products/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            title: Some(product.title.clone()),
            description: Some(product.description.clone()),
            price: Some(product.price),
            discount_percentage: Some(product.discount_percentage),
            rating: Some(product.rating),
            stock: Some(product.stock),
            category: Some(product.category.clone()),
            brand: Some(product.brand.clone()),
            thumbnail: Some(product.thumbnail.clone()),
            images: Some(product.images.clone()),
        }
    }
}

impl From<&ProductDraft> for ProductPayload {
    fn from(draft: &ProductDraft) -> Self {
        Self {
            title: Some(draft.title.clone()),
            description: draft.description.clone(),
            price: draft.price,
            discount_percentage: draft.discount_percentage,
            rating: draft.rating,
            stock: draft.stock,
            category: draft.category.clone(),
            brand: draft.brand.clone(),
            thumbnail: draft.thumbnail.clone(),
            images: draft.images.clone(),
        }
    }
}

impl From<&ProductPatch> for ProductPayload {
    fn from(patch: &ProductPatch) -> Self {
        Self {
            title: patch.title.clone(),
            description: patch.description.clone(),
            price: patch.price,
            discount_percentage: patch.discount_percentage,
            rating: patch.rating,
            stock: patch.stock,
            category: patch.category.clone(),
            brand: patch.brand.clone(),
            thumbnail: patch.thumbnail.clone(),
            images: patch.images.clone(),
        }
    }
}
