//! # Remote Catalog
//!
//! The [`CatalogApi`] trait is the seam between the registry and the product API. The
//! production implementation is [`ApiClient`](crate::http::ApiClient); tests use
//! [`MockCatalog`](crate::mock::MockCatalog).
//!
//! ## Structure
//!
//! - [`wire`] - raw records, list envelopes, categories and write payloads
//! - [`error`] - [`CatalogError`]
//! - [`browse`] - the catalog page's search/category/sort combination and client-side filters

pub mod browse;
pub mod error;
pub mod wire;

pub use browse::*;
pub use error::*;
pub use wire::*;

use crate::model::ProductId;
use async_trait::async_trait;
use std::fmt::Display;
use std::str::FromStr;

/// Operations offered by the catalog API.
///
/// Writes (`add`, `update`, `delete`) are accepted by the demo API but never persisted
/// there; callers treat their outcome as informational.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /products` with pagination and sort parameters.
    async fn fetch_products(&self, query: &CatalogQuery) -> Result<ProductPage, CatalogError>;

    /// `GET /products/{id}`.
    async fn product(&self, id: &ProductId) -> Result<RemoteProduct, CatalogError>;

    /// `GET /products/categories`.
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// `GET /products/category/{slug}`.
    async fn products_by_category(&self, slug: &str) -> Result<ProductPage, CatalogError>;

    /// `GET /products/search?q=`.
    async fn search(&self, query: &str) -> Result<ProductPage, CatalogError>;

    /// `POST /products/add`.
    async fn add_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, CatalogError>;

    /// `PUT /products/{id}`.
    async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, CatalogError>;

    /// `DELETE /products/{id}`.
    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError>;
}

/// Pagination and sort parameters of `GET /products`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl CatalogQuery {
    pub fn page(limit: u32, skip: u32) -> Self {
        Self {
            limit: Some(limit),
            skip: Some(skip),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.order = Some(order);
        self
    }

    /// Query-string pairs, omitting unset parameters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(field) = self.sort_by {
            pairs.push(("sortBy", field.as_param().to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_param().to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Price,
    Rating,
    DiscountPercentage,
    Stock,
}

impl SortField {
    pub fn as_param(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::DiscountPercentage => "discountPercentage",
            SortField::Stock => "stock",
        }
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "price" => Ok(SortField::Price),
            "rating" => Ok(SortField::Rating),
            "discount" | "discountpercentage" => Ok(SortField::DiscountPercentage),
            "stock" => Ok(SortField::Stock),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}
