//! Catalog browsing: how the product listing combines search text, a category and a sort
//! order, plus the client-side filter panel (price range, categories, brands).

use super::wire::normalize_all;
use super::{CatalogApi, CatalogError, CatalogQuery, SortField, SortOrder};
use crate::model::Product;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// What the listing page asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortSpec>,
}

/// Fetches one listing page.
///
/// - search + category: fetch the category, then keep records whose title, description,
///   brand or category contains the search text
/// - search only: remote search
/// - category only: fetch the category (slug is lowercased)
/// - neither: fetch everything with server-side sorting
///
/// Whenever search or category is involved the requested sort is applied locally, since
/// those endpoints ignore sort parameters.
#[instrument(skip(catalog))]
pub async fn browse(
    catalog: &dyn CatalogApi,
    query: &BrowseQuery,
) -> Result<Vec<Product>, CatalogError> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let slug = query
        .category
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let mut products = match (search, slug.as_deref()) {
        (Some(text), Some(slug)) => {
            let needle = text.to_lowercase();
            let page = catalog.products_by_category(slug).await?;
            normalize_all(page.products)
                .into_iter()
                .filter(|p| {
                    [&p.title, &p.description, &p.brand, &p.category]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
                })
                .collect()
        }
        (Some(text), None) => normalize_all(catalog.search(text).await?.products),
        (None, Some(slug)) => normalize_all(catalog.products_by_category(slug).await?.products),
        (None, None) => {
            let remote_query = CatalogQuery {
                sort_by: query.sort.map(|s| s.field),
                order: query.sort.map(|s| s.order),
                ..CatalogQuery::default()
            };
            return Ok(normalize_all(
                catalog.fetch_products(&remote_query).await?.products,
            ));
        }
    };

    if let Some(sort) = query.sort {
        sort_products(&mut products, sort);
    }
    debug!(size = products.len(), "Browse page ready");
    Ok(products)
}

/// Stable sort by one field. Titles compare case-insensitively.
pub fn sort_products(products: &mut [Product], sort: SortSpec) {
    products.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Price => cmp_f64(a.price, b.price),
            SortField::Rating => cmp_f64(a.rating, b.rating),
            SortField::DiscountPercentage => cmp_f64(a.discount_percentage, b.discount_percentage),
            SortField::Stock => a.stock.cmp(&b.stock),
        };
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Client-side filter panel. Empty category/brand sets mean "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.categories.is_empty()
            && self.brands.is_empty()
    }

    pub fn accepts(&self, product: &Product) -> bool {
        self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && contains_ignore_case(&self.categories, &product.category)
            && contains_ignore_case(&self.brands, &product.brand)
    }

    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products.iter().filter(|p| self.accepts(p)).cloned().collect()
    }
}

fn contains_ignore_case(set: &[String], value: &str) -> bool {
    set.is_empty() || set.iter().any(|s| s.eq_ignore_ascii_case(value))
}

/// Distinct categories and brands present in a listing, for the filter panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub max_price: f64,
}

impl Facets {
    pub fn collect(products: &[Product]) -> Self {
        let categories: BTreeSet<&str> = products.iter().map(|p| p.category.as_str()).collect();
        let brands: BTreeSet<&str> = products.iter().map(|p| p.brand.as_str()).collect();
        Self {
            categories: categories.into_iter().map(String::from).collect(),
            brands: brands.into_iter().map(String::from).collect(),
            max_price: products.iter().map(|p| p.price).fold(0.0, f64::max),
        }
    }
}
