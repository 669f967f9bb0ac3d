use crate::model::{Origin, Product, ProductId};
use std::collections::HashSet;
use tracing::warn;

/// The two subsets of one session. Ids are unique across both.
#[derive(Debug, Default)]
pub(crate) struct Partitions {
    remote: Vec<Product>,
    local: Vec<Product>,
}

impl Partitions {
    /// Splits persisted records by origin. Later duplicates of an id are dropped.
    pub fn from_records(records: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let mut partitions = Self::default();
        for product in records {
            if !seen.insert(product.id.clone()) {
                warn!(id = %product.id, "Dropping duplicate stored product");
                continue;
            }
            match product.origin {
                Origin::Remote => partitions.remote.push(product),
                Origin::Local => partitions.local.push(product),
            }
        }
        partitions
    }

    /// Remote records first, then local ones.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.remote.iter().chain(self.local.iter())
    }

    pub fn merged(&self) -> Vec<Product> {
        self.iter().cloned().collect()
    }

    pub fn local(&self) -> &[Product] {
        &self.local
    }

    pub fn remote_len(&self) -> usize {
        self.remote.len()
    }

    pub fn len(&self) -> usize {
        self.remote.len() + self.local.len()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.iter().find(|p| &p.id == id)
    }

    pub fn find_mut(&mut self, id: &ProductId) -> Option<&mut Product> {
        self.remote
            .iter_mut()
            .chain(self.local.iter_mut())
            .find(|p| &p.id == id)
    }

    /// Replaces the whole remote subset. Records colliding with a local id are dropped.
    pub fn replace_remote(&mut self, products: Vec<Product>) {
        let local_ids: HashSet<&ProductId> = self.local.iter().map(|p| &p.id).collect();
        let remote: Vec<Product> = products
            .into_iter()
            .filter(|p| !local_ids.contains(&p.id))
            .collect();
        self.remote = remote;
    }

    pub fn push_local(&mut self, product: Product) {
        self.local.push(product);
    }

    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        if let Some(pos) = self.remote.iter().position(|p| &p.id == id) {
            return Some(self.remote.remove(pos));
        }
        let pos = self.local.iter().position(|p| &p.id == id)?;
        Some(self.local.remove(pos))
    }

    /// Local records matching `needle` (already lowercase).
    pub fn local_matches(&self, needle: &str) -> Vec<Product> {
        self.local
            .iter()
            .filter(|p| p.matches(needle))
            .cloned()
            .collect()
    }
}

/// Concatenates two result lists, keeping the first occurrence of each id.
pub(crate) fn merge_unique(first: Vec<Product>, second: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RemoteProduct;
    use crate::model::ProductDraft;
    use chrono::Utc;

    fn remote(id: u64, title: &str) -> Product {
        RemoteProduct::new(id, title).normalize().unwrap()
    }

    fn local(id: &str, title: &str) -> Product {
        Product::from_draft(ProductId::from(id), ProductDraft::new(title), None, Utc::now())
    }

    #[test]
    fn test_from_records_partitions_and_dedupes() {
        let partitions = Partitions::from_records(vec![
            remote(1, "A"),
            local("local_1_a", "B"),
            remote(1, "A again"),
            remote(2, "C"),
        ]);
        assert_eq!(partitions.remote_len(), 2);
        assert_eq!(partitions.local().len(), 1);
        let titles: Vec<_> = partitions.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_replace_remote_keeps_local() {
        let mut partitions = Partitions::from_records(vec![remote(1, "Old"), local("local_1_a", "Mine")]);
        partitions.replace_remote(vec![remote(2, "New"), remote(3, "Newer")]);
        assert_eq!(partitions.len(), 3);
        assert!(!partitions.contains(&ProductId::from(1u64)));
        assert!(partitions.contains(&ProductId::from("local_1_a")));
    }

    #[test]
    fn test_remove_from_either_subset() {
        let mut partitions = Partitions::from_records(vec![remote(1, "R"), local("local_1_a", "L")]);
        assert!(partitions.remove(&ProductId::from("local_1_a")).is_some());
        assert!(partitions.remove(&ProductId::from(1u64)).is_some());
        assert!(partitions.remove(&ProductId::from(1u64)).is_none());
        assert_eq!(partitions.len(), 0);
    }

    #[test]
    fn test_merge_unique_first_wins() {
        let merged = merge_unique(vec![remote(1, "Remote")], vec![remote(1, "Dup"), local("local_1_a", "L")]);
        let titles: Vec<_> = merged.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Remote", "L"]);
    }
}
