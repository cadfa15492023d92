//! Per-query merge of page results, keyed by product identity.

use std::collections::HashSet;

use meli_core::Product;

/// Distinct products seen so far for one query, in first-seen order.
///
/// The first record for an `id` wins; later duplicates are dropped without
/// overwriting, which tolerates overlapping pagination windows.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<String>,
    products: Vec<Product>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one page and returns how many records were new.
    pub fn insert_page(&mut self, page: Vec<Product>) -> usize {
        let before = self.products.len();
        for product in page {
            if self.seen.insert(product.id.clone()) {
                self.products.push(product);
            }
        }
        self.products.len() - before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct products in first-seen order.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }
}
