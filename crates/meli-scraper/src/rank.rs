//! Final ordering and truncation of an aggregated result set.

use meli_core::{Product, ResultCap};

/// Sorts by popularity (sold count, absent as zero) descending, truncates to
/// the cap, and assigns dense 1-based ranks.
///
/// The sort is stable, so ties keep their first-seen order.
#[must_use]
pub fn rank_products(mut products: Vec<Product>, cap: ResultCap) -> Vec<Product> {
    products.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
    products.truncate(cap.limit());
    for (rank, product) in (1_u32..).zip(products.iter_mut()) {
        product.rank = rank;
    }
    products
}
