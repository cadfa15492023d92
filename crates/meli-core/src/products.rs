use serde::{Deserialize, Serialize};

/// A marketplace listing extracted from a search result page or the official
/// search API, normalized to one shape regardless of where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Dedup identity: the absolute listing URL when one was found, otherwise
    /// an element identifier or a synthesized slug.
    pub id: String,
    /// 1-based position in the final ranked output. `0` until ranking runs.
    pub rank: u32,
    pub title: String,
    /// Amount in whole currency units. Unparsable prices normalize to `0`.
    pub price: f64,
    /// Thumbnail URL; empty when the listing had no image.
    pub img: String,
    /// Heuristic "Full" fulfillment flag.
    pub is_full: bool,
    /// Absolute listing URL, or the listing base URL when none was found.
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_qty: Option<u64>,
    /// Human-readable sold phrase, e.g. `"Más de 1.000 vendidos"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_text: Option<String>,
}

impl Product {
    /// Popularity signal used for ranking; absent counts as zero.
    #[must_use]
    pub fn popularity(&self) -> u64 {
        self.sold_qty.unwrap_or(0)
    }
}
