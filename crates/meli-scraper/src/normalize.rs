//! Normalization from raw, shape-varying listing items to [`meli_core::Product`].
//!
//! Each extraction strategy supplies its own [`RawItem`] adapter (card markup
//! in [`crate::cards`], untyped JSON in [`crate::embedded`]). Field lookups
//! inside an adapter are ordered candidate chains where the first non-empty
//! value wins; the order encodes which template generation wins when several
//! are present, so keep it stable.

use std::sync::LazyLock;

use meli_core::Product;
use regex::Regex;

use crate::parse::SoldInfo;

/// Logistics type the marketplace assigns to "Full" fulfillment listings.
pub const FULFILLMENT_SENTINEL: &str = "fulfillment";

/// Maximum length of a synthesized identity slug.
const SLUG_MAX_LEN: usize = 60;

static FULL_SHIPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfull\b|env[ií]o\s+full").expect("valid full-shipping regex")
});

static SOLD_BY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*vendido\s+por\s*").expect("valid seller regex"));

/// A single candidate source for one field of a raw item.
pub type Candidate<R> = fn(&R) -> Option<String>;

/// Read access to one raw listing, independent of its source shape.
pub trait RawItem {
    fn title(&self) -> Option<String>;

    /// Absolute listing URL, resolved against `base_url` when the source
    /// gave a relative one.
    fn link(&self, base_url: &str) -> Option<String>;

    fn image(&self) -> Option<String>;

    /// Raw amount; the normalizer clamps non-finite and negative values to 0.
    fn price(&self) -> f64;

    fn is_full(&self) -> bool;

    fn seller_name(&self) -> Option<String>;

    fn sold_info(&self) -> SoldInfo;

    /// Identity for an item without a link. Returning `None` rejects the item.
    fn fallback_id(&self, title: &str, position: usize) -> Option<String>;
}

/// Runs `chain` in order and returns the first candidate whose trimmed value
/// is non-empty.
pub fn first_non_empty<R: ?Sized>(raw: &R, chain: &[Candidate<R>]) -> Option<String> {
    chain
        .iter()
        .filter_map(|candidate| candidate(raw))
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

/// Normalizes one raw item found at `position` (0-based, document order).
///
/// Returns `None` when the item has no usable title, or has neither a link
/// nor an adapter-provided fallback identity.
pub fn normalize_item<R: RawItem + ?Sized>(
    raw: &R,
    position: usize,
    base_url: &str,
) -> Option<Product> {
    let title = raw
        .title()
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty())?;

    let link = raw.link(base_url).filter(|l| !l.is_empty());
    let id = match &link {
        Some(link) => link.clone(),
        None => raw.fallback_id(&title, position)?,
    };

    let price = raw.price();
    let price = if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    };

    let SoldInfo {
        sold_qty,
        sold_text,
    } = raw.sold_info();

    Some(Product {
        id,
        rank: 0,
        title,
        price,
        img: raw.image().unwrap_or_default(),
        is_full: raw.is_full(),
        link: link.unwrap_or_else(|| base_url.to_owned()),
        seller_name: raw.seller_name().and_then(|s| clean_seller(&s)),
        sold_qty,
        sold_text,
    })
}

/// Resolves a listing `href` to an absolute URL.
///
/// Absolute `http(s)` URLs pass through, protocol-relative ones get `https:`,
/// root- or path-relative ones are joined onto `base_url`. Fragments,
/// `javascript:` links and empty values yield `None`.
#[must_use]
pub fn resolve_link(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_owned());
    }
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    if lower.contains(':') && !lower.starts_with('/') {
        // mailto:, javascript:, data: and friends.
        return None;
    }
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(href).ok().map(String::from)
}

/// Synthesizes a bounded alphanumeric-and-hyphen identity from free text.
#[must_use]
pub fn safe_slug(seed: &str) -> String {
    let mut slug = String::with_capacity(seed.len().min(SLUG_MAX_LEN));
    for ch in seed.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }
    slug
}

/// Whether visible text advertises Full shipping (`"envío full"`, accent optional).
#[must_use]
pub fn mentions_full_shipping(text: &str) -> bool {
    FULL_SHIPPING.is_match(text)
}

/// Whether `text` contains the fulfillment keyword, case-insensitively.
#[must_use]
pub fn mentions_fulfillment(text: &str) -> bool {
    text.to_ascii_lowercase().contains(FULFILLMENT_SENTINEL)
}

/// Strips a leading `"Vendido por"` label; an empty remainder means no seller.
fn clean_seller(raw: &str) -> Option<String> {
    let cleaned = SOLD_BY_PREFIX.replace(raw, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
