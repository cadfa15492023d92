//! Product recovery from script-embedded application state.
//!
//! Client-side-rendered listings ship their data as a JavaScript object
//! assigned to a window global for hydration. This module finds those
//! objects, parses them, and searches them for the results array. The same
//! JSON item adapter also reads official API search results.

use std::collections::HashSet;

use meli_core::Product;
use serde_json::Value;

use crate::normalize::{
    mentions_fulfillment, normalize_item, resolve_link, RawItem, FULFILLMENT_SENTINEL,
};
use crate::parse::{parse_price, sold_text_for, SoldInfo};
use crate::span::{balanced_object, enclosing_object};

/// Window globals the listing assigns its hydration state to.
const STATE_MARKERS: [&str; 2] = ["window.__PRELOADED_STATE__", "window.__INITIAL_STATE__"];

/// Key searched for when no state marker is present.
const RESULTS_NEEDLE: &str = "\"results\"";

/// Properties whose array value holds listing items.
const RESULT_KEYS: [&str; 2] = ["results", "items"];

/// Extracts products from embedded state in `html`.
///
/// Returns an empty vector when no candidate object parses or none holds a
/// non-empty results array with usable items. Never fails.
#[must_use]
pub fn extract_embedded(html: &str, base_url: &str) -> Vec<Product> {
    for (candidate, span) in candidate_spans(html).into_iter().enumerate() {
        let state: Value = match serde_json::from_str(span) {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(candidate, error = %e, "embedded state candidate is not JSON");
                continue;
            }
        };
        let Some(items) = find_results_array(&state) else {
            continue;
        };
        let products = products_from_items(items, base_url);
        if !products.is_empty() {
            return products;
        }
    }
    Vec::new()
}

/// Normalizes a JSON results array through the JSON item adapter, skipping
/// non-object elements and items without both title and link.
#[must_use]
pub fn products_from_items(items: &[Value], base_url: &str) -> Vec<Product> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_object())
        .filter_map(|(position, item)| normalize_item(&JsonItem(item), position, base_url))
        .collect()
}

/// Text spans that may hold embedded state, in priority order.
///
/// Each state marker contributes the object opened by the first `{` after
/// the first `=` following it. Only when neither marker occurs does the
/// object enclosing the first `"results"` key become a candidate.
fn candidate_spans(html: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut marker_found = false;

    for marker in STATE_MARKERS {
        let Some(at) = html.find(marker) else {
            continue;
        };
        marker_found = true;
        let after_marker = at + marker.len();
        let Some(eq) = html[after_marker..].find('=').map(|i| after_marker + i) else {
            continue;
        };
        let Some(open) = html[eq..].find('{').map(|i| eq + i) else {
            continue;
        };
        if let Some(span) = balanced_object(html, open) {
            spans.push(span);
        }
    }

    if !marker_found {
        if let Some(pos) = html.find(RESULTS_NEEDLE) {
            if let Some(span) = enclosing_object(html, pos) {
                spans.push(span);
            }
        }
    }

    spans
}

/// Depth-first search for the first non-empty `results` or `items` array.
///
/// Object keys are visited in source order.
#[must_use]
pub fn find_results_array(root: &Value) -> Option<&Vec<Value>> {
    let mut seen = HashSet::new();
    search(root, &mut seen)
}

fn search<'v>(value: &'v Value, seen: &mut HashSet<*const Value>) -> Option<&'v Vec<Value>> {
    if !seen.insert(std::ptr::from_ref(value)) {
        return None;
    }
    match value {
        Value::Object(map) => {
            let direct = RESULT_KEYS
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_array))
                .find(|arr| !arr.is_empty());
            if direct.is_some() {
                return direct;
            }
            map.values().find_map(|child| search(child, seen))
        }
        Value::Array(arr) => arr.iter().find_map(|child| search(child, seen)),
        _ => None,
    }
}

/// One untyped JSON listing item. Aliases are JSON pointers, tried in order.
struct JsonItem<'a>(&'a Value);

impl JsonItem<'_> {
    fn first_text(&self, pointers: &[&str]) -> Option<String> {
        pointers
            .iter()
            .filter_map(|p| self.0.pointer(p).and_then(scalar_text))
            .map(|s| s.trim().to_owned())
            .find(|s| !s.is_empty())
    }

    fn first_value(&self, pointers: &[&str]) -> Option<&Value> {
        pointers
            .iter()
            .filter_map(|p| self.0.pointer(p))
            .find(|v| !v.is_null())
    }
}

impl RawItem for JsonItem<'_> {
    fn title(&self) -> Option<String> {
        self.first_text(&["/title", "/name"])
    }

    fn link(&self, base_url: &str) -> Option<String> {
        self.first_text(&["/permalink", "/url", "/link"])
            .and_then(|href| resolve_link(&href, base_url))
    }

    fn image(&self) -> Option<String> {
        self.first_text(&["/thumbnail", "/image", "/picture"])
    }

    fn price(&self) -> f64 {
        match self.first_value(&["/price", "/price_amount"]) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => parse_price(s),
            _ => 0.0,
        }
    }

    fn is_full(&self) -> bool {
        let logistic_type = self
            .0
            .pointer("/shipping/logistic_type")
            .and_then(Value::as_str);
        if logistic_type == Some(FULFILLMENT_SENTINEL) {
            return true;
        }
        if let Some(shipping) = self.0.get("shipping") {
            if mentions_fulfillment(&shipping.to_string()) {
                return true;
            }
        }
        mentions_fulfillment(&self.0.to_string())
    }

    fn seller_name(&self) -> Option<String> {
        self.first_text(&[
            "/seller/nickname",
            "/seller/name",
            "/seller_name",
            "/store/name",
        ])
    }

    fn sold_info(&self) -> SoldInfo {
        let qty = self
            .first_value(&["/sold_quantity", "/soldQuantity", "/sold", "/sales"])
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            });
        SoldInfo {
            sold_qty: qty,
            sold_text: qty.map(sold_text_for),
        }
    }

    /// JSON items are only accepted with a link.
    fn fallback_id(&self, _title: &str, _position: usize) -> Option<String> {
        None
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "embedded_test.rs"]
mod tests;
