//! Locale-aware numeric extraction from free-form listing text.
//!
//! Listing pages render amounts with `es-AR` grouping (`$ 12.499`) and
//! popularity as phrases like `"+1.000 vendidos"` or `"Más de 50 vendidos"`.
//! Nothing here fails: unparsable input yields `0` or an empty [`SoldInfo`].

use std::sync::LazyLock;

use regex::Regex;

static PRICE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9.,]*").expect("valid price regex"));

static MORE_THAN_SOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)m[aá]s\s+de\s+([0-9][0-9.]*)\s+vendid[oa]s?").expect("valid sold regex")
});

static PLAIN_SOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9][0-9.]*)\s+vendid[oa]s?").expect("valid sold regex"));

/// Parsed "sold" signal. Both fields are absent when no phrase matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoldInfo {
    pub sold_qty: Option<u64>,
    pub sold_text: Option<String>,
}

/// Extracts an amount from price text such as `"$ 12.499"` or `"1,299"`.
///
/// Takes the first run of digits and grouping separators and drops every
/// `.` and `,`. This is intentionally lossy: listing prices are whole
/// currency units, so a separator is always treated as grouping. Returns `0`
/// when there is no digit run.
#[must_use]
pub fn parse_price(text: &str) -> f64 {
    let Some(run) = PRICE_RUN.find(text) else {
        return 0.0;
    };
    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Finds a "sold" phrase in `text`.
///
/// `"más de N vendidos"` takes priority over a plain `"N vendidos"`. The
/// number drops its `.` grouping before parsing. A matched phrase whose number
/// does not fit is kept verbatim in `sold_text` with `sold_qty` absent.
#[must_use]
pub fn parse_sold_info(text: &str) -> SoldInfo {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(caps) = MORE_THAN_SOLD.captures(&collapsed) {
        return match parse_grouped(&caps[1]) {
            Some(qty) => SoldInfo {
                sold_qty: Some(qty),
                sold_text: Some(format!("Más de {} vendidos", format_thousands(qty))),
            },
            None => SoldInfo {
                sold_qty: None,
                sold_text: Some(caps[0].to_string()),
            },
        };
    }

    if let Some(caps) = PLAIN_SOLD.captures(&collapsed) {
        return match parse_grouped(&caps[1]) {
            Some(qty) => SoldInfo {
                sold_qty: Some(qty),
                sold_text: Some(sold_text_for(qty)),
            },
            None => SoldInfo {
                sold_qty: None,
                sold_text: Some(caps[0].to_string()),
            },
        };
    }

    SoldInfo::default()
}

/// Human-readable form of a plain sold count, e.g. `"1.500 vendidos"`.
#[must_use]
pub fn sold_text_for(qty: u64) -> String {
    format!("{} vendidos", format_thousands(qty))
}

/// Formats `n` with `.` thousands grouping (`es-AR`).
#[must_use]
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

fn parse_grouped(raw: &str) -> Option<u64> {
    raw.replace('.', "").parse::<u64>().ok()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
