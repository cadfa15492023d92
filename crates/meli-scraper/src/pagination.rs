//! Offset pagination planning and page URL construction.
//!
//! Rendered listings paginate through a path suffix:
//!
//! ```text
//! https://listado.mercadolibre.com.ar/mouse-gamer                          (offset 0)
//! https://listado.mercadolibre.com.ar/mouse-gamer_Desde_51_NoIndex_True    (offset 50)
//! ```
//!
//! The official API takes `limit` and `offset` query parameters.

use meli_core::{ResultCap, SourceKind};
use reqwest::Url;

use crate::error::ScraperError;

/// Results per rendered listing page.
pub const SCRAPE_PAGE_SIZE: usize = 50;

/// Largest `limit` the search API accepts per request.
pub const API_PAGE_SIZE: usize = 50;

/// Page size and page budget for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub page_size: usize,
    pub max_pages: usize,
}

impl PagePlan {
    /// Derives the plan from the source and the cap: the page count is the
    /// ceiling of the cap's limit over the page size.
    #[must_use]
    pub fn for_source(source: SourceKind, cap: ResultCap) -> Self {
        let limit = cap.limit();
        let page_size = match source {
            SourceKind::OfficialApi => limit.min(API_PAGE_SIZE),
            SourceKind::HtmlScrape | SourceKind::HtmlScrapeEmbedded => SCRAPE_PAGE_SIZE,
        };
        Self {
            page_size,
            max_pages: limit.div_ceil(page_size),
        }
    }

    /// Zero-based record offset of zero-based `page`.
    #[must_use]
    pub fn offset(&self, page: usize) -> usize {
        page * self.page_size
    }
}

/// Listing path slug: trimmed, lower-cased, whitespace runs joined by `-`.
#[must_use]
pub fn query_slug(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Builds the rendered listing URL for `query` starting at `offset`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `listing_base` is not an
/// absolute base URL.
pub fn listing_url(listing_base: &str, query: &str, offset: usize) -> Result<String, ScraperError> {
    let slug = query_slug(query);
    let segment = if offset == 0 {
        slug
    } else {
        format!("{slug}_Desde_{}_NoIndex_True", offset + 1)
    };

    let mut url = parse_base(listing_base)?;
    url.path_segments_mut()
        .map_err(|()| ScraperError::InvalidUrl {
            url: listing_base.to_owned(),
            reason: "cannot be a base URL".to_owned(),
        })?
        .pop_if_empty()
        .push(&segment);
    Ok(url.into())
}

/// Builds the official search API URL for one page.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `api_base` is not an absolute URL.
pub fn api_search_url(
    api_base: &str,
    site_id: &str,
    query: &str,
    limit: usize,
    offset: usize,
) -> Result<String, ScraperError> {
    let base = api_base.trim_end_matches('/');
    let mut url = parse_base(&format!("{base}/sites/{site_id}/search"))?;
    url.query_pairs_mut()
        .append_pair("q", query.trim())
        .append_pair("limit", &limit.to_string())
        .append_pair("offset", &offset.to_string());
    Ok(url.into())
}

fn parse_base(raw: &str) -> Result<Url, ScraperError> {
    Url::parse(raw).map_err(|e| ScraperError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}
