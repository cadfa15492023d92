use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use meli_core::{Product, ResultCap, SourceKind};
use meli_scraper::{ErrorKind, SearchOutcome, SearchRequest};
use serde::{Deserialize, Serialize};

use super::{local_failure, ApiError, AppState, ResponseMeta};
use crate::cache::CacheKey;
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
    source: Option<String>,
}

/// Success envelope: `{ ok: true, q, products, source, appliedLimit, total, meta }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<'a> {
    ok: bool,
    q: &'a str,
    products: &'a [Product],
    source: SourceKind,
    applied_limit: u32,
    total: usize,
    meta: ResponseMeta,
}

/// An absent or unparsable limit falls back to the default tier.
fn parse_cap(raw: Option<&str>) -> ResultCap {
    raw.and_then(|s| s.parse::<ResultCap>().ok())
        .unwrap_or_default()
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let source = match params.source.as_deref().map(str::trim) {
        None | Some("") => state.config.default_source,
        Some(raw) => raw.parse::<SourceKind>().map_err(|reason| {
            ApiError::new(req_id.0.clone(), local_failure(ErrorKind::BadInput, reason))
        })?,
    };
    let request = SearchRequest {
        query: params.q.unwrap_or_default(),
        cap: parse_cap(params.limit.as_deref()),
        source,
    };

    let key = CacheKey::new(&request.query, request.cap, request.source);
    let outcome = if let Some(hit) = state.cache.get(&key).await {
        tracing::debug!(request_id = %req_id.0, query = %request.query, "search cache hit");
        hit
    } else {
        let outcome = state.searcher.search(&request).await.map_err(|e| {
            tracing::warn!(
                request_id = %req_id.0,
                query = %request.query,
                code = e.kind().as_str(),
                error = %e,
                "search failed"
            );
            ApiError::from_scraper(req_id.0.clone(), &e)
        })?;
        let outcome = Arc::new(outcome);
        state.cache.insert(key, Arc::clone(&outcome)).await;
        outcome
    };

    Ok(Json(respond(&outcome, req_id.0)).into_response())
}

fn respond(outcome: &SearchOutcome, request_id: String) -> SearchResponse<'_> {
    SearchResponse {
        ok: true,
        q: &outcome.query,
        products: &outcome.products,
        source: outcome.source,
        applied_limit: outcome.cap.as_requested(),
        total: outcome.products.len(),
        meta: ResponseMeta::new(request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_parsing_clamps_and_defaults() {
        assert_eq!(parse_cap(None), ResultCap::Twenty);
        assert_eq!(parse_cap(Some("abc")), ResultCap::Twenty);
        assert_eq!(parse_cap(Some("0")), ResultCap::All);
        assert_eq!(parse_cap(Some("ALL")), ResultCap::All);
        assert_eq!(parse_cap(Some("7")), ResultCap::Ten);
        assert_eq!(parse_cap(Some("50")), ResultCap::Hundred);
        assert_eq!(parse_cap(Some("5000")), ResultCap::Hundred);
    }
}
