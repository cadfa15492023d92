//! `search` command handler.

use std::fmt::Write as _;

use meli_core::{AppConfig, Product, ResultCap, SourceKind};
use meli_scraper::{SearchOutcome, SearchRequest, Searcher};
use serde::Serialize;

const TITLE_WIDTH: usize = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutcome<'a> {
    ok: bool,
    q: &'a str,
    source: SourceKind,
    applied_limit: u32,
    total: usize,
    pages_fetched: usize,
    products: &'a [Product],
}

/// Runs one search and prints the result to stdout.
///
/// # Errors
///
/// Returns an error carrying the failure classification code when the
/// search fails; the caller exits non-zero.
pub(crate) async fn run_search(
    config: &AppConfig,
    query: String,
    cap: ResultCap,
    source: SourceKind,
    json: bool,
) -> anyhow::Result<()> {
    let searcher = Searcher::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let request = SearchRequest { query, cap, source };
    tracing::debug!(query = %request.query, source = %source, cap = %cap, "running search");

    match searcher.search(&request).await {
        Ok(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&json_outcome(&outcome))?);
            } else {
                print!("{}", render_table(&outcome));
            }
            Ok(())
        }
        Err(e) => {
            let failure = e.failure();
            if json {
                println!("{}", serde_json::to_string_pretty(&failure)?);
            }
            anyhow::bail!("{}: {}", failure.code, failure.error)
        }
    }
}

fn json_outcome(outcome: &SearchOutcome) -> JsonOutcome<'_> {
    JsonOutcome {
        ok: true,
        q: &outcome.query,
        source: outcome.source,
        applied_limit: outcome.cap.as_requested(),
        total: outcome.products.len(),
        pages_fetched: outcome.pages_fetched,
        products: &outcome.products,
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub(crate) fn render_table(outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} results for \"{}\" via {} ({} page(s))",
        outcome.products.len(),
        outcome.query,
        outcome.source.as_str(),
        outcome.pages_fetched
    );
    let _ = writeln!(
        out,
        "{:>4}  {:>9}  {:>12}  {:<4}  TITLE",
        "RANK", "SOLD", "PRICE", "FULL"
    );
    for p in &outcome.products {
        let sold = p
            .sold_qty
            .map_or_else(|| "-".to_owned(), |n| n.to_string());
        let _ = writeln!(
            out,
            "{:>4}  {:>9}  {:>12.2}  {:<4}  {}",
            p.rank,
            sold,
            p.price,
            if p.is_full { "yes" } else { "" },
            truncate(&p.title, TITLE_WIDTH)
        );
    }
    out
}
