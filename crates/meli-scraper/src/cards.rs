//! Product extraction from server-rendered result cards.
//!
//! The listing renders two template generations side by side depending on
//! rollout state: the legacy `ui-search-result__wrapper` layout and the
//! `poly-card` layout. Both are matched; every field is read through an
//! ordered candidate chain covering both generations.

use std::sync::LazyLock;

use meli_core::Product;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::{
    first_non_empty, mentions_full_shipping, mentions_fulfillment, normalize_item, resolve_link,
    safe_slug, Candidate, RawItem,
};
use crate::parse::{parse_price, parse_sold_info, SoldInfo};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid card selector")
}

static CARD: LazyLock<Selector> =
    LazyLock::new(|| selector(".ui-search-result__wrapper, .poly-card"));
static TITLE_HEADING: LazyLock<Selector> =
    LazyLock::new(|| selector("h2, .poly-component__title"));
static TITLED_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[title]"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static PRICE_FRACTION: LazyLock<Selector> =
    LazyLock::new(|| selector(".andes-money-amount__fraction"));
static PRICE_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("[aria-label*='$']"));
static OFFICIAL_STORE: LazyLock<Selector> =
    LazyLock::new(|| selector(".ui-search-official-store-label"));
static GROUPED_OFFICIAL_STORE: LazyLock<Selector> = LazyLock::new(|| {
    selector(".ui-search-item__group__element .ui-search-official-store-label")
});
static POLY_SELLER: LazyLock<Selector> = LazyLock::new(|| selector(".poly-component__seller"));
static ARIA_LABELLED: LazyLock<Selector> = LazyLock::new(|| selector("[aria-label]"));
static HIGHLIGHT_GROUP: LazyLock<Selector> =
    LazyLock::new(|| selector(".ui-search-item__group__element--highlight"));
static GROUP: LazyLock<Selector> = LazyLock::new(|| selector(".ui-search-item__group__element"));
static POLY_REVIEWS: LazyLock<Selector> = LazyLock::new(|| selector(".poly-reviews__total"));
static DATA_ID: LazyLock<Selector> = LazyLock::new(|| selector("[data-id]"));

/// Extracts products from every result card in `html`, in document order.
///
/// Cards without a usable title are dropped silently. Relative links are
/// resolved against `base_url`.
#[must_use]
pub fn extract_cards(html: &str, base_url: &str) -> Vec<Product> {
    let document = Html::parse_document(html);
    let mut seen = 0_usize;
    let products: Vec<Product> = document
        .select(&CARD)
        .enumerate()
        .filter_map(|(index, el)| {
            seen += 1;
            normalize_item(&CardItem { el }, index, base_url)
        })
        .collect();

    if products.len() < seen {
        tracing::debug!(
            cards = seen,
            extracted = products.len(),
            "dropped result cards without a usable title"
        );
    }
    products
}

/// One result card subtree.
struct CardItem<'a> {
    el: ElementRef<'a>,
}

impl CardItem<'_> {
    fn first_text(&self, sel: &Selector) -> Option<String> {
        self.el.select(sel).next().map(text_of)
    }

    /// Text of every match, joined; mirrors how grouped labels read on screen.
    fn all_text(&self, sel: &Selector) -> Option<String> {
        let joined = self.el.select(sel).map(text_of).collect::<Vec<_>>().join(" ");
        (!joined.trim().is_empty()).then_some(joined)
    }

    fn first_attr(&self, sel: &Selector, attr: &str) -> Option<String> {
        self.el
            .select(sel)
            .next()
            .and_then(|e| e.value().attr(attr))
            .map(str::to_owned)
    }

    fn heading_title(&self) -> Option<String> {
        self.first_text(&TITLE_HEADING)
    }

    fn anchor_title(&self) -> Option<String> {
        self.first_attr(&TITLED_ANCHOR, "title")
    }

    fn lazy_image(&self) -> Option<String> {
        self.first_attr(&IMAGE, "data-src")
    }

    fn eager_image(&self) -> Option<String> {
        self.first_attr(&IMAGE, "src")
    }

    fn price_fraction(&self) -> Option<String> {
        self.first_text(&PRICE_FRACTION)
    }

    fn price_label(&self) -> Option<String> {
        self.first_attr(&PRICE_LABEL, "aria-label")
    }

    fn official_store(&self) -> Option<String> {
        self.first_text(&OFFICIAL_STORE)
    }

    fn grouped_official_store(&self) -> Option<String> {
        self.first_text(&GROUPED_OFFICIAL_STORE)
    }

    fn poly_seller(&self) -> Option<String> {
        self.first_text(&POLY_SELLER)
    }

    /// First ARIA label mentioning "vendido por", in any letter case.
    fn sold_by_label(&self) -> Option<String> {
        self.el
            .select(&ARIA_LABELLED)
            .filter_map(|e| e.value().attr("aria-label"))
            .find(|label| label.to_lowercase().contains("vendido por"))
            .map(str::to_owned)
    }

    fn highlighted_group(&self) -> Option<String> {
        self.all_text(&HIGHLIGHT_GROUP)
    }

    fn group(&self) -> Option<String> {
        self.all_text(&GROUP)
    }

    fn poly_reviews(&self) -> Option<String> {
        self.all_text(&POLY_REVIEWS)
    }

    fn whole_card(&self) -> Option<String> {
        Some(text_of(self.el))
    }
}

impl RawItem for CardItem<'_> {
    fn title(&self) -> Option<String> {
        let chain: [Candidate<Self>; 2] = [Self::heading_title, Self::anchor_title];
        first_non_empty(self, &chain)
    }

    fn link(&self, base_url: &str) -> Option<String> {
        self.el
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_link(href, base_url))
    }

    fn image(&self) -> Option<String> {
        let chain: [Candidate<Self>; 2] = [Self::lazy_image, Self::eager_image];
        first_non_empty(self, &chain)
    }

    fn price(&self) -> f64 {
        let chain: [Candidate<Self>; 2] = [Self::price_fraction, Self::price_label];
        first_non_empty(self, &chain).map_or(0.0, |text| parse_price(&text))
    }

    fn is_full(&self) -> bool {
        mentions_fulfillment(&self.el.html()) || mentions_full_shipping(&text_of(self.el))
    }

    fn seller_name(&self) -> Option<String> {
        let chain: [Candidate<Self>; 4] = [
            Self::official_store,
            Self::grouped_official_store,
            Self::poly_seller,
            Self::sold_by_label,
        ];
        first_non_empty(self, &chain)
    }

    fn sold_info(&self) -> SoldInfo {
        let chain: [Candidate<Self>; 4] = [
            Self::highlighted_group,
            Self::group,
            Self::poly_reviews,
            Self::whole_card,
        ];
        first_non_empty(self, &chain)
            .map(|text| parse_sold_info(&text))
            .unwrap_or_default()
    }

    fn fallback_id(&self, title: &str, position: usize) -> Option<String> {
        let element_id = self
            .el
            .value()
            .id()
            .map(str::to_owned)
            .filter(|id| !id.trim().is_empty());
        let data_id = || {
            self.first_attr(&DATA_ID, "data-id")
                .filter(|id| !id.trim().is_empty())
        };
        Some(
            element_id
                .or_else(data_id)
                .unwrap_or_else(|| safe_slug(&format!("{title}-{position}"))),
        )
    }
}

/// Visible text of a subtree. Text nodes are joined with a space so adjacent
/// inline elements do not run words together.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "cards_test.rs"]
mod tests;
