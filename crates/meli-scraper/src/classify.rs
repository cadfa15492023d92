//! Anti-bot and emptiness classification of fetched listing pages.

/// Challenge and denial phrases, matched case-insensitively. The first
/// match is reported as the block signature.
const BLOCK_SIGNATURES: &[&str] = &[
    "access denied",
    "acceso denegado",
    "403 forbidden",
    "captcha",
    "not a robot",
    "no soy un robot",
    "verify you are human",
    "verifica que eres humano",
    "unusual traffic",
    "tráfico inusual",
    "trafico inusual",
    "too many requests",
];

/// Markup that only appears on a rendered result listing.
const LISTING_SIGNATURES: &[&str] = &[
    "ui-search-result__wrapper",
    "poly-card",
    "ui-search-layout",
    "__preloaded_state__",
    "\"results\"",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    /// Anti-automation challenge or denial page; never extracted.
    HardBlock { signature: &'static str },
    ListingPresent,
    Indeterminate,
}

/// Classifies a fetched page by its body.
///
/// Block signatures win over listing signatures, and the status code does
/// not influence the result: a challenge served with `200` is still a block.
/// The caller combines [`PageClass::Indeterminate`] with the status.
#[must_use]
pub fn classify(status: u16, body: &str) -> PageClass {
    let lower = body.to_lowercase();

    if let Some(signature) = BLOCK_SIGNATURES.iter().copied().find(|s| lower.contains(s)) {
        tracing::warn!(status, signature, "anti-bot signature in page body");
        return PageClass::HardBlock { signature };
    }
    if LISTING_SIGNATURES.iter().any(|s| lower.contains(s)) {
        return PageClass::ListingPresent;
    }
    PageClass::Indeterminate
}
