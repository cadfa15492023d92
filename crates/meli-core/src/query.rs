//! Query-shaping types shared by the pipeline, the server, and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound on results for an "all" query. Bounds the worst-case number
/// of page requests a single query can make.
pub const ALL_RESULTS_CEILING: usize = 200;

/// Requested result count, restricted to the tiers the UI offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResultCap {
    Ten,
    #[default]
    Twenty,
    Hundred,
    /// No explicit cap; bounded by [`ALL_RESULTS_CEILING`].
    All,
}

impl ResultCap {
    /// Clamps an arbitrary requested count onto the nearest tier.
    ///
    /// `0` is the literal sentinel for "all". Anything at or below 10
    /// (negatives included) maps to 10, at or below 20 to 20, and everything
    /// else to 100.
    #[must_use]
    pub fn from_requested(n: i64) -> Self {
        match n {
            0 => Self::All,
            n if n <= 10 => Self::Ten,
            n if n <= 20 => Self::Twenty,
            _ => Self::Hundred,
        }
    }

    /// Effective maximum number of records for this cap.
    #[must_use]
    pub fn limit(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Hundred => 100,
            Self::All => ALL_RESULTS_CEILING,
        }
    }

    /// The cap as reported back to callers (`0` for "all").
    #[must_use]
    pub fn as_requested(self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Hundred => 100,
            Self::All => 0,
        }
    }
}

impl FromStr for ResultCap {
    type Err = String;

    /// Accepts `"all"` (any case) or an integer, which is clamped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<i64>()
            .map(Self::from_requested)
            .map_err(|e| format!("invalid result count \"{s}\": {e}"))
    }
}

impl fmt::Display for ResultCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            other => write!(f, "{}", other.as_requested()),
        }
    }
}

/// Where result pages are acquired from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Authenticated offset-paginated search API.
    #[serde(rename = "official-api")]
    OfficialApi,
    /// Rendered listing pages, card markup only.
    #[serde(rename = "html-scrape")]
    HtmlScrape,
    /// Rendered listing pages, card markup with embedded-state fallback.
    #[serde(rename = "html-scrape+embedded-json")]
    HtmlScrapeEmbedded,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OfficialApi => "official-api",
            Self::HtmlScrape => "html-scrape",
            Self::HtmlScrapeEmbedded => "html-scrape+embedded-json",
        }
    }

    /// Whether the embedded-state extractor runs when card markup yields nothing.
    #[must_use]
    pub fn uses_embedded_state(self) -> bool {
        self == Self::HtmlScrapeEmbedded
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "official-api" | "api" => Ok(Self::OfficialApi),
            "html-scrape" | "scrape" => Ok(Self::HtmlScrape),
            // A literal `+` in a query string decodes to a space.
            "html-scrape+embedded-json" | "html-scrape embedded-json" | "embedded" => {
                Ok(Self::HtmlScrapeEmbedded)
            }
            other => Err(format!(
                "unknown source \"{other}\" (expected official-api, html-scrape, or html-scrape+embedded-json)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_requested_clamps_to_tiers() {
        assert_eq!(ResultCap::from_requested(0), ResultCap::All);
        assert_eq!(ResultCap::from_requested(-5), ResultCap::Ten);
        assert_eq!(ResultCap::from_requested(1), ResultCap::Ten);
        assert_eq!(ResultCap::from_requested(10), ResultCap::Ten);
        assert_eq!(ResultCap::from_requested(11), ResultCap::Twenty);
        assert_eq!(ResultCap::from_requested(20), ResultCap::Twenty);
        assert_eq!(ResultCap::from_requested(21), ResultCap::Hundred);
        assert_eq!(ResultCap::from_requested(100), ResultCap::Hundred);
        assert_eq!(ResultCap::from_requested(5_000), ResultCap::Hundred);
    }

    #[test]
    fn all_is_bounded_by_ceiling() {
        assert_eq!(ResultCap::All.limit(), ALL_RESULTS_CEILING);
        assert_eq!(ResultCap::All.as_requested(), 0);
    }

    #[test]
    fn parses_all_and_numbers() {
        assert_eq!("all".parse::<ResultCap>().unwrap(), ResultCap::All);
        assert_eq!("ALL".parse::<ResultCap>().unwrap(), ResultCap::All);
        assert_eq!("0".parse::<ResultCap>().unwrap(), ResultCap::All);
        assert_eq!(" 15 ".parse::<ResultCap>().unwrap(), ResultCap::Twenty);
        assert!("many".parse::<ResultCap>().is_err());
    }

    #[test]
    fn source_kind_round_trips_through_identifier() {
        for kind in [
            SourceKind::OfficialApi,
            SourceKind::HtmlScrape,
            SourceKind::HtmlScrapeEmbedded,
        ] {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn source_kind_accepts_space_decoded_plus() {
        assert_eq!(
            "html-scrape embedded-json".parse::<SourceKind>().unwrap(),
            SourceKind::HtmlScrapeEmbedded
        );
    }

    #[test]
    fn source_kind_serializes_to_identifier() {
        let json = serde_json::to_string(&SourceKind::HtmlScrapeEmbedded).unwrap();
        assert_eq!(json, "\"html-scrape+embedded-json\"");
    }
}
