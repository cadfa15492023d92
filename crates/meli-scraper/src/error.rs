use serde::Serialize;
use thiserror::Error;

/// Upper bound on the response-body excerpt carried by failures.
pub const DIAGNOSTIC_EXCERPT_CHARS: usize = 900;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("bad input: {reason}")]
    BadInput { reason: String },

    #[error("blocked by anti-bot challenge at {url} (status {status}, matched \"{signature}\")")]
    Blocked {
        status: u16,
        url: String,
        signature: &'static str,
        excerpt: String,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Upstream {
        status: u16,
        url: String,
        excerpt: String,
    },

    #[error("no listings extracted for \"{query}\" after {pages} page(s)")]
    NoData {
        query: String,
        pages: usize,
        url: Option<String>,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        url: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Caller-facing failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    BadInput,
    UpstreamBlocked,
    UpstreamError,
    NoData,
    Transport,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::BadInput => "bad_input",
            Self::UpstreamBlocked => "upstream_blocked",
            Self::UpstreamError => "upstream_error",
            Self::NoData => "no_data",
            Self::Transport => "transport_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure payload returned at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFailure {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ScraperError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::InvalidUrl { .. } => ErrorKind::Configuration,
            Self::BadInput { .. } => ErrorKind::BadInput,
            Self::Blocked { .. } => ErrorKind::UpstreamBlocked,
            Self::Upstream { .. } | Self::Deserialize { .. } => ErrorKind::UpstreamError,
            Self::NoData { .. } => ErrorKind::NoData,
            Self::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Builds the boundary failure payload: message, classification code,
    /// and whatever upstream status / URL / body excerpt is known.
    #[must_use]
    pub fn failure(&self) -> SearchFailure {
        let (status, url, detail) = match self {
            Self::Blocked {
                status,
                url,
                excerpt,
                ..
            }
            | Self::Upstream {
                status,
                url,
                excerpt,
            } => (
                Some(*status),
                Some(url.clone()),
                Some(excerpt.clone()).filter(|s| !s.is_empty()),
            ),
            Self::Deserialize {
                url,
                status,
                source,
                ..
            } => (Some(*status), Some(url.clone()), Some(source.to_string())),
            Self::NoData { url, .. } => (None, url.clone(), None),
            Self::Transport { url, source } => {
                (None, Some(url.clone()), Some(source.to_string()))
            }
            Self::InvalidUrl { url, .. } => (None, Some(url.clone()), None),
            Self::Configuration { .. } | Self::BadInput { .. } => (None, None, None),
        };
        SearchFailure {
            error: self.to_string(),
            code: self.kind().as_str(),
            status,
            url,
            detail,
        }
    }
}

impl From<meli_core::ConfigError> for ScraperError {
    fn from(err: meli_core::ConfigError) -> Self {
        Self::Configuration {
            reason: err.to_string(),
        }
    }
}

/// Returns at most [`DIAGNOSTIC_EXCERPT_CHARS`] characters of `body`,
/// trimmed, cut on a char boundary.
#[must_use]
pub fn excerpt(body: &str) -> String {
    body.trim().chars().take(DIAGNOSTIC_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_is_bounded_and_char_safe() {
        let body = "ñ".repeat(2_000);
        let cut = excerpt(&body);
        assert_eq!(cut.chars().count(), DIAGNOSTIC_EXCERPT_CHARS);
    }

    #[test]
    fn excerpt_keeps_short_bodies_whole() {
        assert_eq!(excerpt("  Access Denied  "), "Access Denied");
    }

    #[test]
    fn blocked_failure_carries_status_url_and_detail() {
        let err = ScraperError::Blocked {
            status: 200,
            url: "https://listado.example.com/mouse".to_owned(),
            signature: "captcha",
            excerpt: "please solve the captcha".to_owned(),
        };
        let failure = err.failure();
        assert_eq!(failure.code, "upstream_blocked");
        assert_eq!(failure.status, Some(200));
        assert_eq!(
            failure.url.as_deref(),
            Some("https://listado.example.com/mouse")
        );
        assert_eq!(failure.detail.as_deref(), Some("please solve the captcha"));
    }

    #[test]
    fn no_data_is_distinct_from_upstream_error() {
        let no_data = ScraperError::NoData {
            query: "mouse".to_owned(),
            pages: 1,
            url: None,
        };
        let upstream = ScraperError::Upstream {
            status: 500,
            url: "https://x".to_owned(),
            excerpt: String::new(),
        };
        assert_eq!(no_data.kind(), ErrorKind::NoData);
        assert_eq!(upstream.kind(), ErrorKind::UpstreamError);
        assert!(upstream.failure().detail.is_none(), "empty excerpt omitted");
    }

    #[test]
    fn config_error_maps_to_configuration_kind() {
        let err: ScraperError =
            meli_core::ConfigError::MissingEnvVar("MELI_REFRESH_TOKEN".to_owned()).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("MELI_REFRESH_TOKEN"));
    }
}
