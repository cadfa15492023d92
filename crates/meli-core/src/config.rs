use crate::app_config::AppConfig;
use crate::query::SourceKind;
use crate::ConfigError;

/// Desktop browser identity sent with listing page requests. The listing
/// site serves stripped or challenge pages to non-browser agents.
pub const DEFAULT_BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values count as unset so a blank line in `.env` does not
    // masquerade as a credential.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let bind_addr = or_default("MELI_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("MELI_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("MELI_LOG_LEVEL", "info");

    let site_id = or_default("MELI_SITE_ID", "MLA");
    let api_base_url = or_default("MELI_API_BASE_URL", "https://api.mercadolibre.com");
    let listing_base_url = or_default(
        "MELI_LISTING_BASE_URL",
        "https://listado.mercadolibre.com.ar",
    );
    let auth_base_url = or_default("MELI_AUTH_BASE_URL", "https://auth.mercadolibre.com.ar");

    let default_source = or_default("MELI_DEFAULT_SOURCE", "html-scrape+embedded-json")
        .parse::<SourceKind>()
        .map_err(|reason| invalid("MELI_DEFAULT_SOURCE", reason))?;

    let request_timeout_secs = parse_u64("MELI_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("MELI_USER_AGENT", DEFAULT_BROWSER_USER_AGENT);
    let inter_page_delay_ms = parse_u64("MELI_INTER_PAGE_DELAY_MS", "250")?;
    let cache_ttl_secs = parse_u64("MELI_CACHE_TTL_SECS", "60")?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        site_id,
        api_base_url,
        listing_base_url,
        auth_base_url,
        client_id: optional("MELI_CLIENT_ID"),
        client_secret: optional("MELI_CLIENT_SECRET"),
        refresh_token: optional("MELI_REFRESH_TOKEN"),
        redirect_uri: optional("MELI_REDIRECT_URI"),
        default_source,
        request_timeout_secs,
        user_agent,
        inter_page_delay_ms,
        cache_ttl_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
