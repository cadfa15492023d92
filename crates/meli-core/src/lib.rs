pub mod app_config;
pub mod config;
pub mod error;
pub mod products;
pub mod query;

pub use app_config::{AppConfig, OAuthCredentials};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_BROWSER_USER_AGENT};
pub use error::ConfigError;
pub use products::Product;
pub use query::{ResultCap, SourceKind, ALL_RESULTS_CEILING};
