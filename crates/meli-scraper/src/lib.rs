pub mod aggregate;
pub mod cards;
pub mod classify;
pub mod client;
pub mod credentials;
pub mod embedded;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod parse;
pub mod rank;
pub mod search;
pub mod span;

pub use client::{FetchedPage, MarketClient};
pub use credentials::{
    exchange_authorization_code, CredentialProvider, RefreshTokenProvider, StaticToken,
    TokenResponse,
};
pub use error::{ErrorKind, ScraperError, SearchFailure};
pub use parse::{parse_price, parse_sold_info, SoldInfo};
pub use search::{SearchOutcome, SearchRequest, SearchSettings, Searcher};
