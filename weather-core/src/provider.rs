use crate::{
    error::ProviderError,
    model::{SearchCandidate, WeatherQuery, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod http;

pub use http::HttpWeatherProvider;

/// Queries shorter than this never reach the search endpoint.
pub const MIN_SEARCH_CHARS: usize = 2;

/// Default number of suggestions requested per search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// The weather backend as seen by the client core.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError>;

    async fn search_cities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ProviderError>;
}

/// Whether `query` is long enough to be sent to the search endpoint.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_SEARCH_CHARS
}
