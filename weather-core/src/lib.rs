//! Core library for the `weather` client.
//!
//! This crate defines:
//! - The weather request coordinator (the single source of loading/error/data state)
//! - Debounced city autocomplete with stale-response rejection
//! - One-shot geolocation over a callback-style platform primitive
//! - The persisted favorite city and cache-expiry formatting
//! - Configuration and the HTTP client for the weather backend
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod expiry;
pub mod favorites;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod search;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{Startup, WeatherApp};
pub use config::Config;
pub use coordinator::{RequestState, WeatherRequestCoordinator, WeatherState};
pub use error::{
    FavoriteStoreError, GeolocationError, LocateError, ProviderError, WeatherLookupError,
};
pub use expiry::format_time_until_expiry;
pub use favorites::FavoriteCityStore;
pub use geolocation::{GeolocationResolver, PositionOptions, PositionProvider};
pub use model::{
    Coordinates, CurrentConditions, DailyPoint, FavoriteCity, HourlyPoint, SearchCandidate,
    Timezone, WeatherQuery, WeatherSnapshot,
};
pub use provider::{HttpWeatherProvider, WeatherProvider};
pub use search::{CitySearchAutocomplete, SearchOptions, SearchView};
