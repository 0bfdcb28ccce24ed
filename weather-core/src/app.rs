//! Wires the client components together and runs the startup flow.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    coordinator::WeatherRequestCoordinator,
    error::{FavoriteStoreError, LocateError, WeatherLookupError},
    expiry::format_time_until_expiry,
    favorites::FavoriteCityStore,
    geolocation::{GeolocationResolver, PositionProvider, StaticPositionProvider},
    model::{FavoriteCity, SearchCandidate, WeatherSnapshot},
    provider::{HttpWeatherProvider, WeatherProvider},
    search::CitySearchAutocomplete,
    storage::{FileStore, KeyValueStore},
};

/// What startup found in the favorite slot.
#[derive(Debug)]
pub enum Startup {
    /// The favorite was found and its weather requested.
    Favorite {
        favorite: FavoriteCity,
        weather: Result<Arc<WeatherSnapshot>, WeatherLookupError>,
    },
    NoFavorite,
}

/// One instance per application run.
#[derive(Debug)]
pub struct WeatherApp {
    coordinator: Arc<WeatherRequestCoordinator>,
    search: CitySearchAutocomplete,
    favorites: FavoriteCityStore,
    geolocation: GeolocationResolver,
    geolocation_timeout: Duration,
}

impl WeatherApp {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        storage: Arc<dyn KeyValueStore>,
        position: Option<Arc<dyn PositionProvider>>,
        config: &Config,
    ) -> Self {
        Self {
            coordinator: Arc::new(WeatherRequestCoordinator::new(provider.clone())),
            search: CitySearchAutocomplete::new(provider, config.search_options()),
            favorites: FavoriteCityStore::new(storage),
            geolocation: GeolocationResolver::new(position, config.position_options()),
            geolocation_timeout: config.geolocation_timeout(),
        }
    }

    /// HTTP backend from `api_url`, favorite slot in the platform data
    /// directory, configured home position as the location source.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = HttpWeatherProvider::new(config.api_url.clone())
            .context("Failed to build HTTP client for the weather backend")?;
        let storage = FileStore::new(Config::data_dir()?);
        let position = config.home_position().map(|home| {
            Arc::new(StaticPositionProvider::new(home)) as Arc<dyn PositionProvider>
        });

        Ok(Self::new(Arc::new(provider), Arc::new(storage), position, config))
    }

    pub fn coordinator(&self) -> &Arc<WeatherRequestCoordinator> {
        &self.coordinator
    }

    pub fn search(&self) -> &CitySearchAutocomplete {
        &self.search
    }

    pub fn favorites(&self) -> &FavoriteCityStore {
        &self.favorites
    }

    pub fn geolocation(&self) -> &GeolocationResolver {
        &self.geolocation
    }

    /// Load the favorite city, or report that there is none.
    pub async fn start(&self) -> Startup {
        match self.favorites.get() {
            Some(favorite) => {
                tracing::info!("Loading favorite city {}", favorite.name);
                let weather = self.coordinator.get_by_city(&favorite.name).await;
                Startup::Favorite { favorite, weather }
            }
            None => {
                self.coordinator.clear_weather();
                Startup::NoFavorite
            }
        }
    }

    pub async fn select(
        &self,
        candidate: &SearchCandidate,
    ) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        self.search.select(candidate, &self.coordinator).await
    }

    pub async fn locate(&self) -> Result<Arc<WeatherSnapshot>, LocateError> {
        self.coordinator
            .get_by_geolocation(&self.geolocation, self.geolocation_timeout)
            .await
    }

    /// Flip the favorite status of the displayed city. Returns the new status,
    /// or `None` when nothing is displayed.
    pub fn toggle_favorite(&self) -> Result<Option<bool>, FavoriteStoreError> {
        let Some(snapshot) = self.coordinator.data() else {
            return Ok(None);
        };

        if self.favorites.is_favorite(&snapshot.city) {
            self.favorites.remove()?;
            Ok(Some(false))
        } else {
            self.favorites.save(&snapshot.city, &snapshot.country)?;
            Ok(Some(true))
        }
    }

    /// Countdown until the displayed snapshot's server cache expires.
    pub fn cache_expiry(&self, now: DateTime<Utc>) -> String {
        let expires_at = self.coordinator.data().and_then(|s| s.cache_expires_at);
        format_time_until_expiry(now, expires_at)
    }
}
