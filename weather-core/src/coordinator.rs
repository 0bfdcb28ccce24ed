//! Authoritative weather request state.
//!
//! The coordinator owns a single [`WeatherState`] published through a
//! `tokio::sync::watch` channel. Every fetch takes a new generation when it
//! starts; when it completes it writes only if no later fetch has started in
//! the meantime, so the last-issued request wins regardless of arrival order.

use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::{
    error::{LocateError, WeatherLookupError},
    geolocation::GeolocationResolver,
    model::{Coordinates, WeatherQuery, WeatherSnapshot},
    provider::WeatherProvider,
};

/// Observable facets of the request state. Always interpretable as exactly
/// one [`RequestState`].
#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub data: Option<Arc<WeatherSnapshot>>,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl WeatherState {
    /// Loading wins over error, error over data. A snapshot kept from an
    /// earlier cycle stays visible in `data` while a new request runs.
    pub fn request_state(&self) -> RequestState {
        if self.loading {
            RequestState::Loading
        } else if let Some(message) = &self.error {
            RequestState::Error(message.clone())
        } else if let Some(data) = &self.data {
            RequestState::Success(data.clone())
        } else {
            RequestState::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Loading,
    Success(Arc<WeatherSnapshot>),
    Error(String),
}

#[derive(Debug)]
pub struct WeatherRequestCoordinator {
    provider: Arc<dyn WeatherProvider>,
    state: watch::Sender<WeatherState>,
}

impl WeatherRequestCoordinator {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self { provider, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    pub fn request_state(&self) -> RequestState {
        self.state.borrow().request_state()
    }

    pub fn data(&self) -> Option<Arc<WeatherSnapshot>> {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub async fn get_by_city(&self, name: &str) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        self.fetch(WeatherQuery::City(name.to_string())).await
    }

    pub async fn get_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        self.fetch(WeatherQuery::Coordinates(Coordinates::new(latitude, longitude)))
            .await
    }

    /// Resolve the device position, then fetch weather for it. The whole flow
    /// holds one generation taken when it starts, so its outcome (a
    /// geolocation error or the coordinates fetch) only lands if no later
    /// fetch was issued in the meantime.
    pub async fn get_by_geolocation(
        &self,
        resolver: &GeolocationResolver,
        timeout: Duration,
    ) -> Result<Arc<WeatherSnapshot>, LocateError> {
        let generation = self.begin();
        tracing::debug!("Weather request #{} waiting for position", generation);

        let coords = match resolver.resolve(timeout).await {
            Ok(coords) => coords,
            Err(e) => {
                if !self.fail(generation, e.to_string()) {
                    tracing::debug!("Discarding superseded geolocation failure #{}", generation);
                }
                return Err(e.into());
            }
        };

        Ok(self
            .fetch_as(generation, WeatherQuery::Coordinates(coords))
            .await?)
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    pub fn clear_weather(&self) {
        self.state.send_if_modified(|s| s.data.take().is_some());
    }

    /// A superseded call still returns its own outcome but leaves the state
    /// to the newer call.
    async fn fetch(&self, query: WeatherQuery) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        let generation = self.begin();
        self.fetch_as(generation, query).await
    }

    async fn fetch_as(
        &self,
        generation: u64,
        query: WeatherQuery,
    ) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        tracing::debug!("Weather request #{} for {}", generation, query);

        let result = self
            .provider
            .weather(&query)
            .await
            .map(Arc::new)
            .map_err(|e| {
                tracing::warn!("Weather request #{} for {} failed: {}", generation, query, e);
                WeatherLookupError::from(e)
            });

        if !self.finish(generation, &result) {
            tracing::debug!("Discarding superseded weather response #{}", generation);
        }

        result
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.loading = true;
            s.error = None;
            generation = s.generation;
        });
        generation
    }

    fn finish(
        &self,
        generation: u64,
        result: &Result<Arc<WeatherSnapshot>, WeatherLookupError>,
    ) -> bool {
        match result {
            Ok(snapshot) => self.state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.loading = false;
                s.data = Some(snapshot.clone());
                true
            }),
            Err(e) => self.fail(generation, e.to_string()),
        }
    }

    /// Ends `generation` with an error, unless a later call owns the state.
    fn fail(&self, generation: u64, message: String) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.loading = false;
            s.error = Some(message);
            true
        })
    }
}
