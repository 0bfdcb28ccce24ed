//! Controllable fakes shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt};
use tokio::sync::oneshot;

use crate::{
    error::ProviderError,
    geolocation::{PositionCallback, PositionErrorCode, PositionOptions, PositionProvider},
    model::{Coordinates, SearchCandidate, WeatherQuery, WeatherSnapshot, fixtures},
    provider::WeatherProvider,
};

pub(crate) type Reply = Result<WeatherSnapshot, ProviderError>;

/// Provider whose responses are released by the test, in any order.
/// Queries without a gate answer at once with a snapshot named after the query.
#[derive(Debug, Default)]
pub(crate) struct GatedProvider {
    pending: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    pub(crate) calls: Mutex<Vec<WeatherQuery>>,
}

impl GatedProvider {
    /// Hold the next query for `key` (a city name, or `"lat,lon"`) until the
    /// returned sender fires. Dropping the sender fails the query with a 503.
    pub(crate) fn gate(&self, key: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(key.to_string(), rx);
        tx
    }
}

pub(crate) fn key_of(query: &WeatherQuery) -> String {
    match query {
        WeatherQuery::City(name) => name.clone(),
        WeatherQuery::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
    }
}

#[async_trait]
impl WeatherProvider for GatedProvider {
    async fn weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError> {
        self.calls.lock().push(query.clone());
        let rx = self.pending.lock().remove(&key_of(query));
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(ProviderError::Status {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    detail: None,
                })
            }),
            None => Ok(fixtures::snapshot(&key_of(query), "XX")),
        }
    }

    async fn search_cities(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Position provider that keeps the callback until the test answers it.
#[derive(Default)]
pub(crate) struct HeldPositionProvider {
    callback: Mutex<Option<PositionCallback>>,
}

impl fmt::Debug for HeldPositionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeldPositionProvider")
            .field("waiting", &self.callback.lock().is_some())
            .finish()
    }
}

impl HeldPositionProvider {
    /// Deliver `result` to the held request. Returns `false` if none is waiting.
    pub(crate) fn answer(&self, result: Result<Coordinates, PositionErrorCode>) -> bool {
        let callback = self.callback.lock().take();
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }
}

impl PositionProvider for HeldPositionProvider {
    fn get_current_position(&self, _options: PositionOptions, callback: PositionCallback) {
        *self.callback.lock() = Some(callback);
    }
}
