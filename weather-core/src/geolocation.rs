//! One-shot position lookup over a callback-style platform primitive.

use std::{fmt::Debug, sync::Arc, time::Duration};
use tokio::sync::oneshot;

use crate::{error::GeolocationError, model::Coordinates};

pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration handed to the platform for a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Provider-specific failure code reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionErrorCode(pub u16);

impl PositionErrorCode {
    pub const PERMISSION_DENIED: Self = Self(1);
    pub const POSITION_UNAVAILABLE: Self = Self(2);
    pub const TIMEOUT: Self = Self(3);
}

impl From<PositionErrorCode> for GeolocationError {
    fn from(code: PositionErrorCode) -> Self {
        match code {
            PositionErrorCode::PERMISSION_DENIED => GeolocationError::PermissionDenied,
            PositionErrorCode::POSITION_UNAVAILABLE => GeolocationError::PositionUnavailable,
            PositionErrorCode::TIMEOUT => GeolocationError::Timeout,
            PositionErrorCode(other) => GeolocationError::Other(Some(other)),
        }
    }
}

pub type PositionCallback = Box<dyn FnOnce(Result<Coordinates, PositionErrorCode>) + Send>;

/// The platform's "get current position" primitive. Implementations invoke
/// `callback` at most once and are expected to honor `options.timeout`.
pub trait PositionProvider: Send + Sync + Debug {
    fn get_current_position(&self, options: PositionOptions, callback: PositionCallback);
}

/// Resolves the device position once per call. Never retries.
#[derive(Debug, Clone, Default)]
pub struct GeolocationResolver {
    provider: Option<Arc<dyn PositionProvider>>,
    options: PositionOptions,
}

impl GeolocationResolver {
    /// `provider` is `None` when the platform has no location capability.
    pub fn new(provider: Option<Arc<dyn PositionProvider>>, options: PositionOptions) -> Self {
        Self { provider, options }
    }

    pub fn unsupported() -> Self {
        Self::default()
    }

    pub fn is_supported(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn resolve(&self, timeout: Duration) -> Result<Coordinates, GeolocationError> {
        let Some(provider) = &self.provider else {
            return Err(GeolocationError::Unsupported);
        };

        let options = PositionOptions {
            timeout,
            ..self.options
        };

        tracing::debug!("Requesting position (timeout {:?})", timeout);

        let (tx, rx) = oneshot::channel();
        provider.get_current_position(
            options,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        match rx.await {
            Ok(Ok(coords)) => {
                tracing::debug!("Got position: {}, {}", coords.latitude, coords.longitude);
                Ok(coords)
            }
            Ok(Err(code)) => {
                tracing::warn!("Geolocation failed with provider code {}", code.0);
                Err(code.into())
            }
            Err(_) => {
                tracing::warn!("Position provider dropped the request without answering");
                Err(GeolocationError::Other(None))
            }
        }
    }
}

/// A fixed, preconfigured position standing in for a platform sensor.
#[derive(Debug, Clone, Copy)]
pub struct StaticPositionProvider {
    coordinates: Coordinates,
}

impl StaticPositionProvider {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

impl PositionProvider for StaticPositionProvider {
    fn get_current_position(&self, _options: PositionOptions, callback: PositionCallback) {
        callback(Ok(self.coordinates));
    }
}
