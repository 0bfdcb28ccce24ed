//! Failure domains of the client core and the messages each one surfaces.

use thiserror::Error;

/// Shown when a weather lookup fails without a server-supplied detail.
pub const WEATHER_FALLBACK_MESSAGE: &str = "Unable to retrieve weather data";

/// Failure talking to the weather backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to weather backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather backend returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },

    #[error("failed to decode weather backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Human-readable detail supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ProviderError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// A weather lookup that failed. Displays as the message the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", lookup_message(.detail.as_deref()))]
pub struct WeatherLookupError {
    pub detail: Option<String>,
}

impl WeatherLookupError {
    pub fn message(&self) -> &str {
        lookup_message(self.detail.as_deref())
    }
}

fn lookup_message(detail: Option<&str>) -> &str {
    detail
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(WEATHER_FALLBACK_MESSAGE)
}

impl From<ProviderError> for WeatherLookupError {
    fn from(e: ProviderError) -> Self {
        Self {
            detail: e.detail().map(str::to_owned),
        }
    }
}

/// Why a one-shot position lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Geolocation permission denied")]
    PermissionDenied,
    #[error("Position unavailable")]
    PositionUnavailable,
    #[error("Geolocation request timeout")]
    Timeout,
    #[error("Geolocation not supported")]
    Unsupported,
    /// Provider code with no dedicated mapping.
    #[error("Geolocation error")]
    Other(Option<u16>),
}

/// Failure of the locate-then-fetch flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error(transparent)]
    Weather(#[from] WeatherLookupError),
}

/// Problems with the favorite slot. `Corrupt` never reaches callers of `get`.
#[derive(Debug, Error)]
pub enum FavoriteStoreError {
    #[error("favorite storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored favorite is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
