use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::ProviderError,
    model::{SearchCandidate, WeatherQuery, WeatherSnapshot},
    provider::is_searchable,
};

use super::WeatherProvider;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Talks to the weather backend's `/weather` and `/search` endpoints.
#[derive(Debug, Clone)]
pub struct HttpWeatherProvider {
    base_url: String,
    http: Client,
}

impl HttpWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self.http.get(&url).query(params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(
                "GET {} failed with status {}: {}",
                url,
                status,
                truncate_body(&body)
            );
            return Err(ProviderError::Status {
                status,
                detail: error_detail(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchCandidate>,
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError> {
        let params = match query {
            WeatherQuery::City(name) => vec![("city", name.clone())],
            WeatherQuery::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
        };

        tracing::debug!("Fetching weather for {}", query);
        self.get_json("weather", &params).await
    }

    async fn search_cities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }

        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        let parsed: SearchResponse = self.get_json("search", &params).await?;

        Ok(parsed.results)
    }
}

/// Only string details are meant for users; structured validation
/// payloads are dropped.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(str::to_owned))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
