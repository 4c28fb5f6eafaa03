use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    ForecastList, Units, WeatherError, WeatherSnapshot, model::decode_case_insensitive,
};

use super::WeatherClient;

/// HTTP client for the OpenWeatherMap 2.5 API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(api_message(&body)));
        }

        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            debug!("OpenWeather {endpoint} returned an empty body");
            return Ok(None);
        }

        Ok(Some(decode_case_insensitive(&body)?))
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn current_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        units: Units,
    ) -> Result<Option<WeatherSnapshot>, WeatherError> {
        self.fetch(
            "weather",
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("units", units.as_str().to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn current_by_city(
        &self,
        city: &str,
        units: Units,
    ) -> Result<Option<WeatherSnapshot>, WeatherError> {
        self.fetch(
            "weather",
            &[("q", city.to_string()), ("units", units.as_str().to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn forecast(
        &self,
        city_id: i64,
        units: Units,
    ) -> Result<Option<ForecastList>, WeatherError> {
        self.fetch(
            "forecast",
            &[("id", city_id.to_string()), ("units", units.as_str().to_string())],
        )
        .await
    }
}

/// Pull the `message` field out of an API error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
