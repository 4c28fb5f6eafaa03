use crate::{
    Config, ForecastList, Units, WeatherError, WeatherSnapshot,
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and forecasts.
///
/// `Ok(None)` means the service answered with no data, which callers treat as
/// a valid outcome distinct from an error.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn current_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        units: Units,
    ) -> Result<Option<WeatherSnapshot>, WeatherError>;

    /// `city` is expected to be trimmed already.
    async fn current_by_city(
        &self,
        city: &str,
        units: Units,
    ) -> Result<Option<WeatherSnapshot>, WeatherError>;

    async fn forecast(
        &self,
        city_id: i64,
        units: Units,
    ) -> Result<Option<ForecastList>, WeatherError>;
}

/// Construct an OpenWeatherMap client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherClient>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeatherMap API key configured.\n\
                 Hint: run `myweather configure` and enter your API key."
        )
    })?;

    let client = OpenWeatherClient::new(
        api_key,
        &config.openweather.base_url,
        config.openweather.timeout(),
    )?;

    Ok(Box::new(client))
}
