use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sys {
    pub country: String,
}

/// One entry of the `weather` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    pub temp: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clouds {
    pub all: i64,
}

/// Current conditions for one place, or one interval of a forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub coord: Coord,
    pub sys: Sys,
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    pub wind: Wind,
    pub clouds: Clouds,
    #[serde(rename = "id")]
    pub city_id: i64,
    pub name: String,
    /// Interval start, only present on forecast entries.
    pub dt_txt: Option<String>,
}

impl WeatherSnapshot {
    /// Description of the first reported condition, or an empty string.
    pub fn description(&self) -> &str {
        self.weather.first().map(|w| w.description.as_str()).unwrap_or_default()
    }

    /// Forecast interval start rendered in local time; empty when absent or unparsable.
    pub fn display_date(&self) -> String {
        let Some(raw) = self.dt_txt.as_deref().filter(|s| !s.is_empty()) else {
            return String::new();
        };

        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            Ok(naive) => Utc
                .from_utc_datetime(&naive)
                .with_timezone(&Local)
                .format("%-m/%-d/%Y %-I:%M %p")
                .to_string(),
            Err(err) => {
                debug!("Unparsable forecast timestamp {raw:?}: {err}");
                String::new()
            }
        }
    }

    pub fn display_temp(&self) -> String {
        let main = self.weather.first().map(|w| w.main.as_str()).unwrap_or_default();
        format!("Temp: {}° {}", self.main.temp, main)
    }

    pub fn display_icon(&self) -> String {
        let icon = self.weather.first().map(|w| w.icon.as_str()).unwrap_or_default();
        format!("http://openweathermap.org/img/w/{icon}.png")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub coord: Option<Coord>,
    pub country: String,
    pub population: i64,
    pub sys: Option<Sys>,
}

/// Multi-interval forecast for a city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastList {
    pub city: Option<City>,
    #[serde(deserialize_with = "lenient_string")]
    pub cod: Option<String>,
    pub message: f64,
    pub cnt: i64,
    pub list: Vec<WeatherSnapshot>,
}

impl ForecastList {
    pub fn city_id(&self) -> Option<i64> {
        self.city.as_ref().map(|c| c.id)
    }

    pub fn into_entries(self) -> Vec<WeatherSnapshot> {
        self.list
    }
}

/// The API reports `cod` as a string on some endpoints and a number on others.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

/// Decode a JSON body, matching object keys regardless of case.
pub fn decode_case_insensitive<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    let value: Value = serde_json::from_str(body)?;
    serde_json::from_value(lowercase_keys(value))
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
