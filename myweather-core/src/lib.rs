//! Core library for the `myweather` app.
//!
//! This crate defines:
//! - Configuration and persisted preferences
//! - The OpenWeatherMap client and its response models
//! - Device location resolution behind platform traits
//! - The forecast orchestrator that ties a fetch cycle together
//!
//! It is used by `myweather-cli`, but GUI front ends can drive the same
//! orchestrator by supplying their own platform services.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod settings;
pub mod speech;
pub mod units;

pub use config::{Config, OpenWeatherConfig, Preferences};
pub use error::{FetchError, LocationError, SpeechError, WeatherError};
pub use location::{LocationMode, LocationProvider, LocationResolver, PermissionProvider, Position};
pub use model::{ForecastList, WeatherSnapshot};
pub use orchestrator::{FetchOutcome, ForecastOrchestrator, QueryState};
pub use provider::{WeatherClient, client_from_config, openweather::OpenWeatherClient};
pub use settings::{FileSettings, MemorySettings, SettingsStore};
pub use speech::SpeechProvider;
pub use units::Units;
