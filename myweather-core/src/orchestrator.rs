//! The fetch cycle: location → current conditions → forecast → display strings → speech.
//!
//! One [`ForecastOrchestrator`] runs at most one cycle at a time. A call made
//! while a cycle is in flight returns [`FetchOutcome::Skipped`] without
//! touching any state.

use parking_lot::RwLock;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info, warn};

use crate::{
    FetchError, LocationError, SettingsStore, SpeechProvider, Units, WeatherClient,
    WeatherSnapshot,
    location::{LocationMode, LocationResolver},
};

pub const PERMISSION_DENIED_STATUS: &str = "Location permission denied";
pub const NO_LOCATION_STATUS: &str = "Unable to determine location";
pub const FETCH_FAILED_STATUS: &str = "Unable to get Weather";

/// What the presentation layer reads after a cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Formatted temperature, or a status message when the cycle failed.
    pub temp: String,
    pub condition: String,
    pub forecast: Vec<WeatherSnapshot>,
    /// Detail of the last failure, cleared by a successful cycle.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another cycle was already running.
    Skipped,
    /// Display strings were refreshed.
    Completed,
    /// The API answered with an empty body; nothing changed.
    NoData,
    /// The cycle ended early and a status message was recorded.
    Failed,
}

#[derive(Debug)]
pub struct ForecastOrchestrator {
    client: Arc<dyn WeatherClient>,
    settings: Arc<dyn SettingsStore>,
    resolver: LocationResolver,
    speech: Option<Arc<dyn SpeechProvider>>,
    mode: RwLock<LocationMode>,
    busy: AtomicBool,
    state: RwLock<QueryState>,
}

/// Clears the busy flag on every exit path. When unwinding, the cycle is
/// also recorded as failed.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a RwLock<QueryState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.state.write();
            state.temp = FETCH_FAILED_STATUS.to_string();
            state.last_error = Some("fetch cycle panicked".to_string());
        }
        self.busy.store(false, Ordering::Release);
    }
}

impl ForecastOrchestrator {
    pub fn new(
        client: Arc<dyn WeatherClient>,
        settings: Arc<dyn SettingsStore>,
        resolver: LocationResolver,
    ) -> Self {
        let mode = LocationMode::from_use_city(settings.use_city());
        Self {
            client,
            settings,
            resolver,
            speech: None,
            mode: RwLock::new(mode),
            busy: AtomicBool::new(false),
            state: RwLock::new(QueryState::default()),
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechProvider>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn state(&self) -> QueryState {
        self.state.read().clone()
    }

    pub fn temp(&self) -> String {
        self.state.read().temp.clone()
    }

    pub fn condition(&self) -> String {
        self.state.read().condition.clone()
    }

    pub fn forecast(&self) -> Vec<WeatherSnapshot> {
        self.state.read().forecast.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn location(&self) -> String {
        self.settings.city()
    }

    pub fn set_location(&self, city: impl Into<String>) {
        self.settings.set_city(city.into());
    }

    pub fn is_imperial(&self) -> bool {
        self.settings.use_imperial()
    }

    pub fn set_imperial(&self, imperial: bool) {
        self.settings.set_use_imperial(imperial);
    }

    pub fn location_mode(&self) -> LocationMode {
        *self.mode.read()
    }

    pub fn set_location_mode(&self, mode: LocationMode) {
        *self.mode.write() = mode;
        self.settings.set_use_city(mode == LocationMode::City);
    }

    /// Run one fetch cycle.
    pub async fn get_weather(&self) -> FetchOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Fetch already in flight, ignoring request");
            return FetchOutcome::Skipped;
        }
        let _guard = BusyGuard { busy: &self.busy, state: &self.state };

        match self.run_cycle().await {
            Ok(true) => FetchOutcome::Completed,
            Ok(false) => FetchOutcome::NoData,
            Err(err) => {
                self.record_failure(&err);
                FetchOutcome::Failed
            }
        }
    }

    async fn run_cycle(&self) -> Result<bool, FetchError> {
        let units = Units::from_imperial(self.settings.use_imperial());
        let mode = self.location_mode();

        let position = self.resolver.resolve(mode).await?;

        let current = match (mode, position) {
            (_, Some(pos)) => {
                self.client.current_by_coordinates(pos.latitude, pos.longitude, units).await?
            }
            (LocationMode::Device, None) => return Err(LocationError::NoLocation.into()),
            (LocationMode::City, None) => {
                let city = self.settings.city();
                self.client.current_by_city(city.trim(), units).await?
            }
        };

        let Some(current) = current else {
            debug!("No current conditions returned");
            return Ok(false);
        };

        // A failed forecast keeps the current conditions.
        let forecast = match self.client.forecast(current.city_id, units).await {
            Ok(Some(list)) => list.into_entries(),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Forecast fetch for city {} failed: {err}", current.city_id);
                Vec::new()
            }
        };

        let temp = format!("Temp: {}°{}", current.main.temp, units.temperature_suffix());
        let condition = format!("{}: {}", current.name, current.description());
        info!("{temp} {condition} ({} forecast entries)", forecast.len());

        {
            let mut state = self.state.write();
            state.temp = temp.clone();
            state.condition = condition.clone();
            state.forecast = forecast;
            state.last_error = None;
        }

        if let Some(speech) = &self.speech {
            if let Err(err) = speech.speak(&format!("{temp} {condition}")).await {
                warn!("{err}");
            }
        }

        Ok(true)
    }

    fn record_failure(&self, err: &FetchError) {
        let status = match err {
            FetchError::Location(LocationError::PermissionDenied) => PERMISSION_DENIED_STATUS,
            FetchError::Location(LocationError::NoLocation) => NO_LOCATION_STATUS,
            FetchError::Weather(_) => FETCH_FAILED_STATUS,
        };
        warn!("Fetch cycle failed: {err}");

        let mut state = self.state.write();
        state.temp = status.to_string();
        state.last_error = Some(err.to_string());
    }
}
