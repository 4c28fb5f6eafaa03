//! Device location lookup.
//!
//! Platform permission and positioning services are reached through
//! [`PermissionProvider`] and [`LocationProvider`]; desktop builds compose
//! [`AlwaysGranted`] with a [`FixedLocation`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

use crate::LocationError;

/// How long to wait for a fresh fix when no cached position exists.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Where a fetch cycle takes its location from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// The stored city name.
    City,
    /// The device's position.
    Device,
}

impl LocationMode {
    pub const fn from_use_city(use_city: bool) -> Self {
        if use_city { LocationMode::City } else { LocationMode::Device }
    }
}

#[async_trait]
pub trait PermissionProvider: Send + Sync + Debug {
    /// Check location access, prompting the user if it hasn't been decided yet.
    async fn check_and_request(&self) -> bool;
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn last_known(&self) -> Option<Position>;

    async fn current(&self, timeout: Duration) -> Option<Position>;
}

/// Permission provider for platforms that grant location access implicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

#[async_trait]
impl PermissionProvider for AlwaysGranted {
    async fn check_and_request(&self) -> bool {
        true
    }
}

/// Location provider that reports a preset position, or none at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Position>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known(&self) -> Option<Position> {
        self.0
    }

    async fn current(&self, _timeout: Duration) -> Option<Position> {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    permissions: Arc<dyn PermissionProvider>,
    locator: Arc<dyn LocationProvider>,
    fix_timeout: Duration,
}

impl LocationResolver {
    pub fn new(permissions: Arc<dyn PermissionProvider>, locator: Arc<dyn LocationProvider>) -> Self {
        Self { permissions, locator, fix_timeout: DEFAULT_FIX_TIMEOUT }
    }

    pub fn with_fix_timeout(mut self, timeout: Duration) -> Self {
        self.fix_timeout = timeout;
        self
    }

    /// Resolve a position for `mode`.
    ///
    /// City mode and a missing fix both yield `Ok(None)`; only a refused
    /// permission is an error.
    pub async fn resolve(&self, mode: LocationMode) -> Result<Option<Position>, LocationError> {
        if mode == LocationMode::City {
            return Ok(None);
        }

        if !self.permissions.check_and_request().await {
            debug!("Location permission refused");
            return Err(LocationError::PermissionDenied);
        }

        if let Some(position) = self.locator.last_known().await {
            debug!("Using cached position {position:?}");
            return Ok(Some(position));
        }

        // The provider may ignore the timeout; bound the wait here as well.
        let fresh = tokio::time::timeout(self.fix_timeout, self.locator.current(self.fix_timeout))
            .await
            .unwrap_or_else(|_| {
                debug!("No position fix within {:?}", self.fix_timeout);
                None
            });

        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Denied;

    #[async_trait]
    impl PermissionProvider for Denied {
        async fn check_and_request(&self) -> bool {
            false
        }
    }

    #[derive(Debug, Default)]
    struct CountingLocator {
        cached: Option<Position>,
        fresh: Option<Position>,
        hang: bool,
        last_known_calls: AtomicUsize,
        current_calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationProvider for CountingLocator {
        async fn last_known(&self) -> Option<Position> {
            self.last_known_calls.fetch_add(1, Ordering::SeqCst);
            self.cached
        }

        async fn current(&self, _timeout: Duration) -> Option<Position> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.fresh
        }
    }

    fn resolver(perm: impl PermissionProvider + 'static, loc: Arc<CountingLocator>) -> LocationResolver {
        LocationResolver::new(Arc::new(perm), loc)
    }

    #[tokio::test]
    async fn city_mode_skips_providers() {
        let loc = Arc::new(CountingLocator::default());
        let result = resolver(Denied, loc.clone()).resolve(LocationMode::City).await;

        assert_eq!(result, Ok(None));
        assert_eq!(loc.last_known_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn denied_permission_is_distinguished() {
        let loc = Arc::new(CountingLocator {
            cached: Some(Position::new(1.0, 2.0)),
            ..Default::default()
        });
        let result = resolver(Denied, loc.clone()).resolve(LocationMode::Device).await;

        assert_eq!(result, Err(LocationError::PermissionDenied));
        assert_eq!(loc.last_known_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_position_wins() {
        let loc = Arc::new(CountingLocator {
            cached: Some(Position::new(47.6, -122.3)),
            fresh: Some(Position::new(0.0, 0.0)),
            ..Default::default()
        });
        let result = resolver(AlwaysGranted, loc.clone()).resolve(LocationMode::Device).await;

        assert_eq!(result, Ok(Some(Position::new(47.6, -122.3))));
        assert_eq!(loc.current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_to_fresh_fix() {
        let loc = Arc::new(CountingLocator {
            fresh: Some(Position::new(51.5, -0.1)),
            ..Default::default()
        });
        let result = resolver(AlwaysGranted, loc.clone()).resolve(LocationMode::Device).await;

        assert_eq!(result, Ok(Some(Position::new(51.5, -0.1))));
        assert_eq!(loc.current_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_fix_is_not_an_error() {
        let loc = Arc::new(CountingLocator::default());
        let result = resolver(AlwaysGranted, loc).resolve(LocationMode::Device).await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_is_bounded_by_timeout() {
        let loc = Arc::new(CountingLocator { hang: true, ..Default::default() });
        let result = resolver(AlwaysGranted, loc)
            .with_fix_timeout(Duration::from_secs(30))
            .resolve(LocationMode::Device)
            .await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn fixed_location_reports_preset() {
        let fixed = FixedLocation(Some(Position::new(1.0, 2.0)));
        assert_eq!(fixed.last_known().await, Some(Position::new(1.0, 2.0)));
        assert_eq!(FixedLocation(None).current(DEFAULT_FIX_TIMEOUT).await, None);
    }

    #[test]
    fn mode_follows_use_city_preference() {
        assert_eq!(LocationMode::from_use_city(true), LocationMode::City);
        assert_eq!(LocationMode::from_use_city(false), LocationMode::Device);
    }
}
