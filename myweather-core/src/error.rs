use thiserror::Error;

/// Failures reported by a [`crate::WeatherClient`].
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport, DNS or timeout failure.
    #[error("Weather request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Body was not JSON of the expected shape.
    #[error("Failed to parse weather response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API has no matching location.
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status.
    #[error("Weather API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failures reported by the location resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Unable to determine location")]
    NoLocation,
}

#[derive(Debug, Error)]
#[error("Speech failed: {0}")]
pub struct SpeechError(pub String);

/// Everything that can end a fetch cycle early.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}
