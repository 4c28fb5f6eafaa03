use async_trait::async_trait;
use std::fmt::Debug;

use crate::SpeechError;

/// Reads text aloud. Audio rendering lives with the platform implementation.
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}
