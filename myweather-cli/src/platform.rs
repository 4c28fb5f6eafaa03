//! Desktop stand-ins for the platform services a GUI shell would provide.

use async_trait::async_trait;
use myweather_core::{SpeechError, SpeechProvider};

/// Prints the line that would be spoken.
#[derive(Debug, Default)]
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechProvider for ConsoleSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        println!("(speaking) {text}");
        Ok(())
    }
}
