use serde::{Deserialize, Serialize};

/// Measurement system requested from the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Imperial,
    Metric,
}

impl Units {
    /// Map the "use imperial units" preference to a unit system.
    pub const fn from_imperial(use_imperial: bool) -> Self {
        if use_imperial { Units::Imperial } else { Units::Metric }
    }

    /// Token sent as the `units` query parameter.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
        }
    }

    /// Suffix shown after a temperature reading.
    pub const fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "F",
            Units::Metric => "C",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Imperial, Units::Metric]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_maps_to_api_token() {
        assert_eq!(Units::from_imperial(true).as_str(), "imperial");
        assert_eq!(Units::from_imperial(false).as_str(), "metric");
    }

    #[test]
    fn tokens_are_lowercase_and_known() {
        for units in Units::all() {
            let token = units.as_str();
            assert!(token == "imperial" || token == "metric");
            assert_eq!(token, token.to_lowercase());
        }
    }

    #[test]
    fn suffix_follows_preference() {
        assert_eq!(Units::from_imperial(true).temperature_suffix(), "F");
        assert_eq!(Units::from_imperial(false).temperature_suffix(), "C");
    }
}
