//! Coarse weather classification from short-forecast text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Foggy,
    Rainy,
    Clear,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Foggy => "foggy",
            Weather::Rainy => "rainy",
            Weather::Clear => "clear",
        }
    }

    /// Map a provider short-forecast string onto the model's three
    /// categories. Anything unrecognized reads as clear.
    ///
    /// The classification always runs on the CURRENT forecast, whatever
    /// the requested trip time; the model was trained against the same
    /// reading, so resolving the forecast at departure time would break
    /// training/inference parity.
    pub fn classify(short_forecast: &str) -> Self {
        match short_forecast {
            "Fog" | "fog" => Weather::Foggy,
            "Rain" | "rain" | "Storm" | "storm" | "Snow" | "snow" => Weather::Rainy,
            _ => Weather::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_variants_map_to_foggy() {
        assert_eq!(Weather::classify("Fog"), Weather::Foggy);
        assert_eq!(Weather::classify("fog"), Weather::Foggy);
    }

    #[test]
    fn precipitation_variants_map_to_rainy() {
        for text in ["Rain", "rain", "Storm", "storm", "Snow", "snow"] {
            assert_eq!(Weather::classify(text), Weather::Rainy);
        }
    }

    #[test]
    fn everything_else_maps_to_clear() {
        assert_eq!(Weather::classify("Sunny"), Weather::Clear);
        assert_eq!(Weather::classify("Partly Cloudy"), Weather::Clear);
        // Compound phrases are not recognized precipitation tokens.
        assert_eq!(Weather::classify("Light Rain"), Weather::Clear);
        assert_eq!(Weather::classify(""), Weather::Clear);
    }
}
