use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Broad weather category, independent of the provider's own code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Clear,
    Fog,
    Clouds,
}

impl WeatherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherType::Thunderstorm => "Thunderstorm",
            WeatherType::Drizzle => "Drizzle",
            WeatherType::Rain => "Rain",
            WeatherType::Snow => "Snow",
            WeatherType::Clear => "Clear",
            WeatherType::Fog => "Fog",
            WeatherType::Clouds => "Clouds",
        }
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current weather at a point, as returned by a [`crate::WeatherProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub provider: String,
    pub coordinates: Coordinates,
    pub location_name: String,
    pub temperature_c: f64,
    pub weather_type: WeatherType,
    /// Free-text description from the provider, e.g. "light snow".
    pub condition: String,
    /// Local times at the location's UTC offset, when the provider reports them.
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
}

/// One persisted line of weather history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub captured_at: DateTime<Utc>,
    pub weather: WeatherRecord,
}

impl HistoryEntry {
    pub fn now(weather: WeatherRecord) -> Self {
        Self { captured_at: Utc::now(), weather }
    }
}
