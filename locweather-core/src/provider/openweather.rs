use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherServiceError,
    model::{Coordinates, WeatherRecord, WeatherType},
    provider::{ProviderId, truncate_body},
};

use super::WeatherProvider;

const PROVIDER: &str = "openweather";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherRecord, WeatherServiceError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        tracing::debug!(%url, %coords, "requesting OpenWeather current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|source| WeatherServiceError::Request { provider: PROVIDER, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherServiceError::Request { provider: PROVIDER, source })?;

        if !status.is_success() {
            return Err(WeatherServiceError::Status {
                provider: PROVIDER,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| WeatherServiceError::Decode { provider: PROVIDER, source })?;

        parsed.into_record(coords)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    sys: Option<OwSys>,
    /// Shift in seconds from UTC.
    #[serde(default)]
    timezone: i32,
}

impl OwCurrentResponse {
    fn into_record(self, coords: Coordinates) -> Result<WeatherRecord, WeatherServiceError> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            WeatherServiceError::UnexpectedResponse {
                provider: PROVIDER,
                message: "response contained no weather conditions".to_string(),
            }
        })?;

        let weather_type = weather_type_from_id(weather.id).ok_or_else(|| {
            WeatherServiceError::UnexpectedResponse {
                provider: PROVIDER,
                message: format!("unknown weather condition id {}", weather.id),
            }
        })?;

        let offset = FixedOffset::east_opt(self.timezone).ok_or_else(|| {
            WeatherServiceError::UnexpectedResponse {
                provider: PROVIDER,
                message: format!("invalid timezone offset {}", self.timezone),
            }
        })?;
        let local = |ts: Option<i64>| {
            ts.and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.with_timezone(&offset))
        };
        let (sunrise, sunset) = match self.sys {
            Some(sys) => (local(sys.sunrise), local(sys.sunset)),
            None => (None, None),
        };

        Ok(WeatherRecord {
            provider: ProviderId::OpenWeather.to_string(),
            coordinates: coords,
            location_name: self.name,
            temperature_c: self.main.temp,
            weather_type,
            condition: weather.description,
            sunrise,
            sunset,
        })
    }
}

/// Condition groups: <https://openweathermap.org/weather-conditions>
fn weather_type_from_id(id: u16) -> Option<WeatherType> {
    match id {
        200..=299 => Some(WeatherType::Thunderstorm),
        300..=399 => Some(WeatherType::Drizzle),
        500..=599 => Some(WeatherType::Rain),
        600..=699 => Some(WeatherType::Snow),
        700..=799 => Some(WeatherType::Fog),
        800 => Some(WeatherType::Clear),
        801..=804 => Some(WeatherType::Clouds),
        _ => None,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, coords: Coordinates) -> Result<WeatherRecord, WeatherServiceError> {
        self.fetch_current(coords).await
    }
}
