use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherServiceError,
    model::{Coordinates, WeatherRecord, WeatherType},
    provider::{ProviderId, truncate_body},
};

use super::WeatherProvider;

const PROVIDER: &str = "weatherapi";
pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
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
        let url = format!("{}/v1/current.json", self.base_url);
        let q = format!("{},{}", coords.latitude, coords.longitude);

        tracing::debug!(%url, %coords, "requesting WeatherAPI current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str())])
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

        let parsed: WaResponse = serde_json::from_str(&body)
            .map_err(|source| WeatherServiceError::Decode { provider: PROVIDER, source })?;

        let code = parsed.current.condition.code;
        let weather_type = weather_type_from_code(code).ok_or_else(|| {
            WeatherServiceError::UnexpectedResponse {
                provider: PROVIDER,
                message: format!("unknown weather condition code {code}"),
            }
        })?;

        Ok(WeatherRecord {
            provider: ProviderId::WeatherApi.to_string(),
            coordinates: coords,
            location_name: format!("{}, {}", parsed.location.name, parsed.location.country),
            temperature_c: parsed.current.temp_c,
            weather_type,
            condition: parsed.current.condition.text,
            sunrise: None,
            sunset: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: u16,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

/// Condition codes: <https://www.weatherapi.com/docs/weather_conditions.json>
fn weather_type_from_code(code: u16) -> Option<WeatherType> {
    match code {
        1000 => Some(WeatherType::Clear),
        1003 | 1006 | 1009 => Some(WeatherType::Clouds),
        1030 | 1135 | 1147 => Some(WeatherType::Fog),
        1072 | 1150 | 1153 | 1168 | 1171 => Some(WeatherType::Drizzle),
        1063 | 1180..=1201 | 1240..=1246 => Some(WeatherType::Rain),
        1066 | 1069 | 1114 | 1117 | 1204..=1237 | 1249..=1264 => Some(WeatherType::Snow),
        1087 | 1273..=1282 => Some(WeatherType::Thunderstorm),
        _ => None,
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn get_weather(&self, coords: Coordinates) -> Result<WeatherRecord, WeatherServiceError> {
        self.fetch_current(coords).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn condition_codes_map_to_weather_types() {
        assert_eq!(weather_type_from_code(1000), Some(WeatherType::Clear));
        assert_eq!(weather_type_from_code(1009), Some(WeatherType::Clouds));
        assert_eq!(weather_type_from_code(1135), Some(WeatherType::Fog));
        assert_eq!(weather_type_from_code(1153), Some(WeatherType::Drizzle));
        assert_eq!(weather_type_from_code(1195), Some(WeatherType::Rain));
        assert_eq!(weather_type_from_code(1213), Some(WeatherType::Snow));
        assert_eq!(weather_type_from_code(1276), Some(WeatherType::Thunderstorm));
        assert_eq!(weather_type_from_code(42), None);
    }

    #[tokio::test]
    async fn fetches_current_weather_by_coordinates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "KEY"))
            .and(query_param("q", "55.8,37.6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Moscow", "country": "Russia", "localtime_epoch": 1700000000 },
                "current": {
                    "temp_c": 1.5,
                    "condition": { "text": "Patchy rain nearby", "code": 1063 }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        let record = provider.get_weather(Coordinates::new(55.8, 37.6)).await.unwrap();

        assert_eq!(record.provider, "weatherapi");
        assert_eq!(record.location_name, "Moscow, Russia");
        assert_eq!(record.temperature_c, 1.5);
        assert_eq!(record.weather_type, WeatherType::Rain);
        assert_eq!(record.condition, "Patchy rain nearby");
        assert!(record.sunrise.is_none());
    }

    #[tokio::test]
    async fn wrong_types_are_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Moscow", "country": "Russia" },
                "current": { "temp_c": "warm", "condition": { "text": "Sunny", "code": 1000 } }
            })))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        let err = provider.get_weather(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherServiceError::Decode { .. }));
    }

    #[tokio::test]
    async fn server_error_is_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        let err = provider.get_weather(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherServiceError::Status { status, .. } if status.as_u16() == 503));
    }
}
