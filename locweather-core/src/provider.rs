use crate::{
    Config, Coordinates, WeatherRecord,
    error::WeatherServiceError,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => {
                let supported: Vec<_> = ProviderId::all().iter().map(ProviderId::as_str).collect();
                Err(anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    supported.join(", ")
                ))
            }
        }
    }
}

/// Current weather lookup by coordinates. One request, no retries.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, coords: Coordinates) -> Result<WeatherRecord, WeatherServiceError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_config = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `locweather configure {id}` and enter your API key."
        )
    })?;

    let http = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    let api_key = provider_config.api_key.clone();
    let base_url = provider_config.base_url.clone();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let mut provider = OpenWeatherProvider::new(api_key).with_http(http);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
        ProviderId::WeatherApi => {
            let mut provider = WeatherApiProvider::new(api_key).with_http(http);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
