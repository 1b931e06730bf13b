//! Core library for the `locweather` CLI.
//!
//! This crate defines:
//! - GPS coordinate acquisition from a positioning command
//! - Abstraction over weather providers
//! - Formatting and persistent history of weather reports
//! - Configuration handling
//!
//! It is used by `locweather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod coordinates;
pub mod error;
pub mod format;
pub mod history;
pub mod model;
pub mod provider;
pub mod report;

pub use config::{Config, GpsConfig, HistoryConfig, ProviderConfig};
pub use coordinates::{CommandCoordinateProvider, CoordinateProvider, RoundingPolicy};
pub use error::{CoordinateError, ReportError, StorageError, WeatherServiceError};
pub use format::{format_weather, format_weather_line};
pub use history::{
    HistoryFormat, JsonFileWeatherStorage, PlainFileWeatherStorage, WeatherStorage, save_weather,
};
pub use model::{Coordinates, HistoryEntry, WeatherRecord, WeatherType};
pub use provider::{ProviderId, WeatherProvider};
pub use report::{WeatherReport, locate, report_current_weather, report_weather_at};
