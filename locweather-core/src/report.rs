use crate::{
    coordinates::CoordinateProvider,
    error::ReportError,
    format::format_weather,
    history::{WeatherStorage, save_weather},
    model::{Coordinates, WeatherRecord},
    provider::WeatherProvider,
};

/// Result of one successful run: the record and its console rendering.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub record: WeatherRecord,
    pub formatted: String,
}

/// Locate, fetch, format and record the current weather.
///
/// Stops at the first failing stage; the weather provider is never called
/// when coordinates cannot be obtained.
pub async fn report_current_weather(
    locator: &dyn CoordinateProvider,
    provider: &dyn WeatherProvider,
    storage: &dyn WeatherStorage,
) -> Result<WeatherReport, ReportError> {
    let coordinates = locate(locator).await?;
    report_weather_at(coordinates, provider, storage).await
}

/// First stage of [`report_current_weather`].
pub async fn locate(locator: &dyn CoordinateProvider) -> Result<Coordinates, ReportError> {
    let coordinates = locator.get_coordinates().await.inspect_err(|err| {
        tracing::warn!(error = %err, "failed to get coordinates");
    })?;
    tracing::info!(%coordinates, "got coordinates");
    Ok(coordinates)
}

/// Fetch, format and record the weather at already known coordinates.
pub async fn report_weather_at(
    coordinates: Coordinates,
    provider: &dyn WeatherProvider,
    storage: &dyn WeatherStorage,
) -> Result<WeatherReport, ReportError> {
    let record = provider.get_weather(coordinates).await.map_err(|source| {
        tracing::warn!(error = %source, %coordinates, "failed to get weather");
        ReportError::Weather { coordinates, source }
    })?;
    tracing::info!(location = %record.location_name, provider = %record.provider, "got weather");

    let formatted = format_weather(&record);
    save_weather(&record, storage)?;

    Ok(WeatherReport { record, formatted })
}
