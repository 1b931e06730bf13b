//! Human-readable rendering of [`WeatherRecord`]s.

use crate::model::WeatherRecord;

/// Multi-line report for the console.
pub fn format_weather(record: &WeatherRecord) -> String {
    let mut output = format_weather_line(record);
    output.push_str(&format!("\nCoordinates: {}", record.coordinates));

    if let Some(sunrise) = record.sunrise {
        output.push_str(&format!("\nSunrise: {}", sunrise.format("%H:%M")));
    }
    if let Some(sunset) = record.sunset {
        output.push_str(&format!("\nSunset: {}", sunset.format("%H:%M")));
    }
    output
}

/// Single-line summary, e.g. `Moscow: -3°C, Snow (light snow)`.
pub fn format_weather_line(record: &WeatherRecord) -> String {
    let mut line = format!(
        "{}: {}\u{00b0}C, {}",
        record.location_name,
        display_temperature(record.temperature_c),
        record.weather_type,
    );
    if !record.condition.eq_ignore_ascii_case(record.weather_type.as_str()) {
        line.push_str(&format!(" ({})", record.condition));
    }
    line
}

fn display_temperature(celsius: f64) -> String {
    // + 0.0 turns -0.0 into 0.0
    format!("{:.0}", celsius.round() + 0.0)
}
