//! GPS coordinates from an external positioning command.
//!
//! The command (by default `whereami`) is expected to print lines such as
//! `Latitude: 55.7522` and `Longitude: 37.6156` on stdout.

use async_trait::async_trait;
use std::{fmt::Debug, process::Stdio};
use tokio::process::Command;

use crate::{error::CoordinateError, model::Coordinates};

pub const DEFAULT_LOCATE_COMMAND: &str = "whereami";

#[async_trait]
pub trait CoordinateProvider: Send + Sync + Debug {
    async fn get_coordinates(&self) -> Result<Coordinates, CoordinateError>;
}

/// Whether coordinates are generalized before they leave the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    #[default]
    Exact,
    /// Round both values to one decimal place (roughly 11 km).
    OneDecimal,
}

impl RoundingPolicy {
    pub fn apply(self, coords: Coordinates) -> Coordinates {
        match self {
            RoundingPolicy::Exact => coords,
            RoundingPolicy::OneDecimal => Coordinates::new(
                round_one_decimal(coords.latitude),
                round_one_decimal(coords.longitude),
            ),
        }
    }
}

impl From<bool> for RoundingPolicy {
    fn from(use_rounded: bool) -> Self {
        if use_rounded { RoundingPolicy::OneDecimal } else { RoundingPolicy::Exact }
    }
}

/// Rounds the exact binary value, ties to even: 0.25 -> 0.2, 0.35 (0.3499..) -> 0.3.
fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Runs a positioning command and parses its stdout.
#[derive(Debug, Clone)]
pub struct CommandCoordinateProvider {
    program: String,
    args: Vec<String>,
    rounding: RoundingPolicy,
}

impl CommandCoordinateProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, rounding: RoundingPolicy) -> Self {
        Self { program: program.into(), args, rounding }
    }

    /// Build from a full command line: first element is the program.
    pub fn from_command_line(
        command: &[String],
        rounding: RoundingPolicy,
    ) -> Result<Self, CoordinateError> {
        let (program, args) = command.split_first().ok_or(CoordinateError::EmptyCommand)?;
        Ok(Self::new(program.clone(), args.to_vec(), rounding))
    }

    async fn run(&self) -> Result<Vec<u8>, CoordinateError> {
        tracing::debug!(program = %self.program, args = ?self.args, "running positioning command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CoordinateError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(CoordinateError::ExitStatus {
                program: self.program.clone(),
                status: output.status,
            });
        }

        if !output.stderr.is_empty() {
            return Err(CoordinateError::Stderr {
                program: self.program.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl CoordinateProvider for CommandCoordinateProvider {
    async fn get_coordinates(&self) -> Result<Coordinates, CoordinateError> {
        let output = self.run().await?;
        let coords = parse_coordinates(&output)?;
        let coords = self.rounding.apply(coords);
        tracing::debug!(%coords, rounding = ?self.rounding, "got coordinates");
        Ok(coords)
    }
}

/// Parse positioning output into coordinates.
///
/// Keys are matched case-insensitively; the first token after the colon is
/// the value. Only the first `latitude` and `longitude` lines are used.
pub fn parse_coordinates(output: &[u8]) -> Result<Coordinates, CoordinateError> {
    let text = String::from_utf8(output.to_vec())?;

    Ok(Coordinates {
        latitude: parse_coord(&text, "latitude")?,
        longitude: parse_coord(&text, "longitude")?,
    })
}

fn parse_coord(text: &str, key: &'static str) -> Result<f64, CoordinateError> {
    let value = text
        .lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(k, _)| k.trim().to_lowercase() == key)
        .map(|(_, v)| v)
        .ok_or(CoordinateError::MissingKey(key))?;

    let token = value.split_whitespace().next().unwrap_or_default();

    match token.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(CoordinateError::InvalidNumber { key, value: token.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_output() {
        let coords = parse_coordinates(b"latitude: 55.7522\nlongitude: 37.6156\n").unwrap();
        assert_eq!(coords, Coordinates::new(55.7522, 37.6156));
    }

    #[test]
    fn parses_whereami_style_output() {
        let output = b"  Latitude: 55.752200\n  Longitude: -37.6\n\
                       Accuracy (m): 65.000000\nTimestamp: 2024-01-01, 12:00:00 MSK\n";
        let coords = parse_coordinates(output).unwrap();
        assert_eq!(coords, Coordinates::new(55.7522, -37.6));
    }

    #[test]
    fn parses_integers_and_extra_tokens() {
        let coords = parse_coordinates(b"LONGITUDE:   20 deg\r\nLATITUDE:10\n").unwrap();
        assert_eq!(coords, Coordinates::new(10.0, 20.0));
    }

    #[test]
    fn first_matching_line_wins() {
        let coords =
            parse_coordinates(b"latitude: 1\nlatitude: 2\nlongitude: 3\nlongitude: 4").unwrap();
        assert_eq!(coords, Coordinates::new(1.0, 3.0));
    }

    #[test]
    fn missing_key_is_error() {
        let err = parse_coordinates(b"latitude: 10.0\n").unwrap_err();
        assert!(matches!(err, CoordinateError::MissingKey("longitude")));

        let err = parse_coordinates(b"lat: 10.0\nlongitude: 1\n").unwrap_err();
        assert!(matches!(err, CoordinateError::MissingKey("latitude")));
    }

    #[test]
    fn non_numeric_value_is_error() {
        let err = parse_coordinates(b"latitude: north\nlongitude: 1\n").unwrap_err();
        assert!(matches!(
            err,
            CoordinateError::InvalidNumber { key: "latitude", ref value } if value == "north"
        ));
    }

    #[test]
    fn empty_or_non_finite_value_is_error() {
        assert!(matches!(
            parse_coordinates(b"latitude:\nlongitude: 1\n"),
            Err(CoordinateError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_coordinates(b"latitude: NaN\nlongitude: 1\n"),
            Err(CoordinateError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_coordinates(b"latitude: 1\nlongitude: inf\n"),
            Err(CoordinateError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_error() {
        let err = parse_coordinates(b"latitude: \xff\xfe\nlongitude: 1\n").unwrap_err();
        assert!(matches!(err, CoordinateError::Decode(_)));
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let coords = parse_coordinates(b"latitude: 123.4\nlongitude: -999\n").unwrap();
        assert_eq!(coords, Coordinates::new(123.4, -999.0));
    }

    #[test]
    fn rounding_policy() {
        let coords = Coordinates::new(10.567, -20.043);
        assert_eq!(RoundingPolicy::OneDecimal.apply(coords), Coordinates::new(10.6, -20.0));
        assert_eq!(RoundingPolicy::Exact.apply(coords), coords);
        assert_eq!(RoundingPolicy::from(true), RoundingPolicy::OneDecimal);
        assert_eq!(RoundingPolicy::from(false), RoundingPolicy::Exact);
    }

    #[test]
    fn rounding_uses_exact_value_and_ties_to_even() {
        let cases = [(0.25, 0.2), (0.35, 0.3), (0.15, 0.1), (-0.25, -0.2), (2.45, 2.5), (-20.05, -20.1)];
        for (input, expected) in cases {
            let rounded = RoundingPolicy::OneDecimal.apply(Coordinates::new(input, -input));
            assert_eq!(rounded, Coordinates::new(expected, -expected), "rounding {input}");
        }
    }

    #[test]
    fn empty_command_line_is_rejected() {
        let err = CommandCoordinateProvider::from_command_line(&[], RoundingPolicy::Exact)
            .unwrap_err();
        assert!(matches!(err, CoordinateError::EmptyCommand));
    }

    #[cfg(unix)]
    fn shell(script: &str, rounding: RoundingPolicy) -> CommandCoordinateProvider {
        CommandCoordinateProvider::new("sh", vec!["-c".into(), script.into()], rounding)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_is_parsed_and_rounded() {
        let provider = shell("printf 'latitude: 10.567\\nlongitude: -20.043\\n'", RoundingPolicy::OneDecimal);
        let coords = provider.get_coordinates().await.unwrap();
        assert_eq!(coords, Coordinates::new(10.6, -20.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_error() {
        let provider = shell("echo 'latitude: 1'; echo 'longitude: 2'; exit 1", RoundingPolicy::Exact);
        let err = provider.get_coordinates().await.unwrap_err();
        assert!(matches!(err, CoordinateError::ExitStatus { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stderr_output_is_error() {
        let provider = shell(
            "echo 'latitude: 1'; echo 'longitude: 2'; echo 'location services disabled' >&2",
            RoundingPolicy::Exact,
        );
        let err = provider.get_coordinates().await.unwrap_err();
        assert!(
            matches!(err, CoordinateError::Stderr { ref message, .. } if message == "location services disabled")
        );
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let provider = CommandCoordinateProvider::new(
            "locweather-no-such-positioning-tool",
            Vec::new(),
            RoundingPolicy::Exact,
        );
        let err = provider.get_coordinates().await.unwrap_err();
        assert!(matches!(err, CoordinateError::Spawn { .. }));
    }
}
