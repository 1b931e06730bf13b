use std::{io, path::PathBuf, process::ExitStatus, string::FromUtf8Error};

use crate::model::Coordinates;

/// Failure to obtain coordinates from the positioning command.
#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("positioning command is empty")]
    EmptyCommand,

    #[error("failed to run positioning command `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("positioning command `{program}` exited with {status}")]
    ExitStatus { program: String, status: ExitStatus },

    #[error("positioning command `{program}` reported an error: {message}")]
    Stderr { program: String, message: String },

    #[error("positioning output is not valid UTF-8")]
    Decode(#[from] FromUtf8Error),

    #[error("positioning output has no `{0}` line")]
    MissingKey(&'static str),

    #[error("invalid {key} value {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Failure to get a usable answer from the weather service.
#[derive(Debug, thiserror::Error)]
pub enum WeatherServiceError {
    #[error("request to {provider} failed")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {provider} response")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected {provider} response: {message}")]
    UnexpectedResponse { provider: &'static str, message: String },
}

/// Failure to persist weather history.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("history file {} is not accessible", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("history file {} does not contain a valid entry list", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize weather history")]
    Serialize(#[source] serde_json::Error),
}

/// Failure of one stage of [`crate::report_current_weather`].
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not get GPS coordinates")]
    Coordinates(#[from] CoordinateError),

    #[error("could not get weather for coordinates {coordinates}")]
    Weather {
        coordinates: Coordinates,
        #[source]
        source: WeatherServiceError,
    },

    #[error("could not save weather history")]
    Storage(#[from] StorageError),
}
