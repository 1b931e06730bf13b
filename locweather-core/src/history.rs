//! Append-only weather history.
//!
//! Both backends assume a single writer: nothing locks the file between the
//! read and the rewrite of [`JsonFileWeatherStorage`].

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

use crate::{
    error::StorageError,
    format::format_weather_line,
    model::{HistoryEntry, WeatherRecord},
};

pub trait WeatherStorage: Send + Sync + fmt::Debug {
    fn append(&self, entry: &HistoryEntry) -> Result<(), StorageError>;
}

/// Stamp `record` with the current time and append it to `storage`.
pub fn save_weather(record: &WeatherRecord, storage: &dyn WeatherStorage) -> Result<(), StorageError> {
    let entry = HistoryEntry::now(record.clone());
    storage.append(&entry)?;
    tracing::info!(?storage, captured_at = %entry.captured_at, "saved weather to history");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFormat {
    #[default]
    Json,
    Plain,
}

impl HistoryFormat {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            HistoryFormat::Json => "history.json",
            HistoryFormat::Plain => "history.txt",
        }
    }

    pub fn storage(&self, path: PathBuf) -> Box<dyn WeatherStorage> {
        match self {
            HistoryFormat::Json => Box::new(JsonFileWeatherStorage::new(path)),
            HistoryFormat::Plain => Box::new(PlainFileWeatherStorage::new(path)),
        }
    }
}

impl fmt::Display for HistoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryFormat::Json => f.write_str("json"),
            HistoryFormat::Plain => f.write_str("plain"),
        }
    }
}

/// One tab-separated line per entry: timestamp, coordinates, weather.
#[derive(Debug, Clone)]
pub struct PlainFileWeatherStorage {
    path: PathBuf,
}

impl PlainFileWeatherStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WeatherStorage for PlainFileWeatherStorage {
    fn append(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let line = format!(
            "{}\t{}\t{}\n",
            entry.captured_at.to_rfc3339(),
            entry.weather.coordinates,
            format_weather_line(&entry.weather),
        );

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|source| io_error(&self.path, source))
    }
}

/// JSON array of [`HistoryEntry`], rewritten in full on every append.
#[derive(Debug, Clone)]
pub struct JsonFileWeatherStorage {
    path: PathBuf,
}

impl JsonFileWeatherStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All stored entries in insertion order. A missing file is empty history.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&self.path, source)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })
    }

    /// Writes a sibling temp file and renames it over the history file.
    fn replace_contents(&self, contents: &[u8]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| io_error(&self.path, source))?;
        tmp.write_all(contents).map_err(|source| io_error(&self.path, source))?;
        tmp.persist(&self.path).map_err(|err| io_error(&self.path, err.error))?;
        Ok(())
    }
}

impl WeatherStorage for JsonFileWeatherStorage {
    fn append(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let mut entries = self.entries()?;
        entries.push(entry.clone());

        let json = serde_json::to_string_pretty(&entries).map_err(StorageError::Serialize)?;
        self.replace_contents(json.as_bytes())
    }
}

fn io_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Io { path: path.to_path_buf(), source }
}
