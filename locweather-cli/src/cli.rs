use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select};
use locweather_core::{
    Config, HistoryFormat, ProviderId, ReportError, locate, provider::default_provider_from_config,
    report_weather_at,
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "locweather", version, about = "Current weather at your GPS location")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials and options for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show weather at the current location and record it (the default).
    Show,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command.unwrap_or(Command::Show) {
            Command::Configure { provider } => {
                configure(&config_path, &provider)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show => show(&config_path).await,
        }
    }
}

async fn show(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::load_from(config_path)?;
    let locator = config.coordinate_provider()?;

    // locate before a configured provider is required
    let coordinates = match locate(&locator).await {
        Ok(coordinates) => coordinates,
        Err(err) => return report_failure(err),
    };

    let provider = default_provider_from_config(&config)?;
    let storage = config.history_storage()?;

    match report_weather_at(coordinates, &*provider, &*storage).await {
        Ok(report) => {
            println!("{}", report.formatted);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure(err),
    }
}

fn report_failure(err: ReportError) -> anyhow::Result<ExitCode> {
    match err {
        ReportError::Coordinates(err) => {
            tracing::debug!(error = ?err, "coordinate acquisition failed");
            println!("Could not get GPS coordinates");
            Ok(ExitCode::FAILURE)
        }
        ReportError::Weather { coordinates, source } => {
            tracing::debug!(error = ?source, "weather request failed");
            println!("Could not get weather for coordinates {coordinates}");
            Ok(ExitCode::FAILURE)
        }
        // storage errors propagate
        err @ ReportError::Storage(_) => Err(err.into()),
    }
}

fn configure(config_path: &Path, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load_from(config_path)?;

    if config.is_provider_configured(id) {
        println!("An API key for {id} is already configured; it will be replaced.");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if config.default_provider_id().ok() != Some(id)
        && Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()?
    {
        config.set_default_provider(id);
    }

    config.gps.use_rounded_coords =
        Confirm::new("Round coordinates to one decimal place (about 11 km)?")
            .with_default(config.gps.use_rounded_coords)
            .prompt()?;

    let formats = vec![HistoryFormat::Json, HistoryFormat::Plain];
    let current = formats.iter().position(|f| *f == config.history.format).unwrap_or(0);
    config.history.format =
        Select::new("History format:", formats).with_starting_cursor(current).prompt()?;

    config.save_to(config_path)?;
    println!("Saved configuration to {}", config_path.display());

    Ok(())
}
