use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use myweather_core::{
    Config, FetchOutcome, FileSettings, ForecastOrchestrator, LocationMode, LocationResolver,
    MemorySettings, Position, QueryState, SettingsStore, Units, WeatherClient,
    client_from_config,
    location::{AlwaysGranted, FixedLocation},
};
use tracing::{debug, warn};

use crate::platform::ConsoleSpeech;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "myweather", version, about = "Current weather and forecasts from OpenWeatherMap")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and default preferences interactively.
    Configure,

    /// Fetch and print the weather.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// City to look up instead of the saved one.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Latitude of the device position; use with --lon.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the device position; use with --lat.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    #[arg(long, conflicts_with = "imperial")]
    pub metric: bool,

    #[arg(long)]
    pub imperial: bool,

    /// Read the result aloud.
    #[arg(long)]
    pub speak: bool,

    /// Also print each forecast interval.
    #[arg(long)]
    pub forecast: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(args) => show(args).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let settings = FileSettings::open_default()?;

    let city = Text::new("Default city:").with_default(&settings.city()).prompt()?;
    settings.set_city(city.trim().to_string());

    let current = Units::from_imperial(settings.use_imperial());
    let cursor = Units::all().iter().position(|u| *u == current).unwrap_or_default();
    let units = Select::new("Units:", Units::all().to_vec()).with_starting_cursor(cursor).prompt()?;
    settings.set_use_imperial(units == Units::Imperial);

    let use_city = Confirm::new("Look weather up by city name (rather than coordinates)?")
        .with_default(settings.use_city())
        .prompt()?;
    settings.set_use_city(use_city);

    // Preferences are already on disk; position and key go on top of that snapshot.
    let mut config = settings.config();
    if !use_city {
        config.preferences.position = Some(prompt_position(config.preferences.position)?);
    }

    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }
    config.save().context("Failed to save API key")?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn prompt_position(saved: Option<Position>) -> anyhow::Result<Position> {
    let coordinate = |message: &str, saved: Option<f64>| {
        let prompt = CustomType::<f64>::new(message).with_error_message("Enter a decimal number");
        match saved {
            Some(value) => prompt.with_default(value).prompt(),
            None => prompt.prompt(),
        }
    };

    let latitude = coordinate("Latitude:", saved.map(|p| p.latitude))?;
    let longitude = coordinate("Longitude:", saved.map(|p| p.longitude))?;
    Ok(Position::new(latitude, longitude))
}

/// Build the orchestrator for one `show` run from the saved config and flags.
///
/// Flags apply to this run only, so the saved preferences are copied. Command
/// line coordinates win over the saved position; coordinate mode without any
/// position falls back to the saved city.
fn compose(
    args: &ShowArgs,
    config: &Config,
    client: Arc<dyn WeatherClient>,
) -> ForecastOrchestrator {
    let settings = Arc::new(MemorySettings::new(config.preferences.clone()));
    let flag_position = args.lat.zip(args.lon).map(|(lat, lon)| Position::new(lat, lon));
    let position = flag_position.or(config.preferences.position);
    let resolver =
        LocationResolver::new(Arc::new(AlwaysGranted), Arc::new(FixedLocation(position)));

    let mut orch = ForecastOrchestrator::new(client, settings, resolver);
    if args.speak {
        orch = orch.with_speech(Arc::new(ConsoleSpeech));
    }

    if let Some(city) = &args.city {
        orch.set_location(city.clone());
        orch.set_location_mode(LocationMode::City);
    } else if flag_position.is_some() {
        orch.set_location_mode(LocationMode::Device);
    } else if orch.location_mode() == LocationMode::Device && position.is_none() {
        warn!(
            "No saved position, using city {:?}; run `myweather configure` to set one",
            orch.location().trim()
        );
        orch.set_location_mode(LocationMode::City);
    }

    if args.metric {
        orch.set_imperial(false);
    } else if args.imperial {
        orch.set_imperial(true);
    }

    orch
}

/// Status line for a failed cycle, with the error detail when it adds anything.
fn failure_message(state: &QueryState) -> String {
    match state.last_error.as_deref().filter(|d| !d.is_empty() && *d != state.temp) {
        Some(detail) => format!("{} ({detail})", state.temp),
        None => state.temp.clone(),
    }
}

async fn show(args: ShowArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client: Arc<dyn WeatherClient> = client_from_config(&config)?.into();
    let orch = compose(&args, &config, client);

    debug!("Fetching weather in {:?} mode", orch.location_mode());
    let outcome = orch.get_weather().await;
    let state = orch.state();

    match outcome {
        FetchOutcome::Completed => {
            println!("{}", state.temp);
            println!("{}", state.condition);

            if args.forecast {
                println!();
                for entry in &state.forecast {
                    println!(
                        "{:<22} {:<20} {}",
                        entry.display_date(),
                        entry.display_temp(),
                        entry.description()
                    );
                }
            }
        }
        FetchOutcome::NoData => println!("No weather data returned for {}", orch.location().trim()),
        FetchOutcome::Failed => anyhow::bail!("{}", failure_message(&state)),
        FetchOutcome::Skipped => {}
    }

    Ok(())
}
