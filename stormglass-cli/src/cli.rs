use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use stormglass_core::{
    Config, Coordinate, DataSource, MeasurementName, ReqwestTransport, StormGlassClient, Weather,
    WeatherQuery,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "stormglass", version, about = "Storm Glass point forecast CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Storm Glass API key in the config file.
    Configure,

    /// Fetch a point forecast.
    Forecast {
        #[arg(allow_hyphen_values = true)]
        lat: f64,

        #[arg(allow_hyphen_values = true)]
        lng: f64,

        /// Comma-separated measurement tokens, e.g. "waveHeight,windSpeed".
        #[arg(long, value_delimiter = ',', required = true)]
        params: Vec<String>,

        /// RFC 3339 start of the window.
        #[arg(long)]
        start: Option<String>,

        /// RFC 3339 end of the window.
        #[arg(long)]
        end: Option<String>,

        /// Comma-separated source tokens; all sources when omitted.
        #[arg(long, value_delimiter = ',')]
        source: Vec<String>,

        /// Print the decoded forecast as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Forecast { lat, lng, params, start, end, source, json } => {
                let query = build_query(lat, lng, &params, start, end, &source)?;
                let config = Config::load_with_env()?;
                let client = StormGlassClient::from_config(&config, ReqwestTransport::new())?;

                let weather = client.fetch(&query).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&weather)?);
                } else {
                    print_weather(&weather, &query.measurements);
                }
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("Storm Glass API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(key.trim().to_string());
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_query(
    lat: f64,
    lng: f64,
    params: &[String],
    start: Option<String>,
    end: Option<String>,
    sources: &[String],
) -> Result<WeatherQuery> {
    let coordinate = Coordinate::new(lat, lng)?;

    let measurements = params
        .iter()
        .map(|p| MeasurementName::try_from(p.trim()))
        .collect::<Result<Vec<_>>>()?;

    let mut query = WeatherQuery::new(coordinate, measurements);
    if let Some(start) = start {
        query = query.with_start(parse_instant(&start)?);
    }
    if let Some(end) = end {
        query = query.with_end(parse_instant(&end)?);
    }
    if !sources.is_empty() {
        let sources = sources
            .iter()
            .map(|s| DataSource::try_from(s.trim()))
            .collect::<Result<Vec<_>>>()?;
        query = query.with_sources(sources);
    }

    Ok(query)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{raw}' is not an RFC 3339 timestamp"))
}

fn print_weather(weather: &Weather, measurements: &[MeasurementName]) {
    for period in &weather.periods {
        println!("{}", period.time.to_rfc3339());
        for measurement in measurements {
            let Some(values) = period.sources_for(*measurement) else {
                continue;
            };
            let unit = measurement.unit().map(|u| u.symbol()).unwrap_or("");
            let rendered = values
                .iter()
                .map(|(source, value)| format!("{source}={value}{unit}"))
                .collect::<Vec<_>>()
                .join("  ");
            println!("  {measurement:<24} {rendered}");
        }
    }

    let meta = &weather.metadata;
    println!(
        "\nrequests used: {}/{} (cost {})",
        meta.request_count, meta.daily_quota, meta.cost
    );
}
