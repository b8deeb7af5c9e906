use std::{io::IsTerminal, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use skyview_core::{
    Config, Coordinates, DayBoundary, SearchSession, SnapshotSlot, WeatherError, WeatherService,
    location::FixedLocation, provider_from_config,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::Renderer;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Current weather and forecast in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home location.
    Configure,

    /// Show current conditions and the forecast once.
    Show {
        /// Latitude of the place to show.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the place to show.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Look the place up by name instead.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Split days at the location's midnight instead of this machine's.
        #[arg(long)]
        location_time: bool,
    },

    /// Interactive search with live suggestions.
    Search,
}

/// One line typed at the interactive search prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptLine {
    Input(String),
    Select(usize),
    Dismiss,
    Quit,
}

fn parse_prompt_line(line: &str) -> PromptLine {
    match line.trim() {
        ":q" => PromptLine::Quit,
        ":x" => PromptLine::Dismiss,
        cmd => match cmd.strip_prefix(':').and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => PromptLine::Select(n - 1),
            _ => PromptLine::Input(line.to_string()),
        },
    }
}

fn parse_coordinates(text: &str) -> anyhow::Result<Coordinates> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("Expected \"<lat>,<lon>\", got \"{text}\""))?;
    let lat = lat.trim().parse().with_context(|| format!("Invalid latitude: {lat}"))?;
    let lon = lon.trim().parse().with_context(|| format!("Invalid longitude: {lon}"))?;
    Ok(Coordinates::new(lat, lon))
}

/// Turn a refresh error into the message the user sees, keeping the cause in the log.
fn surface(err: WeatherError) -> anyhow::Error {
    tracing::error!(error = %err, category = ?err.category(), "weather refresh failed");
    anyhow!(err.user_message())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, city, location_time } => {
                let mut config = Config::load()?;
                if location_time {
                    config.day_boundary = DayBoundary::Location;
                }
                let from_args = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(&config, from_args, city).await
            }
            Command::Search => search(&Config::load()?).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;
    config.api_key = Some(api_key.trim().to_string());

    let home = Text::new("Home location as <lat>,<lon> (leave empty to skip):")
        .prompt()
        .context("Home location prompt aborted")?;
    if !home.trim().is_empty() {
        config.home = Some(parse_coordinates(&home)?);
    }

    let boundary = Select::new(
        "Where should forecast days start?",
        vec!["At local midnight on this machine", "At midnight in the shown location"],
    )
    .prompt()
    .context("Day boundary prompt aborted")?;
    config.day_boundary = if boundary.contains("this machine") {
        DayBoundary::Local
    } else {
        DayBoundary::Location
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    config: &Config,
    from_args: Option<Coordinates>,
    city: Option<String>,
) -> anyhow::Result<()> {
    let service = WeatherService::from_config(provider_from_config(config)?, config);
    let renderer = Renderer::new(config, std::io::stdout().is_terminal());

    let snapshot = match city {
        Some(city) => {
            let (place, snapshot) = service.snapshot_for_place(&city).await.map_err(surface)?;
            tracing::info!(place = %place.display_name(), "resolved city");
            snapshot
        }
        None => {
            let source = FixedLocation(from_args.or(config.home));
            service.snapshot_for_location(&source).await.map_err(surface)?
        }
    };

    renderer.snapshot(&mut std::io::stdout().lock(), &snapshot);
    Ok(())
}

async fn search(config: &Config) -> anyhow::Result<()> {
    let service = WeatherService::from_config(provider_from_config(config)?, config);
    let renderer = Renderer::new(config, std::io::stdout().is_terminal());
    let slot = Arc::new(SnapshotSlot::new());

    let (session, mut selections) = SearchSession::spawn(service.provider(), &config.search);
    let mut suggestions = session.subscribe();
    let mut shown = slot.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a place name. :N picks suggestion N, :x clears the list, :q quits.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else { break };
                match parse_prompt_line(&line) {
                    PromptLine::Quit => break,
                    PromptLine::Dismiss => session.dismiss(),
                    PromptLine::Select(index) => session.select(index),
                    PromptLine::Input(text) => session.input(text),
                }
            }
            changed = suggestions.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = suggestions.borrow_and_update().clone();
                renderer.search_state(&mut std::io::stdout().lock(), &state);
            }
            Some(selection) = selections.recv() => {
                println!("Loading weather for {}...", selection.display_name);
                let generation = slot.begin();
                let service = service.clone();
                let slot = Arc::clone(&slot);
                let renderer = renderer.clone();
                tokio::spawn(async move {
                    let at = selection.coordinates();
                    if let Some(err) = service.refresh_into(&slot, generation, at).await {
                        tracing::error!(error = %err, "weather refresh failed");
                        renderer.error(&mut std::io::stdout().lock(), &err);
                    }
                });
            }
            Ok(()) = shown.changed() => {
                let snapshot = shown.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    renderer.snapshot(&mut std::io::stdout().lock(), &snapshot);
                }
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_commands_are_recognised() {
        assert_eq!(parse_prompt_line(":q"), PromptLine::Quit);
        assert_eq!(parse_prompt_line(" :x "), PromptLine::Dismiss);
        assert_eq!(parse_prompt_line(":2"), PromptLine::Select(1));
    }

    #[test]
    fn anything_else_is_field_input() {
        assert_eq!(parse_prompt_line("Lon"), PromptLine::Input("Lon".into()));
        assert_eq!(parse_prompt_line(":0"), PromptLine::Input(":0".into()));
        assert_eq!(parse_prompt_line(":abc"), PromptLine::Input(":abc".into()));
        assert_eq!(parse_prompt_line(""), PromptLine::Input(String::new()));
    }

    #[test]
    fn coordinates_parse_from_pair() {
        assert_eq!(parse_coordinates("51.5, -0.12").unwrap(), Coordinates::new(51.5, -0.12));
        assert!(parse_coordinates("51.5").is_err());
        assert!(parse_coordinates("north,west").is_err());
    }

    #[test]
    fn cli_parses_show_arguments() {
        let cli = Cli::try_parse_from(["skyview", "show", "--lat", "-33.9", "--lon", "18.4"])
            .expect("valid arguments");
        match cli.command {
            Command::Show { lat, lon, city, location_time } => {
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lon, Some(18.4));
                assert!(city.is_none());
                assert!(!location_time);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_city_with_coordinates() {
        let err = Cli::try_parse_from(["skyview", "show", "--city", "Oslo", "--lat", "1", "--lon", "2"]);
        assert!(err.is_err());
    }

    #[test]
    fn surfaced_errors_use_user_message() {
        let err = surface(WeatherError::PlaceNotFound("Atlantis".into()));
        assert_eq!(err.to_string(), "City not found");
    }
}
