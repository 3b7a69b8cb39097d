use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, InquireError, Select, Text, validator::Validation};
use skycast_core::{
    ChatAssistant, Config, Coordinates, FileStorage, FixedGeolocator, Forecast, GeocodedLocation, Geolocator,
    LocationProvider, NoGeolocator, QueryOptions, SearchController, SearchHistory, SearchHistoryItem, Storage,
    UnitStore, WeatherQueries,
    clock::CityClock,
    provider::client_from_config,
};
use std::{fmt, io::Write, sync::Arc, time::Duration};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the proxy address and an optional home position.
    Configure,

    /// Show the dashboard for the last searched city or the detected location.
    Show {
        #[command(flatten)]
        at: LocationArgs,

        /// Keep the city clock running and refresh the data when it goes stale.
        #[arg(long)]
        watch: bool,
    },

    /// Search for a city, pick one and show its dashboard.
    Search {
        /// Text to search for; prompts when absent.
        text: Option<String>,
    },

    /// Inspect or edit the search history.
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show or toggle the temperature unit.
    Units {
        #[arg(long)]
        toggle: bool,
    },

    /// Ask the weather assistant about the conditions where `show` points.
    Chat {
        #[command(flatten)]
        at: LocationArgs,
    },
}

/// Coordinates that override the last searched city and the detected location.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct LocationArgs {
    /// Latitude to use instead.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon))
    }
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List,
    /// Remove one entry by id.
    Remove { id: String },
    Clear,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { at, watch } => {
                let config = Config::load()?;
                let location = resolve_location(&config, &at).await?;
                let queries = WeatherQueries::new(client_from_config(&config)?);
                show(&queries, location.active(), watch).await
            }
            Command::Search { text } => search(text).await,
            Command::History { action } => history(action.unwrap_or(HistoryAction::List)),
            Command::Units { toggle } => units(toggle),
            Command::Chat { at } => chat(&at).await,
        }
    }
}

fn local_storage() -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::new(Config::data_dir()?)))
}

fn geolocator(config: &Config) -> Box<dyn Geolocator> {
    match config.home {
        Some(home) => Box::new(FixedGeolocator(home)),
        None => Box::new(NoGeolocator),
    }
}

/// Explicit coordinates win, then the most recent search.
fn preferred_location(at: &LocationArgs, history: &SearchHistory) -> Option<Coordinates> {
    at.coordinates()
        .or_else(|| history.items().first().map(SearchHistoryItem::coordinates))
}

/// Where `show` and `chat` point: explicit coordinates, the last searched
/// city, then the geolocator.
async fn resolve_location(config: &Config, at: &LocationArgs) -> Result<LocationProvider> {
    let location = LocationProvider::default();
    let history = SearchHistory::load(local_storage()?);

    match preferred_location(at, &history) {
        Some(coords) => location.set_active(coords),
        None => {
            tracing::debug!("no coordinates or recent search, asking the geolocator");
            location.locate(geolocator(config).as_ref()).await;
        }
    }
    Ok(location)
}

/// The forecast's UTC offset when it differs from the one the clock runs on.
fn changed_offset(current: i32, forecast: Option<&Forecast>) -> Option<i32> {
    forecast?.timezone.filter(|&tz| tz != current)
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let url = Text::new("Proxy URL:")
        .with_default(config.proxy_url.as_deref().unwrap_or("http://127.0.0.1:3000"))
        .with_help_message("Address of a running skycast-proxy")
        .prompt()
        .context("Failed to read proxy URL")?;
    config.set_proxy_url(url);

    let set_home = Confirm::new("Use a fixed home position as your location?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if set_home {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_validator(|v: &f64| {
                Ok(if (-90.0..=90.0).contains(v) {
                    Validation::Valid
                } else {
                    Validation::Invalid("Latitude must be between -90 and 90".into())
                })
            })
            .prompt()
            .context("Failed to read latitude")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_validator(|v: &f64| {
                Ok(if (-180.0..=180.0).contains(v) {
                    Validation::Valid
                } else {
                    Validation::Invalid("Longitude must be between -180 and 180".into())
                })
            })
            .prompt()
            .context("Failed to read longitude")?;
        config.set_home(Some(Coordinates::new(lat, lon)));
    } else {
        config.set_home(None);
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(queries: &WeatherQueries, at: Coordinates, watch: bool) -> Result<()> {
    let units = UnitStore::load(local_storage()?);
    let data = queries.dashboard(at).await;

    if !watch {
        render::dashboard(&data, units.unit(), Utc::now().date_naive(), None);
        return Ok(());
    }

    let mut tz = data.forecast.data().and_then(|f| f.timezone).unwrap_or_default();
    let mut clock = CityClock::start(tz);
    let mut ticks = clock.subscribe();
    let mut refresh = tokio::time::interval(QueryOptions::WEATHER.stale_time);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let data = queries.dashboard(at).await;
                if let Some(next) = changed_offset(tz, data.forecast.data()) {
                    tracing::debug!(from = tz, to = next, "restarting city clock");
                    tz = next;
                    clock = CityClock::start(tz);
                    ticks = clock.subscribe();
                }
                println!();
                render::dashboard(&data, units.unit(), Utc::now().date_naive(), Some(&clock.now()));
            }
            changed = ticks.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let now = ticks.borrow_and_update().clone();
                print!("\r{}", render::clock_line(&now));
                std::io::stdout().flush().ok();
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

/// A row in the search picker.
enum Pick {
    Place(GeocodedLocation),
    Recent(SearchHistoryItem),
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pick::Place(p) => f.write_str(&p.label()),
            Pick::Recent(item) => write!(f, "{} (recent)", item.label()),
        }
    }
}

async fn search(text: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let queries = Arc::new(WeatherQueries::new(client_from_config(&config)?));
    let location = LocationProvider::default();
    let history = SearchHistory::load(local_storage()?);
    let mut controller = SearchController::new(queries.clone(), location.clone(), history);

    let text = match text {
        Some(text) => text,
        None => match Text::new("Search cities:")
            .with_help_message("Leave blank for recent and popular cities")
            .prompt()
        {
            Ok(text) => text,
            Err(e) if is_cancel(&e) => {
                tracing::debug!("search prompt cancelled");
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to read search text"),
        },
    };

    controller.handle_input(text.clone());
    while controller.is_loading().await {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let mut options: Vec<Pick> = Vec::new();
    if text.trim().is_empty() {
        options.extend(controller.history().items().iter().cloned().map(Pick::Recent));
    }
    options.extend(controller.suggestions().await.into_iter().map(Pick::Place));

    if options.is_empty() {
        println!("No cities found for \"{text}\".");
        return Ok(());
    }

    let picked = match Select::new("Pick a city:", options).prompt() {
        Ok(picked) => picked,
        Err(e) if is_cancel(&e) => {
            tracing::debug!("city picker cancelled");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read selection"),
    };

    match &picked {
        Pick::Place(place) => controller.select_city(place)?,
        Pick::Recent(item) => controller.select_history(item)?,
    }

    show(&queries, location.active(), false).await
}

fn history(action: HistoryAction) -> Result<()> {
    let mut history = SearchHistory::load(local_storage()?);

    match action {
        HistoryAction::List => {
            if history.items().is_empty() {
                println!("No recent searches.");
            }
            for item in history.items() {
                render::history_item(item);
            }
        }
        HistoryAction::Remove { id } => {
            if history.remove(&id)? {
                println!("Removed {id}.");
            } else {
                println!("No history entry with id {id}.");
            }
        }
        HistoryAction::Clear => {
            let sure = Confirm::new("Clear all recent searches?")
                .with_default(false)
                .prompt()
                .context("Failed to read answer")?;
            if sure {
                history.clear()?;
                println!("History cleared.");
            }
        }
    }

    Ok(())
}

fn units(toggle: bool) -> Result<()> {
    let mut store = UnitStore::load(local_storage()?);

    if toggle {
        store.toggle()?;
    }
    println!("Units: {} ({}, {})", store.unit(), store.unit().temperature_symbol(), store.unit().speed_symbol());
    Ok(())
}

async fn chat(at: &LocationArgs) -> Result<()> {
    let config = Config::load()?;
    let client = client_from_config(&config)?;
    let queries = WeatherQueries::new(client.clone());
    let location = resolve_location(&config, at).await?;
    tracing::info!(at = %location.active(), "chat location");

    let mut assistant = ChatAssistant::load(client, local_storage()?);
    for message in assistant.messages() {
        render::chat_message(message);
    }
    println!("Weather Assistant. Commands: /new, /retry, /quit");

    loop {
        let prefill = assistant.input().to_string();
        let line = match Text::new("You:").with_initial_value(&prefill).prompt() {
            Ok(line) => line,
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e).context("Failed to read message"),
        };

        match line.trim() {
            "/quit" => break,
            "/new" => {
                assistant.new_chat()?;
                println!("Started a new chat.");
                continue;
            }
            "/retry" => {
                if !assistant.retry() {
                    println!("Nothing to retry yet.");
                }
                continue;
            }
            _ => {}
        }

        let forecast = queries.forecast(location.active()).await;
        if forecast.is_error() {
            tracing::warn!("sending without weather context: forecast unavailable");
        }
        assistant.set_input(line);
        println!("Thinking...");
        match assistant.send(forecast.data()).await {
            Ok(reply) => render::chat_message(reply),
            Err(rejected) => eprintln!("{rejected}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use skycast_core::{MemoryStorage, history::NewSearch};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_negative_longitude() {
        let cli = Cli::try_parse_from(["skycast", "show", "--lat", "40.7128", "--lon", "-74.006"]).unwrap();

        match cli.command {
            Command::Show { at, watch } => {
                assert_eq!(at.lat, Some(40.7128));
                assert_eq!(at.lon, Some(-74.006));
                assert!(!watch);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_needs_both_coordinates() {
        assert!(Cli::try_parse_from(["skycast", "show", "--lat", "1"]).is_err());
    }

    #[test]
    fn chat_accepts_coordinates() {
        let cli = Cli::try_parse_from(["skycast", "chat", "--lat", "48.8566", "--lon", "2.3522"]).unwrap();

        match cli.command {
            Command::Chat { at } => assert_eq!(at.coordinates(), Some(Coordinates::new(48.8566, 2.3522))),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["skycast", "chat", "--lon", "2"]).is_err());
    }

    fn history_with_paris() -> SearchHistory {
        let mut history = SearchHistory::load(Arc::new(MemoryStorage::new()));
        history
            .add(NewSearch {
                query: "par".into(),
                lat: 48.8566,
                lon: 2.3522,
                name: "Paris".into(),
                country: "FR".into(),
                state: None,
            })
            .unwrap();
        history
    }

    #[test]
    fn last_search_is_used_without_coordinates() {
        let history = history_with_paris();

        assert_eq!(
            preferred_location(&LocationArgs::default(), &history),
            Some(Coordinates::new(48.8566, 2.3522))
        );
    }

    #[test]
    fn explicit_coordinates_beat_last_search() {
        let history = history_with_paris();
        let at = LocationArgs { lat: Some(35.6762), lon: Some(139.6503) };

        assert_eq!(preferred_location(&at, &history), Some(Coordinates::new(35.6762, 139.6503)));
    }

    #[test]
    fn empty_history_defers_to_geolocator() {
        let history = SearchHistory::load(Arc::new(MemoryStorage::new()));
        assert_eq!(preferred_location(&LocationArgs::default(), &history), None);
    }

    #[test]
    fn clock_restarts_only_on_new_offset() {
        let paris = Forecast { timezone: Some(3600), ..Forecast::default() };

        assert_eq!(changed_offset(0, Some(&paris)), Some(3600));
        assert_eq!(changed_offset(3600, Some(&paris)), None);
        assert_eq!(changed_offset(3600, Some(&Forecast::default())), None);
        assert_eq!(changed_offset(3600, None), None);
    }

    #[test]
    fn history_remove_takes_id() {
        let cli = Cli::try_parse_from(["skycast", "history", "remove", "1.5-2.5-1700000000000"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History { action: Some(HistoryAction::Remove { ref id }) } if id == "1.5-2.5-1700000000000"
        ));
    }
}
