use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use std::sync::Arc;

use weather_core::{Config, Coordinates, Startup, WeatherApp, WeatherSnapshot};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Weather backend URL, overriding the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Without a command, shows the favorite city.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// Show weather for a city or a coordinate pair.
    Show {
        /// City name, e.g. "Paris".
        #[arg(conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show weather for the current position.
    Here,

    /// Search for a city by name and pick one of the suggestions.
    Search {
        /// Search text; prompted for when absent.
        query: Option<String>,
    },

    /// Manage the favorite city.
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoriteAction {
    /// Print the saved favorite.
    Show,
    /// Save a city as the favorite, replacing any previous one.
    Set { city: String, country: String },
    /// Forget the favorite.
    Clear,
    /// Load a city and flip its favorite status.
    Toggle { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(url) = self.api_url {
            config.api_url = url;
            config.validate()?;
        }

        tracing::debug!("Using weather backend at {}", config.api_url);
        let app = WeatherApp::from_config(&config)?;

        match self.command {
            None => startup(&app).await,
            Some(Command::Show { city, lat, lon }) => {
                let weather = match (city, lat, lon) {
                    (Some(city), _, _) => app.coordinator().get_by_city(&city).await,
                    (None, Some(lat), Some(lon)) => {
                        app.coordinator().get_by_coordinates(lat, lon).await
                    }
                    _ => bail!("Give a city name or both --lat and --lon"),
                };
                print_weather(&app, weather)
            }
            Some(Command::Here) => print_weather(&app, app.locate().await),
            Some(Command::Search { query }) => search(&app, query).await,
            Some(Command::Favorite { action }) => favorite(&app, action).await,
            Some(Command::Configure) => configure(config),
        }
    }
}

async fn startup(app: &WeatherApp) -> anyhow::Result<()> {
    match app.start().await {
        Startup::Favorite { weather, .. } => print_weather(app, weather),
        Startup::NoFavorite => {
            println!("No favorite city saved.");
            println!("Hint: run `weather search` and then `weather favorite toggle <city>`.");
            Ok(())
        }
    }
}

/// Print the snapshot a lookup returned, or fail with its message.
fn print_weather<E>(app: &WeatherApp, weather: Result<Arc<WeatherSnapshot>, E>) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let snapshot = weather?;
    let view = render::SnapshotView {
        snapshot: &snapshot,
        is_favorite: app.favorites().is_favorite(&snapshot.city),
        now: Utc::now(),
    };
    print!("{view}");
    Ok(())
}

async fn search(app: &WeatherApp, query: Option<String>) -> anyhow::Result<()> {
    let query = match query {
        Some(q) => q,
        None => Text::new("City:").prompt().context("Failed to read search text")?,
    };

    // Replay the text as keystrokes; the debounce collapses them.
    let search = app.search();
    for end in query.char_indices().map(|(i, c)| i + c.len_utf8()) {
        search.on_input(&query[..end]);
    }
    let view = search.settled().await;

    if view.candidates.is_empty() {
        println!("No cities match '{query}'.");
        return Ok(());
    }

    let picked = Select::new("Pick a city:", view.candidates)
        .prompt()
        .context("No city selected")?;

    print_weather(app, app.select(&picked).await)
}

async fn favorite(app: &WeatherApp, action: FavoriteAction) -> anyhow::Result<()> {
    let favorites = app.favorites();

    match action {
        FavoriteAction::Show => println!("{}", render::favorite(favorites.get().as_ref())),
        FavoriteAction::Set { city, country } => {
            let saved = favorites.save(&city, &country)?;
            println!("{}", render::favorite(Some(&saved)));
        }
        FavoriteAction::Clear => {
            favorites.remove()?;
            println!("Favorite city cleared.");
        }
        FavoriteAction::Toggle { city } => {
            print_weather(app, app.coordinator().get_by_city(&city).await)?;

            match app.toggle_favorite()? {
                Some(true) => println!("\nSaved as favorite."),
                Some(false) => println!("\nRemoved from favorites."),
                None => {}
            }
        }
    }

    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_url = Text::new("Weather backend URL:")
        .with_default(&config.api_url)
        .prompt()?;
    config.api_url = api_url;

    config.search.debounce_ms = CustomType::<u64>::new("Search debounce (ms):")
        .with_default(config.search.debounce_ms)
        .prompt()?;

    config.search.limit = CustomType::<usize>::new("Suggestions per search:")
        .with_default(config.search.limit)
        .prompt()?;

    config.geolocation.timeout_ms = CustomType::<u64>::new("Geolocation timeout (ms):")
        .with_default(config.geolocation.timeout_ms)
        .prompt()?;

    let has_home = Confirm::new("Set a home position for `weather here`?")
        .with_default(config.home_position().is_some())
        .prompt()?;

    let home = if has_home {
        let current = config.home_position();
        let mut lat = CustomType::<f64>::new("Latitude:");
        let mut lon = CustomType::<f64>::new("Longitude:");
        if let Some(c) = current {
            lat = lat.with_default(c.latitude);
            lon = lon.with_default(c.longitude);
        }
        Some(Coordinates::new(lat.prompt()?, lon.prompt()?))
    } else {
        None
    };
    config.set_home_position(home);

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{GeolocationError, HttpWeatherProvider, LocateError, storage::MemoryStore};

    fn offline_app() -> WeatherApp {
        let provider = HttpWeatherProvider::new("http://127.0.0.1:9/api").unwrap();
        WeatherApp::new(
            Arc::new(provider),
            Arc::new(MemoryStore::new()),
            None,
            &Config::default(),
        )
    }

    #[test]
    fn failed_lookup_is_reported_with_its_message() {
        let app = offline_app();
        let err = print_weather(
            &app,
            Err::<Arc<WeatherSnapshot>, _>(LocateError::from(GeolocationError::Timeout)),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Geolocation request timeout");
    }

    #[tokio::test]
    async fn here_without_position_fails_instead_of_printing() {
        let app = offline_app();

        let err = print_weather(&app, app.locate().await).unwrap_err();

        assert_eq!(err.to_string(), "Geolocation not supported");
    }

    #[test]
    fn no_subcommand_means_startup() {
        let cli = Cli::try_parse_from(["weather"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weather", "show", "--lat", "51.5", "--lon", "-0.12"]).unwrap();
        match cli.command {
            Some(Command::Show { city, lat, lon }) => {
                assert!(city.is_none());
                assert_eq!(lat, Some(51.5));
                assert_eq!(lon, Some(-0.12));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_rejects_city_with_coordinates() {
        assert!(Cli::try_parse_from(["weather", "show", "Paris", "--lat", "1", "--lon", "2"]).is_err());
        assert!(Cli::try_parse_from(["weather", "show", "--lat", "1"]).is_err());
    }

    #[test]
    fn global_api_url_after_subcommand() {
        let cli = Cli::try_parse_from(["weather", "search", "Par", "--api-url", "http://x/api"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
    }

    #[test]
    fn favorite_set_takes_city_and_country() {
        let cli = Cli::try_parse_from(["weather", "favorite", "set", "Paris", "FR"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Favorite { action: FavoriteAction::Set { ref city, ref country } })
                if city == "Paris" && country == "FR"
        ));
    }
}
