//! Plain-text rendering of weather and favorites.

use chrono::{DateTime, Utc};
use std::fmt;

use weather_core::{FavoriteCity, WeatherSnapshot, format_time_until_expiry};

/// A snapshot as printed by the CLI.
pub struct SnapshotView<'a> {
    pub snapshot: &'a WeatherSnapshot,
    pub is_favorite: bool,
    pub now: DateTime<Utc>,
}

impl fmt::Display for SnapshotView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.snapshot;
        let c = &s.current;
        let star = if self.is_favorite { " ★" } else { "" };

        writeln!(f, "{}, {}{}", s.city, s.country, star)?;
        writeln!(
            f,
            "  {:.1}°C (feels like {:.1}°C), {}",
            c.temperature, c.feels_like, c.condition_description
        )?;
        writeln!(
            f,
            "  Humidity {}%  Wind {:.1} km/h  Precipitation {}%",
            c.humidity, c.wind_speed, c.precipitation_probability
        )?;

        if !s.hourly.is_empty() {
            writeln!(f, "\nNext hours:")?;
            for h in &s.hourly {
                writeln!(
                    f,
                    "  {}  {:>5.1}°C  {:<12} {:>3}%",
                    h.time.format("%H:%M"),
                    h.temperature,
                    h.condition,
                    h.precipitation_probability
                )?;
            }
        }

        if !s.daily.is_empty() {
            writeln!(f, "\nNext days:")?;
            for d in &s.daily {
                writeln!(
                    f,
                    "  {}  {:>5.1}..{:<5.1}°C  {:<12} {:>3}%",
                    d.date.format("%a %d %b"),
                    d.temp_min,
                    d.temp_max,
                    d.condition,
                    d.precipitation_probability
                )?;
            }
        }

        if s.cached {
            writeln!(
                f,
                "\nServed from cache, refreshes in {}",
                format_time_until_expiry(self.now, s.cache_expires_at)
            )?;
        }

        Ok(())
    }
}

pub fn favorite(favorite: Option<&FavoriteCity>) -> String {
    match favorite {
        Some(f) => format!(
            "Favorite city: {}, {} (saved {})",
            f.name,
            f.country,
            f.saved_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "No favorite city saved.".to_string(),
    }
}
