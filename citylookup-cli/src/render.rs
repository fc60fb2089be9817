//! Plain-text rendering of a lookup report.

use std::fmt;

use citylookup_core::{LookupReport, WeatherSnapshot};

/// Displays a report the way `show` prints it.
pub struct ReportView<'a>(pub &'a LookupReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        if !report.valid {
            return writeln!(f, "That doesn't seem to be a recognized city.");
        }
        writeln!(f, "'{}' is a valid city!", report.city)?;

        let Some(location) = &report.location else {
            return writeln!(f, "Coordinates not found. Please try another city.");
        };

        writeln!(f, "Map: {}", location.map_url())?;
        writeln!(f, "Latitude: {}, Longitude: {}", location.latitude, location.longitude)?;
        writeln!(f, "Country: {}", location.country)?;
        if let Some(flag) = location.flag_url() {
            writeln!(f, "Flag: {flag}")?;
        }
        if let Some(local_time) = &report.local_time {
            writeln!(f, "Local Time: {local_time}")?;
        }

        match &report.weather {
            Some(weather) => write_weather(f, weather),
            None => writeln!(f, "Weather data not available."),
        }
    }
}

fn write_weather(f: &mut fmt::Formatter<'_>, w: &WeatherSnapshot) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "Current Weather")?;
    writeln!(f, "  Temperature: {}°C (Feels like {}°C)", w.temperature_c, w.feels_like_c)?;
    writeln!(f, "  Condition:   {}", title_case(&w.description))?;
    writeln!(f, "  Humidity:    {}%", w.humidity_pct)?;
    writeln!(f, "  Wind Speed:  {} m/s", w.wind_speed_mps)?;
    writeln!(f, "  Sunrise:     {}", w.sunrise.format("%H:%M:%S"))?;
    writeln!(f, "  Sunset:      {}", w.sunset.format("%H:%M:%S"))
}

/// Upper-case the first letter of every word, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut prev_alpha = false;
    text.chars()
        .flat_map(|c| {
            let mapped: Vec<char> = if prev_alpha {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            prev_alpha = c.is_alphabetic();
            mapped
        })
        .collect()
}
