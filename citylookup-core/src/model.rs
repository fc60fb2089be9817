use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};

use crate::error::LookupError;

pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MAP_ZOOM: u8 = 10;

/// A trimmed, non-empty city name typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    pub fn new(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinates and country metadata of the first geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    /// ISO 3166-1 alpha-2, upper-cased. Empty when the geocoder had none.
    pub country_code: String,
}

impl GeocodeRecord {
    pub fn flag_url(&self) -> Option<String> {
        if self.country_code.is_empty() {
            return None;
        }
        Some(format!("https://flagsapi.com/{}/flat/64.png", self.country_code))
    }

    pub fn map_url(&self) -> String {
        let (lat, lon) = (self.latitude, self.longitude);
        format!("https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map={MAP_ZOOM}/{lat}/{lon}")
    }
}

/// Current conditions in metric units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Wall-clock time at the looked-up city, or why it could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalTime {
    At(NaiveDateTime),
    LocationNotFound,
    Unavailable,
    FetchFailed,
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalTime::At(ts) => write!(f, "{}", ts.format(LOCAL_TIME_FORMAT)),
            LocalTime::LocationNotFound => f.write_str("Location not found"),
            LocalTime::Unavailable => f.write_str("Time data unavailable"),
            LocalTime::FetchFailed => f.write_str("Error fetching time"),
        }
    }
}

impl Serialize for LocalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Geocoding,
    Weather,
    LocalTime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Validation => "validation",
            Stage::Geocoding => "geocoding",
            Stage::Weather => "weather",
            Stage::LocalTime => "local time",
        })
    }
}

/// A failure swallowed by the pipeline, kept for whoever wants to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
}

/// Everything one lookup produced. Absent fields mean the step failed or
/// was never reached.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub city: String,
    pub valid: bool,
    pub location: Option<GeocodeRecord>,
    pub weather: Option<WeatherSnapshot>,
    pub local_time: Option<LocalTime>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LookupReport {
    pub(crate) fn new(city: &CityQuery) -> Self {
        Self {
            city: city.to_string(),
            valid: false,
            location: None,
            weather: None,
            local_time: None,
            diagnostics: Vec::new(),
        }
    }
}
