//! Core library for the `citylookup` CLI.
//!
//! This crate defines:
//! - Configuration & API key handling
//! - Geocoding and weather providers behind small traits
//! - The lookup steps (validate, geocode, weather, local time) and the
//!   pipeline that chains them into a [`LookupReport`]
//!
//! It is used by `citylookup-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod resolver;

pub use config::{Config, Endpoints, SunClock};
pub use error::LookupError;
pub use lookup::{CityLookup, LookupOptions};
pub use model::{
    CityQuery, Diagnostic, GeocodeRecord, LocalTime, LookupReport, Stage, WeatherSnapshot,
};
pub use provider::{Geocoder, WeatherSource};
