//! In-memory providers for unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::LookupError;

use super::{CurrentConditions, Geocoder, Place, PlaceAddress, TimezoneReading, WeatherSource};

pub fn place(lat: f64, lon: f64, country: Option<(&str, &str)>) -> Place {
    Place {
        lat,
        lon,
        address: country.map(|(name, code)| PlaceAddress {
            country: Some(name.to_string()),
            country_code: Some(code.to_string()),
        }),
    }
}

/// Answers every search with the same hits, or fails when built with `failing`.
#[derive(Debug, Default)]
pub struct StubGeocoder {
    places: Option<Vec<Place>>,
    fail_with_address: bool,
    calls: Arc<AtomicUsize>,
}

impl StubGeocoder {
    pub fn with_places(places: Vec<Place>) -> Self {
        Self { places: Some(places), ..Self::default() }
    }

    /// Plain searches find `places`; searches with address details fail.
    pub fn failing_details(places: Vec<Place>) -> Self {
        Self { places: Some(places), fail_with_address: true, ..Self::default() }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn search(&self, _city: &str, with_address: bool) -> Result<Vec<Place>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if with_address && self.fail_with_address {
            return Err(LookupError::Parse("stub address details failure".to_string()));
        }
        self.places
            .clone()
            .ok_or_else(|| LookupError::Parse("stub geocoder failure".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct StubWeather {
    current: Option<CurrentConditions>,
    reading: Option<TimezoneReading>,
    current_calls: Arc<AtomicUsize>,
    timezone_calls: Arc<AtomicUsize>,
    last_coordinates: Arc<Mutex<Option<(f64, f64)>>>,
}

impl StubWeather {
    /// `None` makes the matching call fail.
    pub fn new(current: Option<CurrentConditions>, reading: Option<TimezoneReading>) -> Self {
        Self { current, reading, ..Self::default() }
    }

    pub fn current_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.current_calls)
    }

    pub fn timezone_calls(&self) -> usize {
        self.timezone_calls.load(Ordering::SeqCst)
    }

    pub fn last_coordinates(&self) -> Option<(f64, f64)> {
        *self.last_coordinates.lock().unwrap()
    }
}

#[async_trait]
impl WeatherSource for StubWeather {
    async fn current(&self, _city: &str) -> Result<CurrentConditions, LookupError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.current
            .clone()
            .ok_or_else(|| LookupError::UpstreamRejected("cod \"404\"".to_string()))
    }

    async fn timezone(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<TimezoneReading, LookupError> {
        self.timezone_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_coordinates.lock().unwrap() = Some((latitude, longitude));
        self.reading
            .ok_or_else(|| LookupError::Parse("stub timezone failure".to_string()))
    }
}
