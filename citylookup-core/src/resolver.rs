//! The four lookup steps.
//!
//! Each step talks to its providers on its own. With default options a city
//! gets geocoded once for validation, once for its details and once more for
//! local time; `try_local_time_at` is the way around the last one.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, NaiveTime};

use crate::{
    CityQuery, GeocodeRecord, LocalTime, LookupError, SunClock, WeatherSnapshot,
    provider::{Geocoder, Place, WeatherSource},
};

/// True when the geocoder knows at least one place by this name.
pub async fn validate_city(geocoder: &dyn Geocoder, city: &CityQuery) -> Result<bool, LookupError> {
    let places = geocoder.search(city.as_str(), false).await?;
    Ok(!places.is_empty())
}

/// Coordinates and country of the first hit, `None` when there is no hit.
pub async fn resolve_location(
    geocoder: &dyn Geocoder,
    city: &CityQuery,
) -> Result<Option<GeocodeRecord>, LookupError> {
    let places = geocoder.search(city.as_str(), true).await?;
    Ok(places.first().map(record_from_place))
}

fn record_from_place(place: &Place) -> GeocodeRecord {
    let address = place.address.clone().unwrap_or_default();

    GeocodeRecord {
        latitude: place.lat,
        longitude: place.lon,
        country: address.country.unwrap_or_else(|| "Unknown".to_string()),
        country_code: address.country_code.unwrap_or_default().to_uppercase(),
    }
}

/// Current conditions for the city, with sunrise and sunset on `clock`.
pub async fn resolve_weather(
    weather: &dyn WeatherSource,
    city: &CityQuery,
    clock: SunClock,
) -> Result<WeatherSnapshot, LookupError> {
    let current = weather.current(city.as_str()).await?;

    Ok(WeatherSnapshot {
        temperature_c: current.temperature_c,
        feels_like_c: current.feels_like_c,
        description: current.description,
        humidity_pct: current.humidity_pct,
        wind_speed_mps: current.wind_speed_mps,
        sunrise: time_of_day(current.sunrise, clock, current.utc_offset_secs)?,
        sunset: time_of_day(current.sunset, clock, current.utc_offset_secs)?,
    })
}

/// `SunClock::System` reads the timestamp in the machine's zone even though
/// it belongs to another city. `SunClock::City` falls back to it when the
/// offset is missing.
fn time_of_day(ts: i64, clock: SunClock, offset_secs: Option<i32>) -> Result<NaiveTime, LookupError> {
    let utc = DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| LookupError::Parse(format!("timestamp {ts} out of range")))?;

    let time = match (clock, offset_secs.and_then(FixedOffset::east_opt)) {
        (SunClock::City, Some(zone)) => utc.with_timezone(&zone).time(),
        _ => utc.with_timezone(&Local).time(),
    };
    Ok(time)
}

/// Geocodes the city again, then asks for the time at its coordinates.
///
/// An `Err` here is what the pipeline reports as "Error fetching time".
pub async fn try_local_time(
    geocoder: &dyn Geocoder,
    weather: &dyn WeatherSource,
    city: &CityQuery,
) -> Result<LocalTime, LookupError> {
    let places = geocoder.search(city.as_str(), false).await?;
    let Some(first) = places.first() else {
        return Ok(LocalTime::LocationNotFound);
    };

    try_local_time_at(weather, first.lat, first.lon).await
}

/// Local time at known coordinates, skipping the geocoding round trip.
pub async fn try_local_time_at(
    weather: &dyn WeatherSource,
    latitude: f64,
    longitude: f64,
) -> Result<LocalTime, LookupError> {
    let reading = weather.timezone(latitude, longitude).await?;

    match (reading.utc_timestamp, reading.offset_secs) {
        (Some(dt), Some(offset)) => Ok(LocalTime::At(city_wall_clock(dt, offset)?)),
        _ => Ok(LocalTime::Unavailable),
    }
}

/// Shift a UTC timestamp by the city's offset and read it as UTC, which
/// gives the city's wall clock.
fn city_wall_clock(utc_timestamp: i64, offset_secs: i64) -> Result<NaiveDateTime, LookupError> {
    utc_timestamp
        .checked_add(offset_secs)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            LookupError::Parse(format!("timestamp {utc_timestamp}{offset_secs:+} out of range"))
        })
}
