use crate::{
    Config, LookupError,
    provider::{nominatim::NominatimGeocoder, openweather::OpenWeatherClient},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::fmt::Debug;

pub mod nominatim;
pub mod openweather;
#[cfg(test)]
pub(crate) mod stub;

/// One geocoding hit, as the geocoder reports it.
///
/// Nominatim sends coordinates as strings; plain numbers are accepted too.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lat: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lon: f64,
    /// Only present when address details were requested.
    #[serde(default)]
    pub address: Option<PlaceAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceAddress {
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// Current conditions from a response the weather service accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Unix seconds, UTC.
    pub sunrise: i64,
    pub sunset: i64,
    /// Seconds east of UTC for the city, when the service sent it.
    pub utc_offset_secs: Option<i32>,
}

/// The two fields local time is derived from. Either may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimezoneReading {
    pub utc_timestamp: Option<i64>,
    pub offset_secs: Option<i64>,
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Search by city name. Hits come back in the service's ranking order.
    async fn search(&self, city: &str, with_address: bool) -> Result<Vec<Place>, LookupError>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<CurrentConditions, LookupError>;

    async fn timezone(&self, latitude: f64, longitude: f64)
    -> Result<TimezoneReading, LookupError>;
}

/// Shared HTTP client: one user agent, one timeout for every request.
pub fn http_client(config: &Config) -> Result<Client, LookupError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Geocoding needs no key, so only the weather source is optional.
pub type Providers = (Box<dyn Geocoder>, Option<Box<dyn WeatherSource>>);

/// Construct the providers from config. Without an API key there is no
/// weather source.
pub fn providers_from_config(config: &Config) -> Result<Providers, LookupError> {
    build_providers(config, config.api_key())
}

fn build_providers(config: &Config, api_key: Option<String>) -> Result<Providers, LookupError> {
    let http = http_client(config)?;

    let geocoder = NominatimGeocoder::new(http.clone(), &config.endpoints.nominatim);
    let weather = api_key.map(|key| {
        Box::new(OpenWeatherClient::new(http, &config.endpoints.openweather, key))
            as Box<dyn WeatherSource>
    });
    if weather.is_none() {
        tracing::warn!("no OpenWeather API key configured, weather and local time are skipped");
    }

    Ok((Box::new(geocoder), weather))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
