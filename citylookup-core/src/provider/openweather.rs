use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::LookupError;

use super::{CurrentConditions, TimezoneReading, WeatherSource, truncate_body};

/// `cod` value of an accepted current-weather response.
const SUCCESS_CODE: u16 = 200;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        Self {
            api_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET `{base}/{endpoint}` and parse the body as JSON, whatever the status.
    ///
    /// The service reports failures in the body (`cod`, missing blocks), so
    /// the HTTP status alone is only logged.
    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, LookupError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        tracing::debug!(endpoint, %status, "openweather response");

        serde_json::from_str(&body).map_err(|err| {
            LookupError::Parse(format!("{endpoint}: {err}; body: {}", truncate_body(&body)))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    #[serde(default)]
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwStamp {
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: Option<i64>,
    #[serde(default)]
    current: Option<OwStamp>,
}

/// Only the number 200 counts; the service sends error codes as strings.
fn check_code(data: &Value) -> Result<(), LookupError> {
    match data.get("cod") {
        Some(cod) if cod.as_u64() == Some(u64::from(SUCCESS_CODE)) => Ok(()),
        Some(cod) => {
            let message = data.get("message").and_then(Value::as_str).unwrap_or_default();
            Err(LookupError::UpstreamRejected(format!("cod {cod} {message}").trim_end().to_string()))
        }
        None => Err(LookupError::UpstreamRejected("missing cod".to_string())),
    }
}

fn parse_current(data: Value) -> Result<CurrentConditions, LookupError> {
    check_code(&data)?;

    let parsed: OwCurrentResponse = serde_json::from_value(data)?;
    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| LookupError::Parse("weather list is empty".to_string()))?;

    Ok(CurrentConditions {
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        description,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        sunrise: parsed.sys.sunrise,
        sunset: parsed.sys.sunset,
        utc_offset_secs: parsed.timezone,
    })
}

fn parse_timezone(data: Value) -> Result<TimezoneReading, LookupError> {
    let parsed: OwOneCallResponse = serde_json::from_value(data)?;
    Ok(TimezoneReading {
        utc_timestamp: parsed.current.map(|c| c.dt),
        offset_secs: parsed.timezone_offset,
    })
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<CurrentConditions, LookupError> {
        let data = self
            .get_json("weather", &[("q", city), ("units", "metric")])
            .await?;
        parse_current(data)
    }

    async fn timezone(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<TimezoneReading, LookupError> {
        let (lat, lon) = (latitude.to_string(), longitude.to_string());
        let data = self
            .get_json(
                "onecall",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("exclude", "minutely,hourly,daily,alerts"),
                ],
            )
            .await?;
        parse_timezone(data)
    }
}
