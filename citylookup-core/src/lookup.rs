use crate::{
    CityQuery, Config, Diagnostic, LocalTime, LookupError, LookupReport, Stage, SunClock,
    provider::{Geocoder, WeatherSource, providers_from_config},
    resolver,
};

/// Knobs that change how the pipeline reaches its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Feed the resolved coordinates into the local time step instead of
    /// geocoding again. Saves one geocoding call per lookup.
    pub reuse_coordinates: bool,
    pub sun_times: SunClock,
}

impl From<&Config> for LookupOptions {
    fn from(config: &Config) -> Self {
        Self {
            reuse_coordinates: config.reuse_coordinates,
            sun_times: config.sun_times,
        }
    }
}

/// Validate → geocode → weather → local time, one step after another.
#[derive(Debug)]
pub struct CityLookup {
    geocoder: Box<dyn Geocoder>,
    /// `None` when no API key is configured.
    weather: Option<Box<dyn WeatherSource>>,
    options: LookupOptions,
}

impl CityLookup {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherSource>,
        options: LookupOptions,
    ) -> Self {
        Self { geocoder, weather: Some(weather), options }
    }

    /// Validation and geocoding only; weather and local time are reported
    /// as missing the API key.
    pub fn geocoding_only(geocoder: Box<dyn Geocoder>, options: LookupOptions) -> Self {
        Self { geocoder, weather: None, options }
    }

    /// Works without an API key: the weather steps then come out empty.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        let (geocoder, weather) = providers_from_config(config)?;
        Ok(Self { geocoder, weather, options: LookupOptions::from(config) })
    }

    /// Run every step that applies. Failures never escape: they leave the
    /// matching field empty and add a diagnostic.
    pub async fn run(&self, city: &CityQuery) -> LookupReport {
        let mut report = LookupReport::new(city);

        report.valid = match resolver::validate_city(self.geocoder.as_ref(), city).await {
            Ok(valid) => valid,
            Err(err) => record(&mut report, Stage::Validation, err, false),
        };
        if !report.valid {
            return report;
        }

        report.location = match resolver::resolve_location(self.geocoder.as_ref(), city).await {
            Ok(location) => location,
            Err(err) => record(&mut report, Stage::Geocoding, err, None),
        };
        let Some(location) = report.location.clone() else {
            return report;
        };

        let Some(weather_source) = self.weather.as_deref() else {
            record(&mut report, Stage::Weather, LookupError::MissingApiKey, ());
            let fallback = LocalTime::FetchFailed;
            let time = record(&mut report, Stage::LocalTime, LookupError::MissingApiKey, fallback);
            report.local_time = Some(time);
            return report;
        };

        let weather = resolver::resolve_weather(weather_source, city, self.options.sun_times);
        report.weather = match weather.await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => record(&mut report, Stage::Weather, err, None),
        };

        let local_time = if self.options.reuse_coordinates {
            resolver::try_local_time_at(weather_source, location.latitude, location.longitude).await
        } else {
            resolver::try_local_time(self.geocoder.as_ref(), weather_source, city).await
        };
        report.local_time = Some(match local_time {
            Ok(time) => time,
            Err(err) => record(&mut report, Stage::LocalTime, err, LocalTime::FetchFailed),
        });

        report
    }
}

fn record<T>(report: &mut LookupReport, stage: Stage, err: LookupError, fallback: T) -> T {
    tracing::warn!(city = %report.city, %stage, error = %err, "lookup step failed");
    report.diagnostics.push(Diagnostic { stage, message: err.to_string() });
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        CurrentConditions, TimezoneReading,
        stub::{StubGeocoder, StubWeather, place},
    };
    use std::sync::atomic::Ordering;

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            temperature_c: 5.0,
            feels_like_c: 2.5,
            description: "overcast clouds".into(),
            humidity_pct: 90,
            wind_speed_mps: 7.2,
            sunrise: 1700000000,
            sunset: 1700030000,
            utc_offset_secs: Some(3600),
        }
    }

    fn oslo() -> StubGeocoder {
        StubGeocoder::with_places(vec![place(59.91, 10.75, Some(("Norge", "no")))])
    }

    fn tz() -> Option<TimezoneReading> {
        Some(TimezoneReading { utc_timestamp: Some(1700000000), offset_secs: Some(3600) })
    }

    fn query(name: &str) -> CityQuery {
        CityQuery::new(name).unwrap()
    }

    #[tokio::test]
    async fn full_lookup_fills_every_field() {
        let geo = oslo();
        let calls = geo.calls();
        let lookup = CityLookup::new(
            Box::new(geo),
            Box::new(StubWeather::new(Some(conditions()), tz())),
            LookupOptions::default(),
        );

        let report = lookup.run(&query("Oslo")).await;

        assert!(report.valid);
        assert_eq!(report.location.as_ref().map(|l| l.country_code.as_str()), Some("NO"));
        assert_eq!(report.weather.as_ref().map(|w| w.humidity_pct), Some(90));
        assert_eq!(
            report.local_time.as_ref().map(ToString::to_string).as_deref(),
            Some("2023-11-14 23:13:20")
        );
        assert!(report.diagnostics.is_empty());
        // validation, details and local time each geocode on their own
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reusing_coordinates_skips_one_geocoding_call() {
        let geo = oslo();
        let calls = geo.calls();
        let options = LookupOptions { reuse_coordinates: true, ..LookupOptions::default() };
        let lookup = CityLookup::new(
            Box::new(geo),
            Box::new(StubWeather::new(Some(conditions()), tz())),
            options,
        );

        let report = lookup.run(&query("Oslo")).await;

        assert!(matches!(report.local_time, Some(LocalTime::At(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_city_stops_after_validation() {
        let geo = StubGeocoder::with_places(vec![]);
        let calls = geo.calls();
        let lookup = CityLookup::new(
            Box::new(geo),
            Box::new(StubWeather::new(Some(conditions()), tz())),
            LookupOptions::default(),
        );

        let report = lookup.run(&query("Qwzx")).await;

        assert!(!report.valid);
        assert!(report.location.is_none() && report.weather.is_none());
        assert!(report.local_time.is_none());
        assert!(report.diagnostics.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn geocoder_outage_is_reported_not_raised() {
        let lookup = CityLookup::new(
            Box::new(StubGeocoder::failing()),
            Box::new(StubWeather::default()),
            LookupOptions::default(),
        );

        let report = lookup.run(&query("Oslo")).await;

        assert!(!report.valid);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, Stage::Validation);
    }

    #[tokio::test]
    async fn rejected_weather_leaves_rest_intact() {
        let lookup = CityLookup::new(
            Box::new(oslo()),
            Box::new(StubWeather::new(None, tz())),
            LookupOptions::default(),
        );

        let report = lookup.run(&query("Oslo")).await;

        assert!(report.location.is_some());
        assert!(report.weather.is_none());
        assert!(matches!(report.local_time, Some(LocalTime::At(_))));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, Stage::Weather);
        assert!(report.diagnostics[0].message.contains("404"));
    }

    #[tokio::test]
    async fn timezone_failure_becomes_fetch_error() {
        let lookup = CityLookup::new(
            Box::new(oslo()),
            Box::new(StubWeather::new(Some(conditions()), None)),
            LookupOptions::default(),
        );

        let report = lookup.run(&query("Oslo")).await;

        assert_eq!(report.local_time, Some(LocalTime::FetchFailed));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, Stage::LocalTime);
    }

    #[tokio::test]
    async fn failed_details_stop_before_weather() {
        let geo = StubGeocoder::failing_details(vec![place(59.91, 10.75, None)]);
        let weather = StubWeather::new(Some(conditions()), tz());
        let current_calls = weather.current_calls();
        let lookup = CityLookup::new(Box::new(geo), Box::new(weather), LookupOptions::default());

        let report = lookup.run(&query("Oslo")).await;

        assert!(report.valid);
        assert!(report.location.is_none());
        assert!(report.weather.is_none() && report.local_time.is_none());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, Stage::Geocoding);
        assert_eq!(current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_api_key_still_locates_the_city() {
        let geo = oslo();
        let calls = geo.calls();
        let lookup = CityLookup::geocoding_only(Box::new(geo), LookupOptions::default());

        let report = lookup.run(&query("Oslo")).await;

        assert!(report.valid);
        assert_eq!(report.location.as_ref().map(|l| l.country.as_str()), Some("Norge"));
        assert!(report.weather.is_none());
        assert_eq!(report.local_time, Some(LocalTime::FetchFailed));
        let stages: Vec<Stage> = report.diagnostics.iter().map(|d| d.stage).collect();
        assert_eq!(stages, [Stage::Weather, Stage::LocalTime]);
        assert!(report.diagnostics[0].message.contains("citylookup configure"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn from_config_builds_without_a_key() {
        assert!(CityLookup::from_config(&Config::default()).is_ok());
    }

    #[test]
    fn options_follow_config() {
        let cfg = Config { reuse_coordinates: true, sun_times: SunClock::City, ..Config::default() };
        assert_eq!(
            LookupOptions::from(&cfg),
            LookupOptions { reuse_coordinates: true, sun_times: SunClock::City }
        );
    }
}
