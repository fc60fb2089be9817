use async_trait::async_trait;
use reqwest::Client;

use crate::LookupError;

use super::{Geocoder, Place, truncate_body};

/// OpenStreetMap Nominatim search.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, city: &str, with_address: bool) -> Result<Vec<Place>, LookupError> {
        let mut query = vec![("city", city), ("format", "json")];
        if with_address {
            query.push(("addressdetails", "1"));
        }

        tracing::debug!(city, with_address, "geocoding search");

        let res = self.http.get(&self.search_url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LookupError::UpstreamRejected(format!(
                "{status}: {}",
                truncate_body(&body)
            )));
        }

        let places: Vec<Place> = serde_json::from_str(&body)?;
        tracing::debug!(city, hits = places.len(), "geocoding search done");

        Ok(places)
    }
}
