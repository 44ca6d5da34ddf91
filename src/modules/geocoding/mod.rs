//! Reverse geocoding through a Nominatim-compatible API.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::core::config::GeocodingConfig;

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Geocoding client error: {0}")]
    Client(String),

    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Geocoding returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Short human-readable name for a coordinate, `None` when nothing is there
    async fn reverse(&self, latitude: f64, longitude: f64)
        -> Result<Option<String>, GeocodingError>;
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl NominatimAddress {
    fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
    }

    /// "Road, Neighbourhood, City" from whichever parts exist
    fn short_name(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.road.as_deref(),
            self.neighbourhood.as_deref().or(self.suburb.as_deref()),
            self.city(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GeocodingError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.nominatim_url.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodingError> {
        let url = format!("{}/reverse", self.base_url);
        tracing::debug!("Reverse geocoding ({}, {})", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodingError::Status(response.status().as_u16()));
        }

        let body: NominatimReverse = response
            .json()
            .await
            .map_err(|e| GeocodingError::Request(format!("Invalid Nominatim response: {}", e)))?;

        if body.error.is_some() {
            return Ok(None);
        }

        Ok(body
            .address
            .as_ref()
            .and_then(NominatimAddress::short_name)
            .or(body.display_name))
    }
}
