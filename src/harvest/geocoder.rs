//! Address geocoding
//!
//! Resolves free-text station addresses to coordinates through a JSON
//! geocoding endpoint. There is no retry here: a failed lookup is a data gap,
//! recorded as [`GeoCoordinate::Unresolved`], never a run failure.

use reqwest::Client;
use serde::Deserialize;

/// Status value the service uses for a usable answer
const STATUS_OK: &str = "OK";

/// Coordinates attached to one station
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoCoordinate {
    Resolved { latitude: f64, longitude: f64 },
    Unresolved,
}

impl GeoCoordinate {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Latitude and longitude, if resolved
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Resolved {
                latitude,
                longitude,
            } => Some((latitude, longitude)),
            Self::Unresolved => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GeocodeResponse {
    /// The first candidate's coordinates, or `Unresolved`
    fn into_coordinate(self, address: &str) -> GeoCoordinate {
        if self.status != STATUS_OK {
            tracing::warn!("Geocoding API error: {} (address: {})", self.status, address);
            return GeoCoordinate::Unresolved;
        }

        match self.results.into_iter().next() {
            Some(result) => GeoCoordinate::Resolved {
                latitude: result.geometry.location.lat,
                longitude: result.geometry.location.lng,
            },
            None => {
                tracing::warn!("Geocoding API returned no results for {}", address);
                GeoCoordinate::Unresolved
            }
        }
    }
}

/// Client for the external geocoding service
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl Geocoder {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Looks up `address`; every failure path yields `Unresolved`
    pub async fn resolve(&self, address: &str) -> GeoCoordinate {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .and_then(|response| response.error_for_status());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Failed to get geocode data for address {}. Error: {}",
                    address,
                    e
                );
                return GeoCoordinate::Unresolved;
            }
        };

        match response.json::<GeocodeResponse>().await {
            Ok(body) => body.into_coordinate(address),
            Err(e) => {
                tracing::warn!("Failed to decode geocode response for {}: {}", address, e);
                GeoCoordinate::Unresolved
            }
        }
    }
}
