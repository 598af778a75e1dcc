use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

/// Mean Earth radius in miles, used to turn a search distance into an angle.
pub const EARTH_RADIUS_MI: f64 = 3963.0;

const MAPQUEST_URL: &str = "https://www.mapquestapi.com/geocoding/v1/address";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("No location found for `{0}`")]
    NotFound(String),
    #[error("Geocoding service unavailable")]
    Unavailable,
}

/// Location
///
/// A resolved address. Only the coordinates are guaranteed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

/// Geocoder
///
/// Resolves a free-form address or a postal code into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError>;
}

pub type GeocoderState = Arc<dyn Geocoder>;

// --- MapQuest ---

#[derive(Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: LatLng,
    #[serde(default)]
    street: String,
    // city
    #[serde(default)]
    admin_area5: String,
    // state
    #[serde(default)]
    admin_area3: String,
    // country
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

impl From<MapQuestLocation> for Location {
    fn from(loc: MapQuestLocation) -> Self {
        let region = format!("{} {}", loc.admin_area3, loc.postal_code);
        let formatted = [
            loc.street.as_str(),
            loc.admin_area5.as_str(),
            region.as_str(),
            loc.admin_area1.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Location {
            latitude: loc.lat_lng.lat,
            longitude: loc.lat_lng.lng,
            formatted_address: non_empty(formatted),
            street: non_empty(loc.street),
            city: non_empty(loc.admin_area5),
            state: non_empty(loc.admin_area3),
            zipcode: non_empty(loc.postal_code),
            country: non_empty(loc.admin_area1),
        }
    }
}

/// MapQuestGeocoder
///
/// Calls the MapQuest address endpoint and keeps the first candidate.
pub struct MapQuestGeocoder {
    client: reqwest::Client,
    api_key: String,
}

impl MapQuestGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        let response: MapQuestResponse = self
            .client
            .get(MAPQUEST_URL)
            .query(&[("key", self.api_key.as_str()), ("location", address)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let location = response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.locations.into_iter().next())
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        tracing::debug!(address, lat = location.lat_lng.lat, lng = location.lat_lng.lng, "geocoded address");
        Ok(location.into())
    }
}

/// Angular radius (radians) of a search distance given in miles.
pub fn angular_radius(distance_mi: f64) -> f64 {
    distance_mi / EARTH_RADIUS_MI
}

/// MockGeocoder
///
/// In-memory geocoder for tests: resolves only the addresses it was seeded with.
#[derive(Default)]
pub struct MockGeocoder {
    known: HashMap<String, Location>,
    should_fail: bool,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.known.insert(
            address.to_string(),
            Location {
                latitude,
                longitude,
                formatted_address: Some(address.to_string()),
                ..Location::default()
            },
        );
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        if self.should_fail {
            return Err(GeocodeError::Unavailable);
        }
        self.known
            .get(address)
            .cloned()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))
    }
}
