//! OpenStreetMap Nominatim client for fretetrack.
//!
//! This crate provides forward (place name to coordinates) and reverse
//! (coordinates to address) geocoding against a Nominatim instance. It knows
//! nothing about shipments; the core crate adapts it behind its own
//! `Geocoder` trait.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur while talking to Nominatim.
#[derive(Debug, Error)]
pub enum NominatimError {
    /// The HTTP request failed (network, timeout, non-2xx status).
    #[error("nominatim request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    /// A result carried a coordinate that did not parse as a number.
    #[error("nominatim returned an unparseable coordinate: {0}")]
    InvalidCoordinate(String),
}

/// Result type for Nominatim operations.
pub type Result<T> = std::result::Result<T, NominatimError>;

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the Nominatim instance.
    pub endpoint: String,

    /// User-Agent header. The public instance rejects anonymous clients,
    /// so this must identify the application.
    pub user_agent: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("fretetrack-nominatim/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// A forward-geocoding hit: a named place resolved to a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Full display name of the matched place.
    pub display_name: String,
}

/// The address detail block of a reverse-geocoding result.
///
/// Nominatim populates a different subset of these fields depending on the
/// kind of place the coordinate lands on, so everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReverseAddress {
    /// Street name.
    #[serde(default)]
    pub road: Option<String>,
    /// House number on the street.
    #[serde(default)]
    pub house_number: Option<String>,
    /// Suburb, when present.
    #[serde(default)]
    pub suburb: Option<String>,
    /// Neighbourhood, when present.
    #[serde(default)]
    pub neighbourhood: Option<String>,
    /// City proper.
    #[serde(default)]
    pub city: Option<String>,
    /// Town, for smaller places.
    #[serde(default)]
    pub town: Option<String>,
    /// Village, for even smaller places.
    #[serde(default)]
    pub village: Option<String>,
    /// Municipality, the administrative fallback.
    #[serde(default)]
    pub municipality: Option<String>,
    /// State or region name.
    #[serde(default)]
    pub state: Option<String>,
    /// Country name.
    #[serde(default)]
    pub country: Option<String>,
}

impl ReverseAddress {
    /// The best available city-level name: city, town, village, or
    /// municipality, in that order.
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.municipality.as_deref())
    }

    /// Street-level line: `road, house_number` when a road is known.
    #[must_use]
    pub fn street_line(&self) -> Option<String> {
        let road = self.road.as_deref()?;
        Some(match self.house_number.as_deref() {
            Some(number) => format!("{road}, {number}"),
            None => road.to_string(),
        })
    }
}

/// A reverse-geocoding result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversePlace {
    /// Full display name of the place.
    pub display_name: String,
    /// Structured address details.
    pub address: ReverseAddress,
}

/// Wire format of a `/search` entry. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchEntry {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Wire format of a `/reverse` response. On water or out-of-coverage
/// coordinates the body is `{"error": "..."}` instead of a place.
#[derive(Debug, Deserialize)]
struct ReverseEntry {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

/// HTTP client for a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    config: NominatimConfig,
    http: reqwest::Client,
}

impl NominatimClient {
    /// Create a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        Self::with_config(NominatimConfig::default())
    }

    /// Create a client with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_config(config: NominatimConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(NominatimError::ClientBuild)?;

        Ok(Self { config, http })
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Resolve a free-text place name to its best-matching coordinate.
    ///
    /// Returns `Ok(None)` when Nominatim has no match for the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        let url = format!("{}/search", self.config.endpoint);
        debug!("Forward geocoding '{}'", query);

        let entries: Vec<SearchEntry> = self
            .http
            .get(&url)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(entry) = entries.into_iter().next() else {
            trace!("No result for '{}'", query);
            return Ok(None);
        };

        Ok(Some(parse_hit(&entry)?))
    }

    /// Resolve a coordinate to the address it lands on.
    ///
    /// Returns `Ok(None)` when the coordinate is outside Nominatim's
    /// coverage (open water, poles).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<ReversePlace>> {
        let url = format!("{}/reverse", self.config.endpoint);
        debug!("Reverse geocoding {:.4}, {:.4}", lat, lon);

        let entry: ReverseEntry = self
            .http
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(reverse_entry_to_place(entry))
    }
}

fn parse_hit(entry: &SearchEntry) -> Result<SearchHit> {
    let lat = entry
        .lat
        .parse::<f64>()
        .map_err(|_| NominatimError::InvalidCoordinate(entry.lat.clone()))?;
    let lon = entry
        .lon
        .parse::<f64>()
        .map_err(|_| NominatimError::InvalidCoordinate(entry.lon.clone()))?;

    Ok(SearchHit {
        lat,
        lon,
        display_name: entry.display_name.clone(),
    })
}

fn reverse_entry_to_place(entry: ReverseEntry) -> Option<ReversePlace> {
    if let Some(error) = entry.error {
        trace!("Reverse geocoding miss: {}", error);
        return None;
    }

    Some(ReversePlace {
        display_name: entry.display_name.unwrap_or_default(),
        address: entry.address.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NominatimConfig::default();
        assert_eq!(config.endpoint, "https://nominatim.openstreetmap.org");
        assert!(config.user_agent.starts_with("fretetrack-nominatim/"));
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_client_builds() {
        let client = NominatimClient::new();
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().endpoint(),
            "https://nominatim.openstreetmap.org"
        );
    }

    #[test]
    fn test_search_entry_parsing() {
        let json = r#"[{
            "lat": "-12.9822499",
            "lon": "-38.4812772",
            "display_name": "Salvador, Região Metropolitana de Salvador, Bahia, Brasil"
        }]"#;

        let entries: Vec<SearchEntry> = serde_json::from_str(json).unwrap();
        let hit = parse_hit(&entries[0]).unwrap();

        assert!((hit.lat - (-12.982_249_9)).abs() < 1e-9);
        assert!((hit.lon - (-38.481_277_2)).abs() < 1e-9);
        assert!(hit.display_name.starts_with("Salvador"));
    }

    #[test]
    fn test_search_entry_bad_coordinate() {
        let entry = SearchEntry {
            lat: "not-a-number".to_string(),
            lon: "-38.5".to_string(),
            display_name: String::new(),
        };
        let result = parse_hit(&entry);
        assert!(matches!(result, Err(NominatimError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_reverse_entry_parsing() {
        let json = r#"{
            "display_name": "Avenida Paulista, Bela Vista, São Paulo, SP, Brasil",
            "address": {
                "road": "Avenida Paulista",
                "house_number": "1578",
                "suburb": "Bela Vista",
                "city": "São Paulo",
                "state": "São Paulo",
                "country": "Brasil"
            }
        }"#;

        let entry: ReverseEntry = serde_json::from_str(json).unwrap();
        let place = reverse_entry_to_place(entry).unwrap();

        assert_eq!(place.address.locality(), Some("São Paulo"));
        assert_eq!(
            place.address.street_line(),
            Some("Avenida Paulista, 1578".to_string())
        );
        assert_eq!(place.address.state.as_deref(), Some("São Paulo"));
    }

    #[test]
    fn test_reverse_entry_error_is_miss() {
        let json = r#"{"error": "Unable to geocode"}"#;
        let entry: ReverseEntry = serde_json::from_str(json).unwrap();
        assert!(reverse_entry_to_place(entry).is_none());
    }

    #[test]
    fn test_locality_fallback_chain() {
        let mut address = ReverseAddress {
            town: Some("Feira de Santana".to_string()),
            ..ReverseAddress::default()
        };
        assert_eq!(address.locality(), Some("Feira de Santana"));

        address.town = None;
        address.municipality = Some("Região de Feira".to_string());
        assert_eq!(address.locality(), Some("Região de Feira"));

        address.municipality = None;
        assert!(address.locality().is_none());
    }

    #[test]
    fn test_street_line_without_number() {
        let address = ReverseAddress {
            road: Some("BR-324".to_string()),
            ..ReverseAddress::default()
        };
        assert_eq!(address.street_line(), Some("BR-324".to_string()));
    }

    #[test]
    fn test_street_line_requires_road() {
        let address = ReverseAddress::default();
        assert!(address.street_line().is_none());
    }

    #[test]
    fn test_unknown_address_fields_are_ignored() {
        let json = r#"{
            "display_name": "Somewhere",
            "address": {"city": "São Paulo", "postcode": "01310-200", "ISO3166-2-lvl4": "BR-SP"}
        }"#;
        let entry: ReverseEntry = serde_json::from_str(json).unwrap();
        let place = reverse_entry_to_place(entry).unwrap();
        assert_eq!(place.address.locality(), Some("São Paulo"));
    }
}
