//! Geocoding seam for fretetrack.
//!
//! The tracking service talks to a [`Geocoder`] trait; the production
//! implementation adapts the Nominatim client crate. A place that cannot be
//! resolved is an absence, not an error: the progress estimator treats
//! missing endpoints as "not started", so lookups degrade gracefully.

use async_trait::async_trait;
use tracing::warn;

use crate::config::GeocoderConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinate;

use fretetrack_nominatim::{NominatimClient, NominatimConfig};

/// Geographic center of Brazil, the fallback position when a city lookup
/// finds nothing at all.
pub const BRAZIL_CENTER: Coordinate = Coordinate {
    lat: -14.2350,
    lon: -51.9253,
};

/// A resolved street address, from reverse geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Street-level line (`road, number`), when resolved.
    pub street: Option<String>,
    /// City-level name.
    pub city: Option<String>,
    /// State name as the provider reports it (not abbreviated).
    pub state: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Full human-readable place name.
    pub formatted: String,
}

/// Resolves place names to coordinates and coordinates to addresses.
///
/// Implementations return `Ok(None)` when the provider has no match;
/// transport failures surface as errors and callers degrade them to the
/// same absence.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text place name to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    async fn forward(&self, place: &str) -> Result<Option<Coordinate>>;

    /// Resolve a coordinate to an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    async fn reverse(&self, position: Coordinate) -> Result<Option<Address>>;

    /// Resolve a city/state pair, falling back to the center of Brazil.
    ///
    /// Registration always needs *some* current position for the map, so
    /// this never fails: lookup misses and provider errors both fall back.
    async fn locate_city(&self, city: &str, state: &str) -> Coordinate {
        let query = format!("{}, {}", city.trim(), state.trim());
        match self.forward(&query).await {
            Ok(Some(position)) => position,
            Ok(None) => {
                warn!("No geocoding result for '{}', using fallback", query);
                BRAZIL_CENTER
            }
            Err(e) => {
                warn!("Geocoding '{}' failed ({}), using fallback", query, e);
                BRAZIL_CENTER
            }
        }
    }
}

/// Abbreviate a state name to the two-letter form shown on the dashboard.
///
/// Names longer than two characters are truncated to their first two
/// characters and uppercased ("Bahia" becomes "BA"); anything shorter is
/// uppercased as-is.
#[must_use]
pub fn short_state(state: &str) -> String {
    let trimmed = state.trim();
    let abbrev: String = trimmed.chars().take(2).collect();
    abbrev.to_uppercase()
}

/// Production [`Geocoder`] backed by a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: NominatimClient,
    country_bias: String,
}

impl NominatimGeocoder {
    /// Build a geocoder from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = NominatimClient::with_config(NominatimConfig {
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        })
        .map_err(|e| Error::internal(format!("failed to build geocoder: {e}")))?;

        Ok(Self {
            client,
            country_bias: config.country_bias.clone(),
        })
    }

    /// Append the configured country to a query, unless disabled.
    fn biased_query(&self, place: &str) -> String {
        let place = place.trim();
        if self.country_bias.is_empty() {
            place.to_string()
        } else {
            format!("{place}, {}", self.country_bias)
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, place: &str) -> Result<Option<Coordinate>> {
        let query = self.biased_query(place);
        let hit = self
            .client
            .search(&query)
            .await
            .map_err(|e| Error::geocoding(place, e.to_string()))?;

        Ok(hit.map(|h| Coordinate::new(h.lat, h.lon)))
    }

    async fn reverse(&self, position: Coordinate) -> Result<Option<Address>> {
        let place = self
            .client
            .reverse(position.lat, position.lon)
            .await
            .map_err(|e| Error::geocoding(position.to_string(), e.to_string()))?;

        Ok(place.map(|p| Address {
            street: p.address.street_line(),
            city: p.address.locality().map(String::from),
            state: p.address.state.clone(),
            country: p.address.country.clone(),
            formatted: p.display_name,
        }))
    }
}
