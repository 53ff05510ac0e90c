//! `fretetrack` - Shipment tracking for road freight
//!
//! This library provides the core functionality of the tracking dashboard
//! backend: the trip-progress estimator, the shipment store, geocoding, and
//! the tracking service that ties them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod logging;
pub mod progress;
pub mod shipment;
pub mod store;
pub mod tracker;

pub use account::{AdminAccount, Driver, Role};
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{haversine_km, Coordinate};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use logging::init_logging;
pub use progress::trip_progress;
pub use shipment::{Expense, ExpenseCategory, Shipment, ShipmentStatus};
pub use store::{AccountRepository, ShipmentRepository, SqliteStore};
pub use tracker::{DeliveryReceipt, ShipmentDraft, Tracker};
