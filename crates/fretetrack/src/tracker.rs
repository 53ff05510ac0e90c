//! Tracking service for fretetrack.
//!
//! Ties the shipment repository and the geocoder together: registration and
//! revision of shipments, customer tracking queries, driver position
//! reports, expense logging, delivery receipts, and account management.
//! Storage and geocoding are injected, so the service itself stays testable
//! without a network or a database file.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::account::{AdminAccount, Driver, Role};
use crate::config::TrackingConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::geocode::{short_state, Geocoder};
use crate::progress::trip_progress;
use crate::shipment::{
    is_valid_code, next_code, CurrentLocation, DriverRef, Expense, ExpenseCategory, Shipment,
    ShipmentStatus,
};
use crate::store::{AccountRepository, ShipmentRepository};

/// Message stored when a driver position report comes in.
const DRIVER_UPDATE_MESSAGE: &str = "Em trânsito - Atualizado pelo Motorista";

/// Message stored when the driver confirms delivery.
const DELIVERED_MESSAGE: &str = "Entrega Realizada";

/// Default customer-facing message for a new shipment.
const DEFAULT_MESSAGE: &str = "Carga em deslocamento para o destino.";

/// Input for registering or revising a shipment.
#[derive(Debug, Clone)]
pub struct ShipmentDraft {
    /// Tracking code. Generated from the configured prefix when absent.
    pub code: Option<String>,
    /// Initial status.
    pub status: ShipmentStatus,
    /// Free-text origin place name.
    pub origin: String,
    /// Free-text destination place name.
    pub destination: String,
    /// Street-level destination detail, when known.
    pub destination_address: Option<String>,
    /// City the truck is currently in.
    pub current_city: String,
    /// State of the current city.
    pub current_state: String,
    /// Customer-facing message. Defaults to a generic in-transit note.
    pub message: Option<String>,
    /// Internal admin notes.
    pub notes: Option<String>,
    /// Estimated delivery date. Defaults to the configured ETA offset.
    pub estimated_delivery: Option<chrono::NaiveDate>,
    /// Assigned driver, when one is linked.
    pub driver: Option<DriverRef>,
    /// Who is saving the record.
    pub registered_by: String,
}

/// Delivery receipt data, assembled from a shipment.
///
/// Rendering beyond plain text (PDF, messaging links) belongs to the
/// presentation layer and is out of scope here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReceipt {
    /// Tracking code.
    pub code: String,
    /// Status at the time the receipt was produced.
    pub status: ShipmentStatus,
    /// Origin place name.
    pub origin: String,
    /// Destination place name.
    pub destination: String,
    /// Street-level destination detail, when known.
    pub destination_address: Option<String>,
    /// Driver name, when one was assigned.
    pub driver_name: Option<String>,
    /// `"HH:MM - DD/MM"` stamp of the last update.
    pub last_update_stamp: String,
    /// Percent complete.
    pub progress: u8,
    /// Expense history.
    pub expenses: Vec<Expense>,
    /// Total of all expenses in BRL.
    pub total_expenses: f64,
    /// Notes written by the driver.
    pub driver_notes: Option<String>,
}

impl DeliveryReceipt {
    /// Render the receipt as plain text.
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("RECIBO DE ENTREGA - {}\n", self.code));
        out.push_str(&format!("Status:       {}\n", self.status.label()));
        out.push_str(&format!("Origem:       {}\n", self.origin));
        out.push_str(&format!("Destino:      {}\n", self.destination));
        if let Some(address) = &self.destination_address {
            out.push_str(&format!("Endereço:     {address}\n"));
        }
        if let Some(driver) = &self.driver_name {
            out.push_str(&format!("Motorista:    {driver}\n"));
        }
        out.push_str(&format!("Atualizado:   {}\n", self.last_update_stamp));
        out.push_str(&format!("Progresso:    {}%\n", self.progress));

        if self.expenses.is_empty() {
            out.push_str("Despesas:     nenhuma registrada\n");
        } else {
            out.push_str("Despesas:\n");
            for expense in &self.expenses {
                out.push_str(&format!(
                    "  - {} | {} | R$ {:.2}\n",
                    expense.category.label(),
                    expense.description,
                    expense.value
                ));
            }
            out.push_str(&format!("Total:        R$ {:.2}\n", self.total_expenses));
        }

        if let Some(notes) = &self.driver_notes {
            out.push_str(&format!("Observações:  {notes}\n"));
        }

        out
    }
}

/// The tracking service.
///
/// Generic over the repository and geocoder so tests can inject doubles and
/// deployments can swap storage engines.
#[derive(Debug)]
pub struct Tracker<S, G> {
    store: S,
    geocoder: G,
    tracking: TrackingConfig,
}

impl<S, G> Tracker<S, G>
where
    S: ShipmentRepository + AccountRepository,
    G: Geocoder,
{
    /// Create a tracker over the given store and geocoder.
    pub fn new(store: S, geocoder: G, tracking: TrackingConfig) -> Self {
        Self {
            store,
            geocoder,
            tracking,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // === Shipments ===

    /// Register a new shipment from an admin draft.
    ///
    /// Geocodes the current city (with fallback), origin, and destination
    /// (absent on failure), computes the initial progress, and persists the
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateShipment`] if the code is already taken,
    /// [`Error::InvalidCode`] if a given code does not match the configured
    /// pattern, or a storage error.
    pub async fn register(&self, draft: ShipmentDraft) -> Result<Shipment> {
        let code = self.resolve_code(draft.code.as_deref())?;
        if self.store.get(&code)?.is_some() {
            return Err(Error::DuplicateShipment { code });
        }

        let shipment = self.build_shipment(code, draft, None).await?;
        self.store.put(&shipment)?;
        info!("Registered shipment {}", shipment.code);
        Ok(shipment)
    }

    /// Revise an existing shipment from an admin draft.
    ///
    /// Re-geocodes and recomputes progress like [`Tracker::register`], but
    /// keeps the driver-owned parts of the record (expenses, driver notes,
    /// live flag) that the admin form does not touch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShipmentNotFound`] if the code is unknown, or a
    /// storage error.
    pub async fn revise(&self, code: &str, draft: ShipmentDraft) -> Result<Shipment> {
        let Some(existing) = self.store.get(code)? else {
            return Err(Error::shipment_not_found(code));
        };

        let shipment = self
            .build_shipment(code.to_string(), draft, Some(existing))
            .await?;
        self.store.put(&shipment)?;
        info!("Revised shipment {}", shipment.code);
        Ok(shipment)
    }

    /// Customer tracking query: fetch a shipment by code.
    ///
    /// When the destination was never geocoded (e.g. the provider was down
    /// at registration time), this retries the lookup and persists the
    /// correction, so older records heal on read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShipmentNotFound`] if no shipment is registered
    /// under the code, or a storage error.
    pub async fn locate(&self, code: &str) -> Result<Shipment> {
        let Some(mut shipment) = self.store.get(code)? else {
            return Err(Error::shipment_not_found(code));
        };

        if shipment.destination_coordinates.is_none() && !shipment.destination.is_empty() {
            if let Some(position) = self.forward_or_none(&shipment.destination).await {
                debug!(
                    "Retroactively geocoded destination of {}: {}",
                    shipment.code, position
                );
                shipment.destination_coordinates = Some(position);
                self.store.put(&shipment)?;
            }
        }

        Ok(shipment)
    }

    /// Record a GPS position report from the road.
    ///
    /// Reverse-geocodes the fix into city/state/address (keeping the
    /// previous values when the lookup fails), repairs missing endpoint
    /// coordinates, recomputes the progress, and persists. Once someone has
    /// reported from the road the progress never shows 0, so the dashboard
    /// reads "started" (floor of 1). With `complete` the shipment is
    /// forced to delivered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShipmentNotFound`] if the code is unknown, or a
    /// storage error.
    pub async fn report_position(
        &self,
        code: &str,
        position: Coordinate,
        reporter: &str,
        driver_notes: Option<String>,
        complete: bool,
    ) -> Result<Shipment> {
        let Some(mut shipment) = self.store.get(code)? else {
            return Err(Error::shipment_not_found(code));
        };

        // Reverse geocode the fix; on failure keep what we had.
        match self.geocoder.reverse(position).await {
            Ok(Some(address)) => {
                if let Some(city) = address.city {
                    shipment.current.city = city;
                }
                if let Some(state) = address.state {
                    shipment.current.state = short_state(&state);
                }
                if let Some(street) = address.street {
                    shipment.current.address = Some(street);
                } else if let Some(first) = address.formatted.split(',').next() {
                    if !first.is_empty() {
                        shipment.current.address = Some(first.to_string());
                    }
                }
            }
            Ok(None) => debug!("No reverse geocoding result for {}", position),
            Err(e) => warn!("Reverse geocoding failed for {}: {}", position, e),
        }
        shipment.current.coordinates = position;

        // Repair endpoints that were never geocoded.
        if shipment.destination_coordinates.is_none() {
            shipment.destination_coordinates = self.forward_or_none(&shipment.destination).await;
        }
        if shipment.origin_coordinates.is_none() {
            shipment.origin_coordinates = self.forward_or_none(&shipment.origin).await;
        }

        let mut progress = self.effective_progress(
            shipment.origin_coordinates,
            shipment.destination_coordinates,
            position,
        );
        if progress < 1 {
            progress = 1;
        }

        if complete {
            shipment.progress = 100;
            shipment.status = ShipmentStatus::Delivered;
            shipment.message = DELIVERED_MESSAGE.to_string();
            shipment.live = false;
        } else {
            shipment.progress = progress;
            shipment.status = ShipmentStatus::InTransit;
            shipment.message = DRIVER_UPDATE_MESSAGE.to_string();
            shipment.live = true;
        }

        if driver_notes.is_some() {
            shipment.driver_notes = driver_notes;
        }
        shipment.updated_by = Some(reporter.to_string());
        shipment.last_update = Utc::now();

        self.store.put(&shipment)?;
        info!(
            "Position report for {} by {}: {}% complete",
            shipment.code, reporter, shipment.progress
        );
        Ok(shipment)
    }

    /// Log an expense against a shipment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShipmentNotFound`] if the code is unknown, or a
    /// storage error.
    pub fn add_expense(
        &self,
        code: &str,
        category: ExpenseCategory,
        description: &str,
        value: f64,
    ) -> Result<Shipment> {
        let Some(mut shipment) = self.store.get(code)? else {
            return Err(Error::shipment_not_found(code));
        };

        shipment.expenses.push(Expense {
            id: Utc::now().timestamp_millis().to_string(),
            category,
            description: description.to_string(),
            value,
            date: Utc::now(),
        });
        shipment.last_update = Utc::now();

        self.store.put(&shipment)?;
        Ok(shipment)
    }

    /// Assemble the delivery receipt for a shipment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShipmentNotFound`] if the code is unknown, or a
    /// storage error.
    pub fn receipt(&self, code: &str) -> Result<DeliveryReceipt> {
        let Some(shipment) = self.store.get(code)? else {
            return Err(Error::shipment_not_found(code));
        };

        Ok(DeliveryReceipt {
            code: shipment.code.clone(),
            status: shipment.status,
            origin: shipment.origin.clone(),
            destination: shipment.destination.clone(),
            destination_address: shipment.destination_address.clone(),
            driver_name: shipment.driver.as_ref().map(|d| d.name.clone()),
            last_update_stamp: shipment.update_stamp(),
            progress: shipment.progress,
            total_expenses: shipment.expense_total(),
            expenses: shipment.expenses,
            driver_notes: shipment.driver_notes,
        })
    }

    /// All shipments, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    pub fn list(&self) -> Result<Vec<Shipment>> {
        self.store.list()
    }

    /// Remove a shipment. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    pub fn remove(&self, code: &str) -> Result<bool> {
        self.store.delete(code)
    }

    // === Accounts ===

    /// Authenticate an admin. Returns the admin role on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if the pair does not match,
    /// or a storage error.
    pub fn login_admin(&self, username: &str, password: &str) -> Result<Role> {
        match self.store.find_admin(username)? {
            Some(account) if account.password == password => Ok(Role::Admin),
            _ => Err(Error::InvalidCredentials {
                username: username.to_string(),
            }),
        }
    }

    /// Authenticate a driver by name. Returns the driver role on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if the pair does not match,
    /// or a storage error.
    pub fn login_driver(&self, name: &str, password: &str) -> Result<Role> {
        match self.store.find_driver(name)? {
            Some(driver) if driver.password == password => Ok(Role::Driver),
            _ => Err(Error::InvalidCredentials {
                username: name.to_string(),
            }),
        }
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccount`] if the username is taken, or a
    /// storage error.
    pub fn add_admin(&self, username: &str, password: &str) -> Result<()> {
        self.store.put_admin(&AdminAccount {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Remove an admin account. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LastAdmin`] when it would remove the only admin,
    /// or a storage error.
    pub fn remove_admin(&self, username: &str) -> Result<bool> {
        self.store.delete_admin(username)
    }

    /// All admin accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    pub fn admins(&self) -> Result<Vec<AdminAccount>> {
        self.store.admins()
    }

    /// Create a driver account and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccount`] if the name is taken, or a
    /// storage error.
    pub fn add_driver(
        &self,
        name: &str,
        password: &str,
        phone: Option<String>,
    ) -> Result<Driver> {
        let driver = Driver {
            id: format!("drv-{}", Utc::now().timestamp_millis()),
            name: name.to_string(),
            password: password.to_string(),
            phone,
        };
        self.store.put_driver(&driver)?;
        Ok(driver)
    }

    /// Remove a driver account. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    pub fn remove_driver(&self, id: &str) -> Result<bool> {
        self.store.delete_driver(id)
    }

    /// All driver accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    pub fn drivers(&self) -> Result<Vec<Driver>> {
        self.store.drivers()
    }

    // === Internals ===

    /// Validate a given code or generate the next free one.
    fn resolve_code(&self, given: Option<&str>) -> Result<String> {
        let prefix = &self.tracking.code_prefix;
        match given {
            Some(code) => {
                let code = code.trim().to_uppercase();
                if !is_valid_code(&code, prefix) {
                    return Err(Error::InvalidCode {
                        code,
                        prefix: prefix.clone(),
                    });
                }
                Ok(code)
            }
            None => {
                let existing = self.store.list()?;
                Ok(next_code(
                    existing.iter().map(|s| s.code.as_str()),
                    prefix,
                ))
            }
        }
    }

    /// Geocode the draft and assemble the shipment record.
    async fn build_shipment(
        &self,
        code: String,
        draft: ShipmentDraft,
        existing: Option<Shipment>,
    ) -> Result<Shipment> {
        let current_coordinates = self
            .geocoder
            .locate_city(&draft.current_city, &draft.current_state)
            .await;
        let origin_coordinates = self.forward_or_none(&draft.origin).await;
        let destination_coordinates = self.forward_or_none(&draft.destination).await;

        let progress = self.effective_progress(
            origin_coordinates,
            destination_coordinates,
            current_coordinates,
        );

        let estimated_delivery = draft.estimated_delivery.or_else(|| {
            Some(
                (Utc::now() + chrono::Duration::days(i64::from(self.tracking.default_eta_days)))
                    .date_naive(),
            )
        });

        let (expenses, driver_notes, live) = match existing {
            Some(previous) => (previous.expenses, previous.driver_notes, previous.live),
            None => (Vec::new(), None, false),
        };

        Ok(Shipment {
            code,
            status: draft.status,
            origin: draft.origin,
            origin_coordinates,
            destination: draft.destination,
            destination_address: draft.destination_address,
            destination_coordinates,
            current: CurrentLocation {
                city: draft.current_city,
                state: short_state(&draft.current_state),
                address: None,
                coordinates: current_coordinates,
            },
            last_update: Utc::now(),
            updated_by: Some(draft.registered_by),
            estimated_delivery,
            message: draft
                .message
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            notes: draft.notes,
            driver_notes,
            driver: draft.driver,
            live,
            progress,
            expenses,
        })
    }

    /// Forward geocode, degrading provider errors to absence.
    async fn forward_or_none(&self, place: &str) -> Option<Coordinate> {
        if place.trim().is_empty() {
            return None;
        }
        match self.geocoder.forward(place).await {
            Ok(position) => position,
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", place, e);
                None
            }
        }
    }

    /// Estimator output, promoted to 100 inside the arrival radius.
    ///
    /// The promotion only applies on a fully geocoded route; an unknown
    /// endpoint still reads "not started".
    fn effective_progress(
        &self,
        origin: Option<Coordinate>,
        destination: Option<Coordinate>,
        current: Coordinate,
    ) -> u8 {
        let percent = trip_progress(origin, destination, current);
        if let (Some(_), Some(dest)) = (origin, destination) {
            if current.distance_km(dest) <= self.tracking.arrival_radius_km {
                return 100;
            }
        }
        percent
    }
}
