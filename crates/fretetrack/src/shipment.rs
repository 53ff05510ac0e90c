//! Core shipment types for fretetrack.
//!
//! This module defines the shipment record persisted by the store, its
//! status vocabulary, the driver expense ledger, and tracking-code helpers.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Lifecycle status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Waiting for pickup.
    Pending,
    /// On the road toward the destination.
    InTransit,
    /// Stopped for rest or loading.
    Stopped,
    /// Delivered at the destination.
    Delivered,
    /// Running behind the estimated delivery.
    Delayed,
    /// Held up by an incident (customs, breakdown, retention).
    Exception,
}

impl ShipmentStatus {
    /// Customer-facing label, in Brazilian Portuguese.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Aguardando Coleta",
            Self::InTransit => "Em Trânsito",
            Self::Stopped => "Parado / Descanso",
            Self::Delivered => "Entregue",
            Self::Delayed => "Atrasado",
            Self::Exception => "Problema / Retido",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Stopped => write!(f, "stopped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Delayed => write!(f, "delayed"),
            Self::Exception => write!(f, "exception"),
        }
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_transit" => Ok(Self::InTransit),
            "stopped" => Ok(Self::Stopped),
            "delivered" => Ok(Self::Delivered),
            "delayed" => Ok(Self::Delayed),
            "exception" => Ok(Self::Exception),
            other => Err(format!("unknown shipment status: {other}")),
        }
    }
}

/// Category of a driver expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Fuel stops.
    Fuel,
    /// Vehicle maintenance and repair.
    Maintenance,
    /// Meals on the road.
    Meals,
    /// Anything else.
    Other,
}

impl ExpenseCategory {
    /// Receipt label, in Brazilian Portuguese.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fuel => "Combustível",
            Self::Maintenance => "Manutenção",
            Self::Meals => "Alimentação",
            Self::Other => "Outros",
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fuel => write!(f, "fuel"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Meals => write!(f, "meals"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A single expense logged by the driver during the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Identifier unique within the shipment.
    pub id: String,
    /// What kind of expense this is.
    pub category: ExpenseCategory,
    /// Free-text description ("Posto Graal BR-116", ...).
    pub description: String,
    /// Amount in BRL.
    pub value: f64,
    /// When the expense was logged.
    pub date: DateTime<Utc>,
}

/// Where the truck currently is, as last reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentLocation {
    /// City name.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Street-level detail when reverse geocoding resolved one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// The GPS fix itself.
    pub coordinates: Coordinate,
}

/// The driver assigned to a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRef {
    /// Driver account id.
    pub id: String,
    /// Driver display name, cached on the shipment.
    pub name: String,
}

/// A tracked shipment, keyed by its tracking code.
///
/// This is the record the store persists and the dashboard renders. The
/// endpoint coordinates are optional: they stay absent until geocoding
/// resolves the free-text origin/destination, and the progress estimator
/// treats an absent endpoint as "not started".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique tracking code, e.g. `FRETE-014`.
    pub code: String,
    /// Lifecycle status.
    pub status: ShipmentStatus,
    /// Free-text origin place name.
    pub origin: String,
    /// Geocoded origin, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_coordinates: Option<Coordinate>,
    /// Free-text destination place name.
    pub destination: String,
    /// Street-level destination detail shown on the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    /// Geocoded destination, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_coordinates: Option<Coordinate>,
    /// Last reported position.
    pub current: CurrentLocation,
    /// When the record was last written.
    pub last_update: DateTime<Utc>,
    /// Who wrote it (admin username or driver name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Estimated delivery date shown to the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<chrono::NaiveDate>,
    /// Customer-facing status message.
    pub message: String,
    /// Internal notes written by the admin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Notes written by the driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_notes: Option<String>,
    /// Assigned driver, when one is linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverRef>,
    /// Whether live GPS reporting is active for this shipment.
    pub live: bool,
    /// Percent complete, 0–100.
    pub progress: u8,
    /// Expense history for the trip.
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Shipment {
    /// Create a new pending shipment with the given code and endpoints.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        current: CurrentLocation,
    ) -> Self {
        Self {
            code: code.into(),
            status: ShipmentStatus::Pending,
            origin: origin.into(),
            origin_coordinates: None,
            destination: destination.into(),
            destination_address: None,
            destination_coordinates: None,
            current,
            last_update: Utc::now(),
            updated_by: None,
            estimated_delivery: None,
            message: String::new(),
            notes: None,
            driver_notes: None,
            driver: None,
            live: false,
            progress: 0,
            expenses: Vec::new(),
        }
    }

    /// Total of all logged expenses in BRL.
    #[must_use]
    pub fn expense_total(&self) -> f64 {
        self.expenses.iter().map(|e| e.value).sum()
    }

    /// Remaining straight-line distance to the destination in kilometers,
    /// when the destination has been geocoded.
    #[must_use]
    pub fn remaining_km(&self) -> Option<f64> {
        self.destination_coordinates
            .map(|dest| self.current.coordinates.distance_km(dest))
    }

    /// Short timestamp shown in the dashboard update log, `"HH:MM - DD/MM"`.
    #[must_use]
    pub fn update_stamp(&self) -> String {
        self.last_update.format("%H:%M - %d/%m").to_string()
    }
}

/// Check whether a tracking code matches the `PREFIX-NNN` shape.
#[must_use]
pub fn is_valid_code(code: &str, prefix: &str) -> bool {
    code_pattern(prefix).is_match(code)
}

/// The next free tracking code for the given prefix.
///
/// Scans existing codes for the `PREFIX-NNN` pattern (a missing dash is
/// tolerated, matching historical records) and returns the successor of the
/// highest sequence number, zero-padded to three digits.
#[must_use]
pub fn next_code<'a>(existing: impl IntoIterator<Item = &'a str>, prefix: &str) -> String {
    let pattern = code_pattern(prefix);
    let max_id = existing
        .into_iter()
        .filter_map(|code| {
            pattern
                .captures(code)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .max()
        .unwrap_or(0);

    format!("{prefix}-{:03}", max_id + 1)
}

fn code_pattern(prefix: &str) -> Regex {
    // The prefix comes from configuration and is validated to be
    // alphanumeric, so escaping is not required here.
    Regex::new(&format!("^{prefix}-?(\\d+)$")).expect("code pattern is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_location() -> CurrentLocation {
        CurrentLocation {
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            address: None,
            coordinates: Coordinate::new(-23.5505, -46.6333),
        }
    }

    fn sample_shipment() -> Shipment {
        Shipment::new("FRETE-001", "São Paulo, SP", "Salvador, BA", sample_location())
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ShipmentStatus::Pending.label(), "Aguardando Coleta");
        assert_eq!(ShipmentStatus::InTransit.label(), "Em Trânsito");
        assert_eq!(ShipmentStatus::Stopped.label(), "Parado / Descanso");
        assert_eq!(ShipmentStatus::Delivered.label(), "Entregue");
        assert_eq!(ShipmentStatus::Delayed.label(), "Atrasado");
        assert_eq!(ShipmentStatus::Exception.label(), "Problema / Retido");
    }

    #[test]
    fn test_status_display_roundtrip() {
        for status in [
            ShipmentStatus::Pending,
            ShipmentStatus::InTransit,
            ShipmentStatus::Stopped,
            ShipmentStatus::Delivered,
            ShipmentStatus::Delayed,
            ShipmentStatus::Exception,
        ] {
            let parsed: ShipmentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_parse_unknown() {
        let result: Result<ShipmentStatus, _> = "teleported".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_expense_category_labels() {
        assert_eq!(ExpenseCategory::Fuel.label(), "Combustível");
        assert_eq!(ExpenseCategory::Maintenance.label(), "Manutenção");
        assert_eq!(ExpenseCategory::Meals.label(), "Alimentação");
        assert_eq!(ExpenseCategory::Other.label(), "Outros");
    }

    #[test]
    fn test_new_shipment_defaults() {
        let shipment = sample_shipment();
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(shipment.progress, 0);
        assert!(!shipment.live);
        assert!(shipment.origin_coordinates.is_none());
        assert!(shipment.destination_coordinates.is_none());
        assert!(shipment.expenses.is_empty());
    }

    #[test]
    fn test_expense_total() {
        let mut shipment = sample_shipment();
        assert_eq!(shipment.expense_total(), 0.0);

        shipment.expenses.push(Expense {
            id: "1".to_string(),
            category: ExpenseCategory::Fuel,
            description: "Posto BR-116".to_string(),
            value: 350.50,
            date: Utc::now(),
        });
        shipment.expenses.push(Expense {
            id: "2".to_string(),
            category: ExpenseCategory::Meals,
            description: "Almoço".to_string(),
            value: 42.00,
            date: Utc::now(),
        });

        assert!((shipment.expense_total() - 392.50).abs() < 1e-9);
    }

    #[test]
    fn test_remaining_km_requires_destination() {
        let mut shipment = sample_shipment();
        assert!(shipment.remaining_km().is_none());

        shipment.destination_coordinates = Some(Coordinate::new(-12.9777, -38.5016));
        let remaining = shipment.remaining_km().unwrap();
        assert!((remaining - 1454.8).abs() < 1.0, "got {remaining}");
    }

    #[test]
    fn test_update_stamp_format() {
        let mut shipment = sample_shipment();
        shipment.last_update = "2026-03-09T14:05:00Z".parse().unwrap();
        assert_eq!(shipment.update_stamp(), "14:05 - 09/03");
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("FRETE-001", "FRETE"));
        assert!(is_valid_code("FRETE042", "FRETE"));
        assert!(!is_valid_code("RODO-001", "FRETE"));
        assert!(!is_valid_code("FRETE-", "FRETE"));
        assert!(!is_valid_code("FRETE-12A", "FRETE"));
    }

    #[test]
    fn test_next_code_empty() {
        assert_eq!(next_code([], "FRETE"), "FRETE-001");
    }

    #[test]
    fn test_next_code_increments_highest() {
        let existing = ["FRETE-001", "FRETE-007", "FRETE-003"];
        assert_eq!(next_code(existing, "FRETE"), "FRETE-008");
    }

    #[test]
    fn test_next_code_tolerates_missing_dash() {
        let existing = ["FRETE012"];
        assert_eq!(next_code(existing, "FRETE"), "FRETE-013");
    }

    #[test]
    fn test_next_code_ignores_foreign_codes() {
        let existing = ["RODO-099", "FRETE-002", "not-a-code"];
        assert_eq!(next_code(existing, "FRETE"), "FRETE-003");
    }

    #[test]
    fn test_next_code_pads_to_three_digits() {
        assert_eq!(next_code(["FRETE-099"], "FRETE"), "FRETE-100");
        assert_eq!(next_code(["FRETE-999"], "FRETE"), "FRETE-1000");
    }

    #[test]
    fn test_shipment_serialization_roundtrip() {
        let mut shipment = sample_shipment();
        shipment.destination_coordinates = Some(Coordinate::new(-12.9777, -38.5016));
        shipment.expenses.push(Expense {
            id: "1".to_string(),
            category: ExpenseCategory::Maintenance,
            description: "Troca de pneu".to_string(),
            value: 980.0,
            date: Utc::now(),
        });

        let json = serde_json::to_string(&shipment).unwrap();
        let back: Shipment = serde_json::from_str(&json).unwrap();
        assert_eq!(shipment, back);
    }

    #[test]
    fn test_shipment_json_omits_absent_fields() {
        let shipment = sample_shipment();
        let json = serde_json::to_string(&shipment).unwrap();
        assert!(!json.contains("origin_coordinates"));
        assert!(!json.contains("driver_notes"));
    }
}
