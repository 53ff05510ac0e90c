//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::shipment::{ExpenseCategory, ShipmentStatus};

/// Locate command arguments (customer tracking query).
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// The tracking code to look up
    pub code: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Shipment management commands.
#[derive(Debug, Subcommand)]
pub enum ShipmentCommand {
    /// Register a new shipment
    Add(ShipmentForm),

    /// Revise an existing shipment
    Update {
        /// The tracking code to revise
        #[arg(id = "target_code", value_name = "CODE")]
        code: String,

        /// The revised shipment fields
        #[command(flatten)]
        form: ShipmentForm,
    },

    /// Show one shipment
    Show {
        /// The tracking code
        code: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List all shipments
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Remove a shipment
    Remove {
        /// The tracking code
        code: String,
    },
}

/// Fields of the shipment registration form.
#[derive(Debug, Args)]
pub struct ShipmentForm {
    /// Tracking code (generated when omitted)
    #[arg(long)]
    pub code: Option<String>,

    /// Origin place name, e.g. "São Paulo, SP"
    #[arg(short, long)]
    pub origin: String,

    /// Destination place name
    #[arg(short, long)]
    pub destination: String,

    /// Street-level destination address
    #[arg(long)]
    pub destination_address: Option<String>,

    /// City the truck is currently in
    #[arg(long)]
    pub city: String,

    /// State of the current city
    #[arg(long)]
    pub state: String,

    /// Initial status
    #[arg(short, long, value_enum, default_value = "in-transit")]
    pub status: StatusArg,

    /// Customer-facing message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Internal admin notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Estimated delivery date (YYYY-MM-DD)
    #[arg(long)]
    pub eta: Option<chrono::NaiveDate>,

    /// Name of the driver to assign
    #[arg(long)]
    pub driver: Option<String>,

    /// Who is saving the record
    #[arg(long, default_value = "admin")]
    pub by: String,
}

/// Position report command arguments (driver GPS push).
#[derive(Debug, Args)]
pub struct PositionCommand {
    /// The tracking code
    pub code: String,

    /// Latitude of the GPS fix in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the GPS fix in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Who is reporting
    #[arg(long, default_value = "driver")]
    pub by: String,

    /// Driver notes to attach
    #[arg(long)]
    pub notes: Option<String>,

    /// Mark the shipment as delivered
    #[arg(long)]
    pub complete: bool,
}

/// Expense logging command arguments.
#[derive(Debug, Args)]
pub struct ExpenseCommand {
    /// The tracking code
    pub code: String,

    /// Expense category
    #[arg(long, value_enum)]
    pub category: CategoryArg,

    /// Free-text description
    #[arg(long)]
    pub description: String,

    /// Amount in BRL
    #[arg(long)]
    pub value: f64,
}

/// Receipt command arguments.
#[derive(Debug, Args)]
pub struct ReceiptCommand {
    /// The tracking code
    pub code: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Driver account commands.
#[derive(Debug, Subcommand)]
pub enum DriverCommand {
    /// Register a driver account
    Add {
        /// Driver full name
        name: String,

        /// Login password
        #[arg(short, long)]
        password: String,

        /// Contact phone
        #[arg(long)]
        phone: Option<String>,
    },

    /// List driver accounts
    List,

    /// Remove a driver account
    Remove {
        /// Driver id
        id: String,
    },
}

/// Admin account commands.
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Create an admin account
    Add {
        /// Login name
        username: String,

        /// Login password
        #[arg(short, long)]
        password: String,
    },

    /// List admin accounts
    List,

    /// Remove an admin account
    Remove {
        /// Login name
        username: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Shipment status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Waiting for pickup
    Pending,
    /// On the road
    InTransit,
    /// Stopped for rest or loading
    Stopped,
    /// Delivered
    Delivered,
    /// Running late
    Delayed,
    /// Held up by an incident
    Exception,
}

impl From<StatusArg> for ShipmentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::InTransit => Self::InTransit,
            StatusArg::Stopped => Self::Stopped,
            StatusArg::Delivered => Self::Delivered,
            StatusArg::Delayed => Self::Delayed,
            StatusArg::Exception => Self::Exception,
        }
    }
}

/// Expense category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Fuel stops
    Fuel,
    /// Vehicle maintenance
    Maintenance,
    /// Meals on the road
    Meals,
    /// Anything else
    Other,
}

impl From<CategoryArg> for ExpenseCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Fuel => Self::Fuel,
            CategoryArg::Maintenance => Self::Maintenance,
            CategoryArg::Meals => Self::Meals,
            CategoryArg::Other => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(
            ShipmentStatus::from(StatusArg::Pending),
            ShipmentStatus::Pending
        );
        assert_eq!(
            ShipmentStatus::from(StatusArg::InTransit),
            ShipmentStatus::InTransit
        );
        assert_eq!(
            ShipmentStatus::from(StatusArg::Delivered),
            ShipmentStatus::Delivered
        );
        assert_eq!(
            ShipmentStatus::from(StatusArg::Exception),
            ShipmentStatus::Exception
        );
    }

    #[test]
    fn test_category_arg_conversion() {
        assert_eq!(
            ExpenseCategory::from(CategoryArg::Fuel),
            ExpenseCategory::Fuel
        );
        assert_eq!(
            ExpenseCategory::from(CategoryArg::Maintenance),
            ExpenseCategory::Maintenance
        );
        assert_eq!(
            ExpenseCategory::from(CategoryArg::Meals),
            ExpenseCategory::Meals
        );
        assert_eq!(
            ExpenseCategory::from(CategoryArg::Other),
            ExpenseCategory::Other
        );
    }

    #[test]
    fn test_locate_command_debug() {
        let cmd = LocateCommand {
            code: "FRETE-001".to_string(),
            json: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("FRETE-001"));
    }

    #[test]
    fn test_position_command_debug() {
        let cmd = PositionCommand {
            code: "FRETE-001".to_string(),
            lat: -15.7942,
            lon: -47.8822,
            by: "driver".to_string(),
            notes: None,
            complete: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("lat"));
        assert!(debug_str.contains("-15.7942"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
