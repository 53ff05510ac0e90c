//! Command-line interface for fretetrack.
//!
//! This module provides the CLI structure and command handlers for the
//! `fretrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AdminCommand, CategoryArg, ConfigCommand, DriverCommand, ExpenseCommand, LocateCommand,
    PositionCommand, ReceiptCommand, ShipmentCommand, ShipmentForm, StatusArg, StatusCommand,
};

/// fretrack - Road freight shipment tracking
///
/// Registers shipments, records GPS position reports from the road, and
/// answers customer tracking queries with an estimated trip progress.
#[derive(Debug, Parser)]
#[command(name = "fretrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a shipment by tracking code
    Locate(LocateCommand),

    /// Manage shipments
    #[command(subcommand)]
    Shipment(ShipmentCommand),

    /// Record a GPS position report
    Position(PositionCommand),

    /// Log a trip expense
    Expense(ExpenseCommand),

    /// Produce a delivery receipt
    Receipt(ReceiptCommand),

    /// Manage driver accounts
    #[command(subcommand)]
    Driver(DriverCommand),

    /// Manage admin accounts
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
