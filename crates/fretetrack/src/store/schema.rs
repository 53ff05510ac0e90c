//! `SQLite` schema definitions for fretetrack.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the shipments table.
///
/// One row per shipment, keyed by the tracking code. The expense history
/// rides along as a JSON document, mirroring the record-per-code shape the
/// dashboard persists.
pub const CREATE_SHIPMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS shipments (
    code TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    origin TEXT NOT NULL,
    origin_lat REAL,
    origin_lon REAL,
    destination TEXT NOT NULL,
    destination_address TEXT,
    destination_lat REAL,
    destination_lon REAL,
    current_city TEXT NOT NULL,
    current_state TEXT NOT NULL,
    current_address TEXT,
    current_lat REAL NOT NULL,
    current_lon REAL NOT NULL,
    last_update TEXT NOT NULL,
    updated_by TEXT,
    estimated_delivery TEXT,
    message TEXT NOT NULL,
    notes TEXT,
    driver_notes TEXT,
    driver_id TEXT,
    driver_name TEXT,
    live INTEGER NOT NULL DEFAULT 0,
    progress INTEGER NOT NULL DEFAULT 0,
    expenses TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on status for dashboard filtering.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_shipments_status ON shipments(status)
";

/// SQL statement to create an index on `driver_id` for driver views.
pub const CREATE_DRIVER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_shipments_driver ON shipments(driver_id)
";

/// SQL statement to create an index on `last_update` for recency ordering.
pub const CREATE_UPDATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_shipments_update ON shipments(last_update DESC)
";

/// SQL statement to create the admin accounts table.
pub const CREATE_ADMINS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS admins (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL
)
";

/// SQL statement to create the drivers table.
pub const CREATE_DRIVERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS drivers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    phone TEXT
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SHIPMENTS_TABLE,
    CREATE_STATUS_INDEX,
    CREATE_DRIVER_INDEX,
    CREATE_UPDATE_INDEX,
    CREATE_ADMINS_TABLE,
    CREATE_DRIVERS_TABLE,
    CREATE_METADATA_TABLE,
];
