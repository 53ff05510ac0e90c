//! Storage layer for fretetrack.
//!
//! This module provides `SQLite`-based persistent storage for shipments and
//! accounts, behind small repository traits so the tracking service stays
//! decoupled from the storage engine.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::account::{AdminAccount, Driver};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::shipment::{CurrentLocation, DriverRef, Shipment, ShipmentStatus};

/// Keyed persistence of shipment records.
///
/// Writes are last-write-wins full-record replacements; there is no
/// transactional guarantee across records and none is required.
pub trait ShipmentRepository {
    /// Fetch a shipment by tracking code.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn get(&self, code: &str) -> Result<Option<Shipment>>;

    /// Insert or replace a shipment, keyed by its code.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn put(&self, shipment: &Shipment) -> Result<()>;

    /// Delete a shipment. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn delete(&self, code: &str) -> Result<bool>;

    /// All shipments, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn list(&self) -> Result<Vec<Shipment>>;
}

/// Persistence of admin and driver accounts.
pub trait AccountRepository {
    /// All admin accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn admins(&self) -> Result<Vec<AdminAccount>>;

    /// Look up an admin by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>>;

    /// Add a new admin account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccount`] if the username is taken, or an
    /// error if the underlying storage fails.
    fn put_admin(&self, account: &AdminAccount) -> Result<()>;

    /// Remove an admin account. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LastAdmin`] when it would empty the admins table,
    /// or an error if the underlying storage fails.
    fn delete_admin(&self, username: &str) -> Result<bool>;

    /// All driver accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn drivers(&self) -> Result<Vec<Driver>>;

    /// Look up a driver by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn find_driver(&self, name: &str) -> Result<Option<Driver>>;

    /// Add a new driver account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccount`] if the name is taken, or an
    /// error if the underlying storage fails.
    fn put_driver(&self, driver: &Driver) -> Result<()>;

    /// Remove a driver account. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn delete_driver(&self, id: &str) -> Result<bool>;
}

/// `SQLite`-backed store for shipments and accounts.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed the given admin account if the admins table is empty.
    ///
    /// Returns `true` if the account was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_admin(&self, account: &AdminAccount) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }

        self.conn.execute(
            "INSERT INTO admins (username, password) VALUES (?1, ?2)",
            params![account.username, account.password],
        )?;
        info!("Seeded initial admin account '{}'", account.username);
        Ok(true)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let total_shipments: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM shipments", [], |row| row.get(0))?;

        let delivered: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shipments WHERE status = 'delivered'",
            [],
            |row| row.get(0),
        )?;

        let in_transit: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shipments WHERE status = 'in_transit'",
            [],
            |row| row.get(0),
        )?;

        let drivers: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM drivers", [], |row| row.get(0))?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT last_update FROM shipments ORDER BY last_update DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let newest_update = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        // Get database file size
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            total_shipments,
            delivered,
            in_transit,
            drivers,
            newest_update,
            db_size_bytes,
        })
    }

    /// Convert a database row to a Shipment struct.
    fn row_to_shipment(row: &rusqlite::Row) -> rusqlite::Result<Shipment> {
        let code: String = row.get(0)?;
        let status_str: String = row.get(1)?;
        let origin: String = row.get(2)?;
        let origin_lat: Option<f64> = row.get(3)?;
        let origin_lon: Option<f64> = row.get(4)?;
        let destination: String = row.get(5)?;
        let destination_address: Option<String> = row.get(6)?;
        let destination_lat: Option<f64> = row.get(7)?;
        let destination_lon: Option<f64> = row.get(8)?;
        let current_city: String = row.get(9)?;
        let current_state: String = row.get(10)?;
        let current_address: Option<String> = row.get(11)?;
        let current_lat: f64 = row.get(12)?;
        let current_lon: f64 = row.get(13)?;
        let last_update_str: String = row.get(14)?;
        let updated_by: Option<String> = row.get(15)?;
        let estimated_delivery_str: Option<String> = row.get(16)?;
        let message: String = row.get(17)?;
        let notes: Option<String> = row.get(18)?;
        let driver_notes: Option<String> = row.get(19)?;
        let driver_id: Option<String> = row.get(20)?;
        let driver_name: Option<String> = row.get(21)?;
        let live: bool = row.get(22)?;
        let progress: i64 = row.get(23)?;
        let expenses_json: String = row.get(24)?;

        let status = status_str.parse().unwrap_or_else(|_| {
            warn!("Unknown shipment status '{}', defaulting to pending", status_str);
            ShipmentStatus::Pending
        });

        let last_update = DateTime::parse_from_rfc3339(&last_update_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        let estimated_delivery =
            estimated_delivery_str.and_then(|s| s.parse::<chrono::NaiveDate>().ok());

        let expenses = serde_json::from_str(&expenses_json).unwrap_or_else(|e| {
            warn!("Discarding unreadable expense history for {}: {}", code, e);
            Vec::new()
        });

        let driver = match (driver_id, driver_name) {
            (Some(id), Some(name)) => Some(DriverRef { id, name }),
            _ => None,
        };

        Ok(Shipment {
            code,
            status,
            origin,
            origin_coordinates: pair_to_coordinate(origin_lat, origin_lon),
            destination,
            destination_address,
            destination_coordinates: pair_to_coordinate(destination_lat, destination_lon),
            current: CurrentLocation {
                city: current_city,
                state: current_state,
                address: current_address,
                coordinates: Coordinate::new(current_lat, current_lon),
            },
            last_update,
            updated_by,
            estimated_delivery,
            message,
            notes,
            driver_notes,
            driver,
            live,
            progress: u8::try_from(progress.clamp(0, 100)).unwrap_or(0),
            expenses,
        })
    }

    /// Convert a database row to a Driver struct.
    fn row_to_driver(row: &rusqlite::Row) -> rusqlite::Result<Driver> {
        Ok(Driver {
            id: row.get(0)?,
            name: row.get(1)?,
            password: row.get(2)?,
            phone: row.get(3)?,
        })
    }
}

/// All columns of the shipments table, in `row_to_shipment` order.
const SHIPMENT_COLUMNS: &str = "code, status, origin, origin_lat, origin_lon, \
     destination, destination_address, destination_lat, destination_lon, \
     current_city, current_state, current_address, current_lat, current_lon, \
     last_update, updated_by, estimated_delivery, message, notes, driver_notes, \
     driver_id, driver_name, live, progress, expenses";

fn pair_to_coordinate(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinate> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    }
}

impl ShipmentRepository for SqliteStore {
    fn get(&self, code: &str) -> Result<Option<Shipment>> {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE code = ?1");
        let result = self
            .conn
            .query_row(&sql, [code], Self::row_to_shipment)
            .optional()?;
        Ok(result)
    }

    fn put(&self, shipment: &Shipment) -> Result<()> {
        let expenses_json = serde_json::to_string(&shipment.expenses)?;

        self.conn.execute(
            r"
            INSERT OR REPLACE INTO shipments (
                code, status, origin, origin_lat, origin_lon,
                destination, destination_address, destination_lat, destination_lon,
                current_city, current_state, current_address, current_lat, current_lon,
                last_update, updated_by, estimated_delivery, message, notes, driver_notes,
                driver_id, driver_name, live, progress, expenses
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
            )
            ",
            params![
                shipment.code,
                shipment.status.to_string(),
                shipment.origin,
                shipment.origin_coordinates.map(|c| c.lat),
                shipment.origin_coordinates.map(|c| c.lon),
                shipment.destination,
                shipment.destination_address,
                shipment.destination_coordinates.map(|c| c.lat),
                shipment.destination_coordinates.map(|c| c.lon),
                shipment.current.city,
                shipment.current.state,
                shipment.current.address,
                shipment.current.coordinates.lat,
                shipment.current.coordinates.lon,
                shipment.last_update.to_rfc3339(),
                shipment.updated_by,
                shipment.estimated_delivery.map(|d| d.to_string()),
                shipment.message,
                shipment.notes,
                shipment.driver_notes,
                shipment.driver.as_ref().map(|d| d.id.clone()),
                shipment.driver.as_ref().map(|d| d.name.clone()),
                shipment.live,
                i64::from(shipment.progress),
                expenses_json,
            ],
        )?;

        debug!("Stored shipment {}", shipment.code);
        Ok(())
    }

    fn delete(&self, code: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM shipments WHERE code = ?1", [code])?;
        Ok(affected > 0)
    }

    fn list(&self) -> Result<Vec<Shipment>> {
        let sql =
            format!("SELECT {SHIPMENT_COLUMNS} FROM shipments ORDER BY last_update DESC");
        let mut stmt = self.conn.prepare(&sql)?;

        let shipments = stmt
            .query_map([], Self::row_to_shipment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(shipments)
    }
}

impl AccountRepository for SqliteStore {
    fn admins(&self) -> Result<Vec<AdminAccount>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, password FROM admins ORDER BY username")?;

        let admins = stmt
            .query_map([], |row| {
                Ok(AdminAccount {
                    username: row.get(0)?,
                    password: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(admins)
    }

    fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>> {
        let result = self
            .conn
            .query_row(
                "SELECT username, password FROM admins WHERE username = ?1",
                [username],
                |row| {
                    Ok(AdminAccount {
                        username: row.get(0)?,
                        password: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    fn put_admin(&self, account: &AdminAccount) -> Result<()> {
        if self.find_admin(&account.username)?.is_some() {
            return Err(Error::DuplicateAccount {
                username: account.username.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO admins (username, password) VALUES (?1, ?2)",
            params![account.username, account.password],
        )?;
        Ok(())
    }

    fn delete_admin(&self, username: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
        if count <= 1 {
            return Err(Error::LastAdmin);
        }

        let affected = self
            .conn
            .execute("DELETE FROM admins WHERE username = ?1", [username])?;
        Ok(affected > 0)
    }

    fn drivers(&self) -> Result<Vec<Driver>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, password, phone FROM drivers ORDER BY name")?;

        let drivers = stmt
            .query_map([], Self::row_to_driver)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(drivers)
    }

    fn find_driver(&self, name: &str) -> Result<Option<Driver>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, password, phone FROM drivers WHERE name = ?1",
                [name],
                Self::row_to_driver,
            )
            .optional()?;
        Ok(result)
    }

    fn put_driver(&self, driver: &Driver) -> Result<()> {
        if self.find_driver(&driver.name)?.is_some() {
            return Err(Error::DuplicateAccount {
                username: driver.name.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO drivers (id, name, password, phone) VALUES (?1, ?2, ?3, ?4)",
            params![driver.id, driver.name, driver.password, driver.phone],
        )?;
        Ok(())
    }

    fn delete_driver(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM drivers WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of shipments stored.
    pub total_shipments: i64,
    /// Number of delivered shipments.
    pub delivered: i64,
    /// Number of shipments currently in transit.
    pub in_transit: i64,
    /// Number of registered drivers.
    pub drivers: i64,
    /// Timestamp of the most recent shipment update.
    pub newest_update: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
