//! Error types for fretetrack.
//!
//! This module defines all error types used throughout the fretetrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fretetrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Shipment Errors ===
    /// No shipment exists under the given tracking code.
    #[error("no shipment registered under code '{code}'")]
    ShipmentNotFound {
        /// The tracking code that was looked up.
        code: String,
    },

    /// A shipment with this code already exists.
    #[error("a shipment with code '{code}' already exists")]
    DuplicateShipment {
        /// The conflicting tracking code.
        code: String,
    },

    /// The tracking code does not match the configured pattern.
    #[error("invalid tracking code '{code}' (expected {prefix}-NNN)")]
    InvalidCode {
        /// The rejected code.
        code: String,
        /// The configured code prefix.
        prefix: String,
    },

    // === Account Errors ===
    /// Username/password pair did not match any account.
    #[error("invalid credentials for '{username}'")]
    InvalidCredentials {
        /// The login name that failed.
        username: String,
    },

    /// An account with this name already exists.
    #[error("account '{username}' already exists")]
    DuplicateAccount {
        /// The conflicting login name.
        username: String,
    },

    /// Refused to delete the last remaining admin account.
    #[error("cannot remove the last admin account")]
    LastAdmin,

    /// No such account.
    #[error("unknown account '{username}'")]
    UnknownAccount {
        /// The login name that was looked up.
        username: String,
    },

    // === Geocoding Errors ===
    /// The geocoding provider failed.
    #[error("geocoding failed for '{place}': {message}")]
    Geocoding {
        /// The place that was being resolved.
        place: String,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fretetrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a shipment-not-found error.
    #[must_use]
    pub fn shipment_not_found(code: impl Into<String>) -> Self {
        Self::ShipmentNotFound { code: code.into() }
    }

    /// Create a geocoding error.
    #[must_use]
    pub fn geocoding(place: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Geocoding {
            place: place.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the looked-up shipment does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ShipmentNotFound { .. })
    }

    /// Check if this error is an authentication failure.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::shipment_not_found("FRETE-404");
        assert_eq!(
            err.to_string(),
            "no shipment registered under code 'FRETE-404'"
        );

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_not_found() {
        assert!(Error::shipment_not_found("FRETE-001").is_not_found());
        assert!(!Error::LastAdmin.is_not_found());
    }

    #[test]
    fn test_error_is_auth_error() {
        let err = Error::InvalidCredentials {
            username: "admin".to_string(),
        };
        assert!(err.is_auth_error());
        assert!(!Error::LastAdmin.is_auth_error());
    }

    #[test]
    fn test_invalid_code_display() {
        let err = Error::InvalidCode {
            code: "XYZ".to_string(),
            prefix: "FRETE".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("XYZ"));
        assert!(msg.contains("FRETE-NNN"));
    }

    #[test]
    fn test_geocoding_error_display() {
        let err = Error::geocoding("Salvador, BA", "timeout");
        let msg = err.to_string();
        assert!(msg.contains("Salvador, BA"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_duplicate_shipment_display() {
        let err = Error::DuplicateShipment {
            code: "FRETE-001".to_string(),
        };
        assert!(err.to_string().contains("FRETE-001"));
    }

    #[test]
    fn test_last_admin_display() {
        assert_eq!(
            Error::LastAdmin.to_string(),
            "cannot remove the last admin account"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "empty code prefix".to_string(),
        };
        assert!(err.to_string().contains("empty code prefix"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
