//! Database error types.
//!
//! Provides the error taxonomy shared by binding, planning and execution.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Feature is not implemented.
    NotImplemented = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// Query was interrupted.
    Interrupted = 0x0004,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,

    // Bind errors (0x0200 - 0x02FF)
    /// Expression or function could not be bound.
    BindError = 0x0200,
    /// Type mismatch.
    TypeMismatch = 0x0201,
    /// Column not found.
    ColumnNotFound = 0x0202,
    /// Function not found.
    FunctionNotFound = 0x0203,

    // Execution errors (0x0300 - 0x03FF)
    /// Nested value has fewer entries than requested.
    NotEnoughElements = 0x0300,
    /// Value conversion failed.
    Conversion = 0x0301,
    /// Vector or chunk capacity exceeded.
    CapacityExceeded = 0x0302,
    /// Query execution failed.
    ExecutionFailed = 0x0303,

    // Catalog errors (0x0400 - 0x04FF)
    /// Catalog entry already exists.
    CatalogEntryExists = 0x0400,
    /// Catalog entry not found.
    CatalogEntryNotFound = 0x0401,

    // Configuration errors (0x0500 - 0x05FF)
    /// Invalid configuration.
    InvalidConfig = 0x0500,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Bind",
            0x03 => "Execution",
            0x04 => "Catalog",
            0x05 => "Config",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The main error type for Strata.
///
/// Bind-time variants abort a query before the first chunk is pulled;
/// execution-time variants abort the in-flight query. Nothing is retried.
///
/// # Example
///
/// ```rust
/// use strata_common::error::{StrataError, StrataResult};
///
/// fn lookup(key: &str) -> StrataResult<usize> {
///     Err(StrataError::bind(format!("Could not find key \"{key}\" in struct")))
/// }
///
/// assert!(lookup("x").unwrap_err().is_bind_time());
/// ```
#[derive(Debug, Error)]
pub enum StrataError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Feature is recognized but not implemented.
    #[error("not implemented: {feature}")]
    NotImplemented {
        /// The unimplemented feature.
        feature: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Query was interrupted by the connection.
    #[error("query interrupted")]
    Interrupted,

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // Bind Errors
    // ==========================================================================
    /// Expression or function could not be bound.
    #[error("binder error: {message}")]
    Bind {
        /// Error message.
        message: String,
    },

    /// Type mismatch.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Column not found.
    #[error("column '{column}' not found")]
    ColumnNotFound {
        /// The missing column.
        column: String,
    },

    /// Function not found.
    #[error("function '{name}' does not exist")]
    FunctionNotFound {
        /// The missing function.
        name: String,
    },

    // ==========================================================================
    // Execution Errors
    // ==========================================================================
    /// Nested value has fewer entries than requested.
    #[error("not enough entries: requested index {requested}, only {available} available")]
    NotEnoughElements {
        /// Requested index.
        requested: usize,
        /// Number of entries present.
        available: usize,
    },

    /// Value conversion failed.
    #[error("conversion error: {message}")]
    Conversion {
        /// Error message.
        message: String,
    },

    /// Vector or chunk capacity exceeded.
    #[error("row count {count} exceeds capacity {capacity}")]
    CapacityExceeded {
        /// Requested row count.
        count: usize,
        /// Maximum allowed row count.
        capacity: usize,
    },

    /// Query execution failed.
    #[error("query execution failed: {reason}")]
    ExecutionFailed {
        /// Reason for failure.
        reason: String,
    },

    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// Catalog entry already exists.
    #[error("{kind} '{name}' already exists")]
    CatalogEntryExists {
        /// Entry kind (schema, table, ...).
        kind: &'static str,
        /// Qualified entry name.
        name: String,
    },

    /// Catalog entry not found.
    #[error("{kind} '{name}' does not exist")]
    CatalogEntryNotFound {
        /// Entry kind (schema, table, ...).
        kind: &'static str,
        /// Qualified entry name.
        name: String,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// The underlying TOML error.
        #[from]
        source: toml::de::Error,
    },

    /// Configuration could not be serialized.
    #[error("failed to serialize configuration: {source}")]
    ConfigSerialize {
        /// The underlying TOML error.
        #[from]
        source: toml::ser::Error,
    },
}

impl StrataError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::NotImplemented { .. } => ErrorCode::NotImplemented,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Interrupted => ErrorCode::Interrupted,
            Self::Io { .. } => ErrorCode::Io,
            Self::Bind { .. } => ErrorCode::BindError,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::FunctionNotFound { .. } => ErrorCode::FunctionNotFound,
            Self::NotEnoughElements { .. } => ErrorCode::NotEnoughElements,
            Self::Conversion { .. } => ErrorCode::Conversion,
            Self::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            Self::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
            Self::CatalogEntryExists { .. } => ErrorCode::CatalogEntryExists,
            Self::CatalogEntryNotFound { .. } => ErrorCode::CatalogEntryNotFound,
            Self::InvalidConfig { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigSerialize { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// Returns true if this error is raised while binding or planning,
    /// before any chunk is produced.
    #[must_use]
    pub const fn is_bind_time(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. }
                | Self::ColumnNotFound { .. }
                | Self::FunctionNotFound { .. }
                | Self::NotImplemented { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a not-implemented error.
    #[must_use]
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a binder error.
    #[must_use]
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a conversion error.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}
