//! System-wide constants for Strata.
//!
//! This module defines constants used across the execution engine.

// =============================================================================
// Vector and Chunk Constants
// =============================================================================

/// Maximum number of rows in a single vector or data chunk.
///
/// Every top-level vector flowing between operators holds at most this many
/// rows. The flattened element child of a LIST vector lives in element space
/// and is not bound by it.
pub const STANDARD_VECTOR_SIZE: usize = 1024;

/// Number of validity bits stored per mask word.
pub const VALIDITY_BITS_PER_WORD: usize = 64;

// =============================================================================
// Catalog Constants
// =============================================================================

/// Schema used when a statement does not name one.
pub const DEFAULT_SCHEMA: &str = "main";

/// Maximum length of a catalog identifier (schema, table, column).
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

// =============================================================================
// Function Constants
// =============================================================================

/// Name of the field reported for the element child of a LIST vector.
pub const LIST_CHILD_NAME: &str = "child";

/// Default starting value of a sequence.
pub const DEFAULT_SEQUENCE_START: i64 = 1;

/// Default increment of a sequence.
pub const DEFAULT_SEQUENCE_INCREMENT: i64 = 1;
