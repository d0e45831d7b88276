//! # strata-exec
//!
//! Vectorized execution core for Strata.
//!
//! This crate implements:
//! - Columnar vectors with nested LIST and STRUCT types, constant and
//!   dictionary (selection) views
//! - Data chunks, the batch unit passed between operators
//! - Scalar functions (`struct_pack`, `struct_extract`, operators) and
//!   aggregates (`list`, `count`, `sum`, `min`, `max`)
//! - Expression binding and vectorized evaluation
//! - Logical plans, a pull-based physical operator tree including UNNEST
//! - An in-memory catalog and client connections
//!
//! ## Example
//!
//! ```rust
//! use strata_exec::connection::Database;
//! use strata_exec::expression::parsed::{col, func, lit};
//! use strata_exec::logical::LogicalPlanBuilder;
//! use strata_exec::types::Value;
//!
//! let db = Database::in_memory().unwrap();
//! let conn = db.connect();
//!
//! let list = Value::list([Value::Integer(1), Value::Integer(2)]);
//! let plan = LogicalPlanBuilder::values(&["l"], vec![vec![lit(list)]])
//!     .unwrap()
//!     .select(vec![func("unnest", vec![col("l")])])
//!     .unwrap()
//!     .build();
//! assert_eq!(conn.query(&plan).row_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Logical types and values
pub mod types;

/// Column vectors
pub mod vector;

/// Data chunks
pub mod chunk;

/// Scalar and aggregate functions
pub mod function;

/// Parsed and bound expressions
pub mod expression;

/// Vectorized expression evaluation
pub mod executor;

/// Logical plans
pub mod logical;

/// Physical operators
pub mod physical;

/// Catalog and table storage
pub mod catalog;

/// Databases and connections
pub mod connection;

pub use chunk::DataChunk;
pub use connection::{Connection, Database, QueryResult, StreamQueryResult};
pub use types::{LogicalType, Value};
pub use vector::{SelectionVector, Vector};
