//! Configuration for Strata.
//!
//! This module provides configuration structures for the database and
//! the execution engine.

mod database;

pub use database::{DatabaseConfig, DatabaseConfigBuilder, ExecutionConfig};
