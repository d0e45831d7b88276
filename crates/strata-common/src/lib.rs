//! # strata-common
//!
//! Common errors, configuration, and constants for Strata.
//!
//! This crate provides the foundational pieces shared by the execution
//! engine and anything embedding it:
//!
//! - **Errors**: Unified error handling with `StrataError` and stable `ErrorCode`s
//! - **Config**: Database and execution configuration, loadable from TOML
//! - **Constants**: Batch sizes and catalog defaults
//!
//! ## Example
//!
//! ```rust
//! use strata_common::config::DatabaseConfig;
//! use strata_common::error::StrataResult;
//!
//! fn example() -> StrataResult<()> {
//!     let config = DatabaseConfig::default();
//!     config.validate()?;
//!     assert_eq!(config.execution.vector_size, strata_common::STANDARD_VECTOR_SIZE);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{ErrorCode, StrataError, StrataResult};
