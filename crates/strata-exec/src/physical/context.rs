//! Execution context and runtime configuration.
//!
//! The execution context provides the runtime configuration, catalog
//! access and interrupt flag for one connection. It is cheap to clone;
//! clones share the catalog and the interrupt flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strata_common::config::{DatabaseConfig, ExecutionConfig};
use strata_common::{StrataError, StrataResult};
use tracing::warn;

use crate::catalog::{Catalog, MemoryCatalog};

/// Runtime resources for query execution.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    config: ExecutionConfig,
    catalog: Arc<dyn Catalog>,
    interrupted: Arc<AtomicBool>,
}

impl ExecutionContext {
    /// Creates a context over `catalog`.
    pub fn new(config: ExecutionConfig, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            config,
            catalog,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a context with a fresh in-memory catalog and the testing
    /// configuration (tiny vectors, chunk verification on).
    pub fn for_testing() -> Self {
        Self::new(
            DatabaseConfig::for_testing().execution,
            Arc::new(MemoryCatalog::new()),
        )
    }

    /// Returns the execution configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Maximum rows per produced chunk.
    pub fn vector_size(&self) -> usize {
        self.config.vector_size
    }

    /// Returns true if produced chunks are verified.
    pub fn verify_chunks(&self) -> bool {
        self.config.verify_chunks
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Returns the shared interrupt flag.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Requests that the running query stop at its next chunk boundary.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Returns true if an interrupt is pending.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Clears a pending interrupt.
    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    /// Fails with `Interrupted` if an interrupt is pending.
    pub fn check_interrupt(&self) -> StrataResult<()> {
        if self.is_interrupted() {
            warn!("query interrupted");
            return Err(StrataError::Interrupted);
        }
        Ok(())
    }
}
