//! Database handle and client connections.
//!
//! A [`Database`] owns the catalog. Each [`Connection`] has its own
//! execution context and interrupt flag; it compiles bound logical plans,
//! drives the root physical operator and returns the produced chunks.
//!
//! # Example
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
//! let plan = LogicalPlanBuilder::values(&["a"], vec![vec![lit(1)], vec![lit(2)], vec![lit(3)]])
//!     .unwrap()
//!     .select(vec![func("list", vec![col("a")])])
//!     .unwrap()
//!     .build();
//! let result = conn.query(&plan);
//! assert_eq!(
//!     result.column_values(0),
//!     vec![Value::list([Value::Integer(1), Value::Integer(2), Value::Integer(3)])]
//! );
//! ```

mod result;

pub use result::{QueryResult, StreamQueryResult};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strata_common::config::DatabaseConfig;
use strata_common::{StrataError, StrataResult};
use tracing::{debug, info};

use crate::catalog::{Catalog, MemoryCatalog, TableDescription};
use crate::chunk::DataChunk;
use crate::logical::{CreateSchemaInfo, LogicalOperator, LogicalPlanBuilder};
use crate::physical::{ExecutionContext, PhysicalPlanGenerator};

/// An in-memory database.
#[derive(Debug, Clone)]
pub struct Database {
    config: DatabaseConfig,
    catalog: Arc<dyn Catalog>,
}

impl Database {
    /// Opens a database with `config`.
    pub fn open(config: DatabaseConfig) -> StrataResult<Self> {
        Self::with_catalog(config, Arc::new(MemoryCatalog::new()))
    }

    /// Opens a database with the default configuration.
    pub fn in_memory() -> StrataResult<Self> {
        Self::open(DatabaseConfig::default())
    }

    /// Opens a database over an existing catalog.
    pub fn with_catalog(config: DatabaseConfig, catalog: Arc<dyn Catalog>) -> StrataResult<Self> {
        config.validate()?;
        let mut schema = CreateSchemaInfo::new(config.default_schema.clone());
        schema.if_not_exists = true;
        catalog.create_schema(&schema)?;

        info!(
            default_schema = %config.default_schema,
            vector_size = config.execution.vector_size,
            "opened database"
        );
        Ok(Self { config, catalog })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Opens a new connection.
    pub fn connect(&self) -> Connection {
        Connection {
            ctx: ExecutionContext::new(self.config.execution.clone(), Arc::clone(&self.catalog)),
            default_schema: self.config.default_schema.clone(),
            verify_queries: false,
        }
    }
}

/// Interrupts the queries of one connection from anywhere.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Requests that the running query stop at its next chunk boundary.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// A client connection.
#[derive(Debug)]
pub struct Connection {
    ctx: ExecutionContext,
    default_schema: String,
    verify_queries: bool,
}

impl Connection {
    /// Returns the execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Runs `plan` to completion. Failures are reported in the result.
    pub fn query(&self, plan: &LogicalOperator) -> QueryResult {
        match self.run(plan) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "query failed");
                QueryResult::failed(&e)
            }
        }
    }

    fn run(&self, plan: &LogicalOperator) -> StrataResult<QueryResult> {
        let result = self.send_query(plan)?.materialize();
        if !result.is_success() {
            return Ok(result);
        }

        if self.verify_queries && !plan.has_side_effects() {
            let again = self.send_query(plan)?.materialize();
            if again.error().is_some() || again.rows() != result.rows() {
                return Err(StrataError::internal(format!(
                    "query verification failed: re-running {} produced a different result",
                    plan.name()
                )));
            }
        }

        debug!(
            rows = result.row_count(),
            chunks = result.chunks().len(),
            "query finished"
        );
        Ok(result)
    }

    /// Compiles `plan` and returns a result that produces chunks on
    /// demand. Compile errors are returned here.
    pub fn send_query(&self, plan: &LogicalOperator) -> StrataResult<StreamQueryResult> {
        self.ctx.clear_interrupt();
        let root = PhysicalPlanGenerator::new().create_plan(plan)?;
        Ok(StreamQueryResult::new(root, self.ctx.clone(), plan.schema().names()))
    }

    /// Appends a chunk to the table named by `description`. The chunk
    /// must match the table's columns.
    pub fn append(&self, description: &TableDescription, chunk: &DataChunk) -> StrataResult<()> {
        let table = self
            .ctx
            .catalog()
            .get_table(&description.schema, &description.table)?;
        if table.description().types() != description.types() {
            return Err(StrataError::invalid_argument(format!(
                "{description} does not match the table {}",
                table.description()
            )));
        }
        let rows = table.append(chunk)?;
        debug!(table = %description.table, rows, "appended chunk");
        Ok(())
    }

    /// Describes a table.
    pub fn table_info(&self, schema: &str, table: &str) -> StrataResult<TableDescription> {
        let table = self.ctx.catalog().get_table(schema, table)?;
        Ok(table.description().clone())
    }

    /// Starts a plan that scans a table of the default schema.
    pub fn table(&self, name: &str) -> StrataResult<LogicalPlanBuilder> {
        let info = self.table_info(&self.default_schema, name)?;
        Ok(LogicalPlanBuilder::scan(&info.schema, &info.table, &info.columns))
    }

    /// Starts a plan from a view of the default schema.
    pub fn view(&self, name: &str) -> StrataResult<LogicalPlanBuilder> {
        let query = self.ctx.catalog().get_view(&self.default_schema, name)?;
        Ok(LogicalPlanBuilder::from_plan(query))
    }

    /// Returns the next value of a sequence in the default schema.
    pub fn next_sequence_value(&self, name: &str) -> StrataResult<i64> {
        self.ctx
            .catalog()
            .next_sequence_value(&self.default_schema, name)
    }

    /// Returns a handle that interrupts this connection's queries.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            flag: self.ctx.interrupt_flag(),
        }
    }

    /// Interrupts the running query.
    pub fn interrupt(&self) {
        self.ctx.interrupt();
    }

    /// Re-runs every side-effect-free query and fails it if the two runs
    /// disagree.
    pub fn enable_query_verification(&mut self) {
        self.verify_queries = true;
    }

    /// Turns query verification off.
    pub fn disable_query_verification(&mut self) {
        self.verify_queries = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parsed::{col, lit};
    use crate::logical::{ColumnDefinition, CreateInfo, CreateTableInfo};
    use crate::types::{LogicalType, Value};

    fn database() -> Database {
        Database::open(DatabaseConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = DatabaseConfig::builder().vector_size(0).build();
        assert!(Database::open(config).is_err());
    }

    #[test]
    fn test_failed_query_is_reported() {
        let conn = database().connect();
        let plan = LogicalPlanBuilder::empty().copy_to("out.csv", "csv").build();
        let result = conn.query(&plan);
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("COPY"));
    }

    #[test]
    fn test_append_checks_description() {
        let db = database();
        let conn = db.connect();
        let create = LogicalPlanBuilder::create(CreateInfo::Table(CreateTableInfo::new(
            "t",
            vec![ColumnDefinition::new("a", LogicalType::Integer)],
        )))
        .build();
        assert!(conn.query(&create).is_success());

        let description = conn.table_info("main", "t").unwrap();
        let chunk = DataChunk::from_rows(&[LogicalType::Integer], &[vec![Value::Integer(7)]]).unwrap();
        conn.append(&description, &chunk).unwrap();

        let stale = TableDescription::new(
            "main",
            "t",
            vec![ColumnDefinition::new("a", LogicalType::Varchar)],
        );
        assert!(conn.append(&stale, &chunk).is_err());

        let plan = conn.table("t").unwrap().build();
        assert_eq!(conn.query(&plan).column_values(0), vec![Value::Integer(7)]);
    }

    #[test]
    fn test_query_verification() {
        let mut conn = database().connect();
        conn.enable_query_verification();
        let plan = LogicalPlanBuilder::values(&["a"], vec![vec![lit(1)], vec![lit(2)]])
            .unwrap()
            .filter(col("a").greater_than(lit(1)))
            .unwrap()
            .build();
        let result = conn.query(&plan);
        assert!(result.is_success());
        assert_eq!(result.column_values(0), vec![Value::Integer(2)]);
    }

    #[test]
    fn test_interrupt_between_fetches() {
        let conn = database().connect();
        let rows = (0..10).map(|i| vec![lit(i)]).collect();
        let plan = LogicalPlanBuilder::values(&["a"], rows).unwrap().build();

        let mut stream = conn.send_query(&plan).unwrap();
        assert_eq!(stream.fetch().unwrap().unwrap().size(), 4);
        conn.interrupt_handle().interrupt();
        assert!(matches!(stream.fetch(), Err(StrataError::Interrupted)));
        assert!(stream.fetch().unwrap().is_none());

        let result = conn.query(&plan);
        assert_eq!(result.row_count(), 10);
    }
}
