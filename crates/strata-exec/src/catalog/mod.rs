//! Catalog and table storage interfaces.
//!
//! The execution core only talks to storage through these traits: DDL
//! operators create entries, scans pull chunks from a [`DataTable`] and
//! inserts append chunks to it. [`MemoryCatalog`] is the in-memory
//! implementation used by [`Database`](crate::connection::Database).

mod memory;

pub use memory::{MemoryCatalog, MemoryTable};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_common::{StrataError, StrataResult};

use crate::chunk::DataChunk;
use crate::logical::{
    ColumnDefinition, CreateIndexInfo, CreateSchemaInfo, CreateSequenceInfo, CreateTableInfo,
    CreateViewInfo, LogicalOperator,
};
use crate::types::LogicalType;

/// Name and columns of a table, as seen by clients appending to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Owning schema.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Columns in storage order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDescription {
    /// Creates a description.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns,
        }
    }

    /// Returns the column types.
    pub fn types(&self) -> Vec<LogicalType> {
        self.columns.iter().map(|c| c.logical_type.clone()).collect()
    }

    /// Returns the column names.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Checks that `chunk` can be appended: same column count, and each
    /// column either has the table type or widens to it implicitly.
    pub fn validate_chunk(&self, chunk: &DataChunk) -> StrataResult<()> {
        if chunk.column_count() != self.columns.len() {
            return Err(StrataError::invalid_argument(format!(
                "table {} has {} columns but the appended chunk has {}",
                self.table,
                self.columns.len(),
                chunk.column_count()
            )));
        }
        for (column, vector) in self.columns.iter().zip(chunk.columns()) {
            if !vector.logical_type().can_implicit_cast_to(&column.logical_type) {
                return Err(StrataError::type_mismatch(
                    format!("{} {}", column.name, column.logical_type),
                    vector.logical_type(),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TableDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.schema, self.table)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", column.name, column.logical_type)?;
        }
        write!(f, ")")
    }
}

/// Position of a scan inside a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableScanState {
    /// Index of the stored chunk being read.
    pub chunk_index: usize,
    /// Next row within that chunk.
    pub offset: usize,
}

/// Row storage of one table.
pub trait DataTable: fmt::Debug + Send + Sync {
    /// Returns the table description.
    fn description(&self) -> &TableDescription;

    /// Returns the number of stored rows.
    fn row_count(&self) -> usize;

    /// Reads up to `max_rows` rows of the given columns, advancing `state`.
    /// Returns `None` once the table is exhausted.
    fn scan_chunk(
        &self,
        state: &mut TableScanState,
        column_ids: &[usize],
        max_rows: usize,
    ) -> StrataResult<Option<DataChunk>>;

    /// Validates and appends a chunk, returning the number of rows added.
    fn append(&self, chunk: &DataChunk) -> StrataResult<usize>;
}

/// Catalog of schemas and their entries.
pub trait Catalog: fmt::Debug + Send + Sync {
    /// Creates a schema.
    fn create_schema(&self, info: &CreateSchemaInfo) -> StrataResult<()>;

    /// Creates a sequence.
    fn create_sequence(&self, info: &CreateSequenceInfo) -> StrataResult<()>;

    /// Creates a view.
    fn create_view(&self, info: &CreateViewInfo) -> StrataResult<()>;

    /// Creates a table.
    fn create_table(&self, info: &CreateTableInfo) -> StrataResult<()>;

    /// Creates an index on an existing table.
    fn create_index(&self, info: &CreateIndexInfo) -> StrataResult<()>;

    /// Looks up a table.
    fn get_table(&self, schema: &str, name: &str) -> StrataResult<Arc<dyn DataTable>>;

    /// Looks up the planned body of a view.
    fn get_view(&self, schema: &str, name: &str) -> StrataResult<Arc<LogicalOperator>>;

    /// Returns the next value of a sequence.
    fn next_sequence_value(&self, schema: &str, name: &str) -> StrataResult<i64>;
}
