//! Payloads carried by DDL nodes.
//!
//! Each info struct is fully resolved by the time it reaches the plan: the
//! physical planner unwraps it into a leaf operator without further checks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strata_common::{DEFAULT_SCHEMA, DEFAULT_SEQUENCE_INCREMENT, DEFAULT_SEQUENCE_START};

use super::LogicalOperator;
use crate::types::LogicalType;

/// Payload of a `Create` node.
#[derive(Debug, Clone)]
pub enum CreateInfo {
    /// `CREATE SCHEMA`.
    Schema(CreateSchemaInfo),
    /// `CREATE SEQUENCE`.
    Sequence(CreateSequenceInfo),
    /// `CREATE VIEW`.
    View(CreateViewInfo),
    /// `CREATE TABLE`.
    Table(CreateTableInfo),
    /// `CREATE INDEX`.
    Index(CreateIndexInfo),
    /// `CREATE FUNCTION` (macro). Not executable.
    Function(CreateFunctionInfo),
}

impl CreateInfo {
    /// Returns the catalog entry kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CreateInfo::Schema(_) => "schema",
            CreateInfo::Sequence(_) => "sequence",
            CreateInfo::View(_) => "view",
            CreateInfo::Table(_) => "table",
            CreateInfo::Index(_) => "index",
            CreateInfo::Function(_) => "function",
        }
    }

    /// Returns the name of the created entry.
    pub fn name(&self) -> &str {
        match self {
            CreateInfo::Schema(info) => &info.name,
            CreateInfo::Sequence(info) => &info.name,
            CreateInfo::View(info) => &info.name,
            CreateInfo::Table(info) => &info.name,
            CreateInfo::Index(info) => &info.name,
            CreateInfo::Function(info) => &info.name,
        }
    }
}

impl fmt::Display for CreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE {} {}", self.kind().to_uppercase(), self.name())
    }
}

/// `CREATE SCHEMA name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchemaInfo {
    /// Schema name.
    pub name: String,
    /// Succeed silently if the schema exists.
    pub if_not_exists: bool,
}

impl CreateSchemaInfo {
    /// Creates the info for schema `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_not_exists: false,
        }
    }
}

/// `CREATE SEQUENCE schema.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSequenceInfo {
    /// Owning schema.
    pub schema: String,
    /// Sequence name.
    pub name: String,
    /// First value.
    pub start: i64,
    /// Step between values.
    pub increment: i64,
    /// Succeed silently if the sequence exists.
    pub if_not_exists: bool,
}

impl CreateSequenceInfo {
    /// Creates the info for a sequence in the default schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            name: name.into(),
            start: DEFAULT_SEQUENCE_START,
            increment: DEFAULT_SEQUENCE_INCREMENT,
            if_not_exists: false,
        }
    }
}

/// `CREATE VIEW schema.name AS query`.
#[derive(Debug, Clone)]
pub struct CreateViewInfo {
    /// Owning schema.
    pub schema: String,
    /// View name.
    pub name: String,
    /// Planned view body.
    pub query: Arc<LogicalOperator>,
}

/// A column of `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Column type.
    pub logical_type: LogicalType,
}

impl ColumnDefinition {
    /// Creates a column definition.
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

/// `CREATE TABLE schema.name (columns)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableInfo {
    /// Owning schema.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Column definitions.
    pub columns: Vec<ColumnDefinition>,
    /// Succeed silently if the table exists.
    pub if_not_exists: bool,
}

impl CreateTableInfo {
    /// Creates the info for a table in the default schema.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            name: name.into(),
            columns,
            if_not_exists: false,
        }
    }
}

/// `CREATE INDEX name ON schema.table (columns)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexInfo {
    /// Schema of the indexed table.
    pub schema: String,
    /// Indexed table.
    pub table: String,
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Unique index.
    pub unique: bool,
}

/// `CREATE MACRO name(parameters) AS body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFunctionInfo {
    /// Owning schema.
    pub schema: String,
    /// Function name.
    pub name: String,
    /// Parameter names.
    pub parameters: Vec<String>,
}
