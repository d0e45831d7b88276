//! The physical operator tree.

use std::fmt;

use strata_common::{StrataError, StrataResult};

use super::aggregate::PhysicalHashAggregate;
use super::context::ExecutionContext;
use super::create::{PhysicalCreate, PhysicalInsert};
use super::join::PhysicalNestedLoopJoin;
use super::order::PhysicalOrder;
use super::scan::{PhysicalColumnDataScan, PhysicalDummyScan, PhysicalTableScan};
use super::streaming::{PhysicalFilter, PhysicalLimit, PhysicalProjection};
use super::unnest::PhysicalUnnest;
use crate::chunk::DataChunk;
use crate::logical::{
    CreateIndexInfo, CreateSchemaInfo, CreateSequenceInfo, CreateTableInfo, CreateViewInfo,
};
use crate::types::LogicalType;

/// An executable operator.
///
/// The tree is built once per query by the
/// [`PhysicalPlanGenerator`](super::PhysicalPlanGenerator) and its shape
/// never changes afterwards. Each operator owns its children and its bound
/// expressions.
#[derive(Debug)]
pub enum PhysicalOperator {
    /// Scan of a catalog table.
    TableScan(PhysicalTableScan),
    /// Scan of materialized literal rows.
    ColumnDataScan(PhysicalColumnDataScan),
    /// Zero or one row without columns.
    DummyScan(PhysicalDummyScan),
    /// Row filter.
    Filter(PhysicalFilter),
    /// Expression evaluation.
    Projection(PhysicalProjection),
    /// Grouped aggregation.
    HashAggregate(PhysicalHashAggregate),
    /// List expansion.
    Unnest(PhysicalUnnest),
    /// Full sort.
    Order(PhysicalOrder),
    /// Offset and limit.
    Limit(PhysicalLimit),
    /// Nested loop join.
    NestedLoopJoin(PhysicalNestedLoopJoin),
    /// `CREATE SCHEMA`.
    CreateSchema(PhysicalCreate<CreateSchemaInfo>),
    /// `CREATE SEQUENCE`.
    CreateSequence(PhysicalCreate<CreateSequenceInfo>),
    /// `CREATE VIEW`.
    CreateView(PhysicalCreate<CreateViewInfo>),
    /// `CREATE TABLE`.
    CreateTable(PhysicalCreate<CreateTableInfo>),
    /// `CREATE INDEX`.
    CreateIndex(PhysicalCreate<CreateIndexInfo>),
    /// Append into a table.
    Insert(PhysicalInsert),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            PhysicalOperator::TableScan($op) => $body,
            PhysicalOperator::ColumnDataScan($op) => $body,
            PhysicalOperator::DummyScan($op) => $body,
            PhysicalOperator::Filter($op) => $body,
            PhysicalOperator::Projection($op) => $body,
            PhysicalOperator::HashAggregate($op) => $body,
            PhysicalOperator::Unnest($op) => $body,
            PhysicalOperator::Order($op) => $body,
            PhysicalOperator::Limit($op) => $body,
            PhysicalOperator::NestedLoopJoin($op) => $body,
            PhysicalOperator::CreateSchema($op) => $body,
            PhysicalOperator::CreateSequence($op) => $body,
            PhysicalOperator::CreateView($op) => $body,
            PhysicalOperator::CreateTable($op) => $body,
            PhysicalOperator::CreateIndex($op) => $body,
            PhysicalOperator::Insert($op) => $body,
        }
    };
}

impl PhysicalOperator {
    /// Pulls the next chunk. `None` means the operator is exhausted.
    ///
    /// Fails with `Interrupted` if the connection was interrupted.
    pub fn get_chunk(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        ctx.check_interrupt()?;
        let chunk = dispatch!(self, op => op.get_data(ctx))?;
        if let Some(chunk) = &chunk {
            if ctx.verify_chunks() {
                self.verify_chunk(ctx, chunk)?;
            }
        }
        Ok(chunk)
    }

    fn verify_chunk(&self, ctx: &ExecutionContext, chunk: &DataChunk) -> StrataResult<()> {
        chunk.verify()?;
        if chunk.size() > ctx.vector_size() {
            return Err(StrataError::internal(format!(
                "{} produced {} rows, vector size is {}",
                self.name(),
                chunk.size(),
                ctx.vector_size()
            )));
        }
        if chunk.column_count() != self.types().len() {
            return Err(StrataError::internal(format!(
                "{} produced {} columns, expected {}",
                self.name(),
                chunk.column_count(),
                self.types().len()
            )));
        }
        Ok(())
    }

    /// Returns the output column types.
    pub fn types(&self) -> &[LogicalType] {
        dispatch!(self, op => op.types())
    }

    /// Returns the child operators.
    pub fn children(&self) -> Vec<&PhysicalOperator> {
        dispatch!(self, op => op.children())
    }

    /// Returns true if the operator has no children.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Returns the operator name.
    pub fn name(&self) -> &'static str {
        match self {
            PhysicalOperator::TableScan(_) => "TABLE_SCAN",
            PhysicalOperator::ColumnDataScan(_) => "COLUMN_DATA_SCAN",
            PhysicalOperator::DummyScan(op) if op.produces_row() => "DUMMY_SCAN",
            PhysicalOperator::DummyScan(_) => "EMPTY_RESULT",
            PhysicalOperator::Filter(_) => "FILTER",
            PhysicalOperator::Projection(_) => "PROJECTION",
            PhysicalOperator::HashAggregate(_) => "HASH_GROUP_BY",
            PhysicalOperator::Unnest(_) => "UNNEST",
            PhysicalOperator::Order(_) => "ORDER_BY",
            PhysicalOperator::Limit(_) => "LIMIT",
            PhysicalOperator::NestedLoopJoin(_) => "NESTED_LOOP_JOIN",
            PhysicalOperator::CreateSchema(_) => "CREATE_SCHEMA",
            PhysicalOperator::CreateSequence(_) => "CREATE_SEQUENCE",
            PhysicalOperator::CreateView(_) => "CREATE_VIEW",
            PhysicalOperator::CreateTable(_) => "CREATE_TABLE",
            PhysicalOperator::CreateIndex(_) => "CREATE_INDEX",
            PhysicalOperator::Insert(_) => "INSERT",
        }
    }

    /// Returns operator-specific details for `explain`.
    pub fn details(&self) -> String {
        dispatch!(self, op => op.details())
    }

    /// Renders the operator tree, one operator per line, children
    /// indented below their parent.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(0, &mut out);
        out
    }

    fn explain_into(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.name());
        let details = self.details();
        if !details.is_empty() {
            out.push_str(" [");
            out.push_str(&details);
            out.push(']');
        }
        out.push('\n');
        for child in self.children() {
            child.explain_into(depth + 1, out);
        }
    }
}

impl fmt::Display for PhysicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

/// Joins displayable items with commas for `details`.
pub(super) fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
