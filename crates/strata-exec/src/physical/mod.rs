//! Physical plan generation and execution.
//!
//! This module compiles bound logical plans into trees of physical
//! operators and drives them with a single-threaded pull model.
//!
//! # Architecture
//!
//! - **PhysicalPlanGenerator**: compiles a `LogicalOperator` tree
//! - **PhysicalOperator**: executable operator; `get_chunk` pulls the next
//!   chunk from the root, which pulls from its children
//! - **ExecutionContext**: runtime configuration, catalog and interrupt flag
//!
//! # Physical Operators
//!
//! | Logical Operator | Physical Operator |
//! |-----------------|------------------|
//! | Get | TableScan |
//! | Values | ColumnDataScan |
//! | EmptyRelation | DummyScan, EmptyResult |
//! | Filter | Filter |
//! | Projection | Projection |
//! | Aggregate | HashAggregate (+ Filter for HAVING) |
//! | Unnest | Unnest |
//! | Order | Order |
//! | Limit | Limit |
//! | Join | NestedLoopJoin |
//! | Create | CreateSchema, CreateSequence, CreateView, CreateTable, CreateIndex |
//! | Insert | Insert |

mod aggregate;
mod context;
mod create;
mod join;
mod operator;
mod order;
mod planner;
mod scan;
mod streaming;
mod unnest;

pub use aggregate::PhysicalHashAggregate;
pub use context::ExecutionContext;
pub use create::{CreateEntry, PhysicalCreate, PhysicalInsert};
pub use join::PhysicalNestedLoopJoin;
pub use operator::PhysicalOperator;
pub use order::PhysicalOrder;
pub use planner::PhysicalPlanGenerator;
pub use scan::{PhysicalColumnDataScan, PhysicalDummyScan, PhysicalTableScan};
pub use streaming::{PhysicalFilter, PhysicalLimit, PhysicalProjection};
pub use unnest::PhysicalUnnest;

use strata_common::StrataResult;

use crate::chunk::DataChunk;
use crate::types::{LogicalType, Value};

/// Splits materialized rows into chunks of at most `vector_size` rows.
pub(crate) fn rows_to_chunks(
    types: &[LogicalType],
    rows: &[Vec<Value>],
    vector_size: usize,
) -> StrataResult<Vec<DataChunk>> {
    rows.chunks(vector_size.max(1))
        .map(|rows| DataChunk::from_rows(types, rows))
        .collect()
}
