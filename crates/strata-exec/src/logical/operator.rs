//! Logical operators for query plans.
//!
//! Every expression carried by a logical operator is already bound against
//! the output schema of the operator's input.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::create_info::CreateInfo;
use super::schema::{Field, Schema, SchemaRef};
use crate::expression::{
    BoundAggregateExpression, BoundExpression, BoundOrderByNode, BoundUnnestExpression,
};
use crate::types::LogicalType;

/// Join type for join operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Matching pairs only.
    Inner,
    /// Matching pairs plus unmatched left rows padded with NULL.
    Left,
}

impl JoinType {
    /// Returns true if this join preserves all rows from the left side.
    pub fn preserves_left(&self) -> bool {
        matches!(self, JoinType::Left)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
        }
    }
}

/// A logical operator in a query plan.
#[derive(Debug, Clone)]
pub enum LogicalOperator {
    /// Base table scan.
    Get(GetOperator),

    /// Literal rows.
    Values(ValuesOperator),

    /// Relation without columns (`SELECT 42` reads one empty row).
    EmptyRelation(EmptyRelationOperator),

    /// Filter (WHERE clause).
    Filter(FilterOperator),

    /// Projection (SELECT clause).
    Projection(ProjectionOperator),

    /// Aggregate (GROUP BY).
    Aggregate(AggregateOperator),

    /// List expansion.
    Unnest(UnnestOperator),

    /// Sort (ORDER BY).
    Order(OrderOperator),

    /// Limit (LIMIT/OFFSET).
    Limit(LimitOperator),

    /// Join.
    Join(JoinOperator),

    /// DDL.
    Create(CreateOperator),

    /// Append rows to a table.
    Insert(InsertOperator),

    /// `COPY ... TO file`.
    Copy(CopyOperator),
}

impl LogicalOperator {
    /// Returns the output schema of this operator.
    pub fn schema(&self) -> SchemaRef {
        match self {
            LogicalOperator::Get(op) => op.schema.clone(),
            LogicalOperator::Values(op) => op.schema.clone(),
            LogicalOperator::EmptyRelation(op) => op.schema.clone(),
            LogicalOperator::Filter(op) => op.input.schema(),
            LogicalOperator::Projection(op) => op.schema.clone(),
            LogicalOperator::Aggregate(op) => op.schema.clone(),
            LogicalOperator::Unnest(op) => op.schema.clone(),
            LogicalOperator::Order(op) => op.input.schema(),
            LogicalOperator::Limit(op) => op.input.schema(),
            LogicalOperator::Join(op) => op.schema.clone(),
            LogicalOperator::Create(_) => Arc::new(Schema::empty()),
            LogicalOperator::Insert(_) | LogicalOperator::Copy(_) => Arc::new(count_schema()),
        }
    }

    /// Returns the child operators.
    pub fn children(&self) -> Vec<&Arc<LogicalOperator>> {
        match self {
            LogicalOperator::Get(_)
            | LogicalOperator::Values(_)
            | LogicalOperator::EmptyRelation(_)
            | LogicalOperator::Create(_) => vec![],
            LogicalOperator::Filter(op) => vec![&op.input],
            LogicalOperator::Projection(op) => vec![&op.input],
            LogicalOperator::Aggregate(op) => vec![&op.input],
            LogicalOperator::Unnest(op) => vec![&op.input],
            LogicalOperator::Order(op) => vec![&op.input],
            LogicalOperator::Limit(op) => vec![&op.input],
            LogicalOperator::Join(op) => vec![&op.left, &op.right],
            LogicalOperator::Insert(op) => vec![&op.input],
            LogicalOperator::Copy(op) => vec![&op.input],
        }
    }

    /// Returns true if this is a leaf operator.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Returns true if running the plan changes database state.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self,
            LogicalOperator::Create(_) | LogicalOperator::Insert(_) | LogicalOperator::Copy(_)
        ) || self.children().iter().any(|c| c.has_side_effects())
    }

    /// Returns the operator name.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalOperator::Get(_) => "Get",
            LogicalOperator::Values(_) => "Values",
            LogicalOperator::EmptyRelation(_) => "EmptyRelation",
            LogicalOperator::Filter(_) => "Filter",
            LogicalOperator::Projection(_) => "Projection",
            LogicalOperator::Aggregate(_) => "Aggregate",
            LogicalOperator::Unnest(_) => "Unnest",
            LogicalOperator::Order(_) => "Order",
            LogicalOperator::Limit(_) => "Limit",
            LogicalOperator::Join(_) => "Join",
            LogicalOperator::Create(_) => "Create",
            LogicalOperator::Insert(_) => "Insert",
            LogicalOperator::Copy(_) => "Copy",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            LogicalOperator::Get(op) => write!(f, ": {}.{}", op.schema_name, op.table_name),
            LogicalOperator::Filter(op) => write!(f, ": {}", op.predicate),
            LogicalOperator::Projection(op) => write!(f, ": {}", join_display(&op.expressions)),
            LogicalOperator::Aggregate(op) => write!(
                f,
                ": groups=[{}], aggregates=[{}]",
                join_display(&op.groups),
                join_display(&op.aggregates)
            ),
            LogicalOperator::Create(op) => write!(f, ": {}", op.info),
            LogicalOperator::Insert(op) => write!(f, ": {}.{}", op.schema_name, op.table_name),
            LogicalOperator::Join(op) => write!(f, ": {}", op.join_type),
            _ => Ok(()),
        }
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn count_schema() -> Schema {
    Schema::new(vec![Field::new("Count", LogicalType::BigInt)])
}

/// Base table scan.
#[derive(Debug, Clone)]
pub struct GetOperator {
    /// Schema holding the table.
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
    /// Scanned table columns, in output order.
    pub column_ids: Vec<usize>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// Literal rows.
#[derive(Debug, Clone)]
pub struct ValuesOperator {
    /// Rows of constant-foldable expressions.
    pub rows: Vec<Vec<BoundExpression>>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// Relation without input.
#[derive(Debug, Clone)]
pub struct EmptyRelationOperator {
    /// Emit one row without columns instead of nothing.
    pub produce_one_row: bool,
    /// Output schema (empty).
    pub schema: SchemaRef,
}

impl EmptyRelationOperator {
    /// The single empty row used by `SELECT` without `FROM`.
    pub fn one_row() -> Self {
        Self {
            produce_one_row: true,
            schema: Arc::new(Schema::empty()),
        }
    }
}

/// Filter operator.
#[derive(Debug, Clone)]
pub struct FilterOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// BOOLEAN predicate.
    pub predicate: BoundExpression,
}

/// Projection operator.
#[derive(Debug, Clone)]
pub struct ProjectionOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// Projection expressions.
    pub expressions: Vec<BoundExpression>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// Aggregate operator.
///
/// Output columns are the groups followed by the aggregates. `having` is
/// bound against that output.
#[derive(Debug, Clone)]
pub struct AggregateOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// Group-by expressions.
    pub groups: Vec<BoundExpression>,
    /// Aggregate expressions.
    pub aggregates: Vec<BoundAggregateExpression>,
    /// HAVING predicate.
    pub having: Option<BoundExpression>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// List expansion.
///
/// Output columns are the input columns followed by one column per unnest
/// expression.
#[derive(Debug, Clone)]
pub struct UnnestOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// Expanded lists.
    pub unnests: Vec<BoundUnnestExpression>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// Sort operator.
#[derive(Debug, Clone)]
pub struct OrderOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// Sort keys, most significant first.
    pub orders: Vec<BoundOrderByNode>,
}

/// Limit operator.
#[derive(Debug, Clone)]
pub struct LimitOperator {
    /// Input operator.
    pub input: Arc<LogicalOperator>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: usize,
}

/// Join operator.
#[derive(Debug, Clone)]
pub struct JoinOperator {
    /// Left input.
    pub left: Arc<LogicalOperator>,
    /// Right input.
    pub right: Arc<LogicalOperator>,
    /// Join type.
    pub join_type: JoinType,
    /// Join condition over the merged schema. `None` is a cross product.
    pub condition: Option<BoundExpression>,
    /// Output schema.
    pub schema: SchemaRef,
}

/// DDL operator.
#[derive(Debug, Clone)]
pub struct CreateOperator {
    /// Entry to create.
    pub info: CreateInfo,
}

/// Insert operator. Outputs one row with the inserted row count.
#[derive(Debug, Clone)]
pub struct InsertOperator {
    /// Rows to insert, already in table column order and types.
    pub input: Arc<LogicalOperator>,
    /// Schema holding the table.
    pub schema_name: String,
    /// Target table.
    pub table_name: String,
}

/// Export operator.
#[derive(Debug, Clone)]
pub struct CopyOperator {
    /// Rows to export.
    pub input: Arc<LogicalOperator>,
    /// Target file.
    pub path: String,
    /// File format name.
    pub format: String,
}
