//! Logical query plans.
//!
//! A logical plan is a tree of [`LogicalOperator`]s whose expressions are
//! already bound. Plans are produced by the [`LogicalPlanBuilder`] and
//! compiled into physical operators by the physical planner.

mod builder;
mod create_info;
mod operator;
mod schema;

pub use builder::{LogicalPlanBuilder, SortKey};
pub use create_info::{
    ColumnDefinition, CreateFunctionInfo, CreateIndexInfo, CreateInfo, CreateSchemaInfo,
    CreateSequenceInfo, CreateTableInfo, CreateViewInfo,
};
pub use operator::{
    AggregateOperator, CopyOperator, CreateOperator, EmptyRelationOperator, FilterOperator,
    GetOperator, InsertOperator, JoinOperator, JoinType, LimitOperator, LogicalOperator,
    OrderOperator, ProjectionOperator, UnnestOperator, ValuesOperator,
};
pub use schema::{Field, Schema, SchemaRef};
