//! Compilation of logical plans into physical operator trees.

use strata_common::{StrataError, StrataResult};
use tracing::debug;

use super::aggregate::PhysicalHashAggregate;
use super::create::{PhysicalCreate, PhysicalInsert};
use super::join::PhysicalNestedLoopJoin;
use super::operator::PhysicalOperator;
use super::order::PhysicalOrder;
use super::scan::{PhysicalColumnDataScan, PhysicalDummyScan, PhysicalTableScan};
use super::streaming::{PhysicalFilter, PhysicalLimit, PhysicalProjection};
use super::unnest::PhysicalUnnest;
use crate::expression::BoundExpression;
use crate::logical::{
    AggregateOperator, CreateInfo, GetOperator, InsertOperator, JoinOperator, LogicalOperator,
    UnnestOperator,
};

/// Converts logical plans into physical plans.
///
/// Compilation only reads the logical tree. Every logical node maps to one
/// physical operator, except an aggregate with a HAVING predicate, which
/// becomes a filter over a hash aggregate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicalPlanGenerator;

impl PhysicalPlanGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        Self
    }

    /// Compiles `plan`.
    ///
    /// Unsupported statements fail with `NotImplemented` here, before
    /// anything executes. Subqueries inside expressions are compiled as
    /// well so their errors also surface now.
    pub fn create_plan(&self, plan: &LogicalOperator) -> StrataResult<PhysicalOperator> {
        let operator = self.plan_operator(plan)?;
        debug!(root = operator.name(), "created physical plan");
        Ok(operator)
    }

    fn plan_operator(&self, plan: &LogicalOperator) -> StrataResult<PhysicalOperator> {
        match plan {
            LogicalOperator::Get(get) => Ok(self.plan_get(get)),
            LogicalOperator::Values(values) => {
                for row in &values.rows {
                    self.check_subqueries(row)?;
                }
                Ok(PhysicalOperator::ColumnDataScan(PhysicalColumnDataScan::new(
                    values.rows.clone(),
                    values.schema.types(),
                )))
            }
            LogicalOperator::EmptyRelation(empty) => Ok(PhysicalOperator::DummyScan(
                PhysicalDummyScan::new(empty.produce_one_row),
            )),
            LogicalOperator::Filter(filter) => {
                self.check_subqueries(std::slice::from_ref(&filter.predicate))?;
                let child = self.plan_operator(&filter.input)?;
                Ok(PhysicalOperator::Filter(PhysicalFilter::new(
                    child,
                    filter.predicate.clone(),
                )))
            }
            LogicalOperator::Projection(projection) => {
                self.check_subqueries(&projection.expressions)?;
                let child = self.plan_operator(&projection.input)?;
                Ok(PhysicalOperator::Projection(PhysicalProjection::new(
                    child,
                    projection.expressions.clone(),
                )))
            }
            LogicalOperator::Aggregate(aggregate) => self.plan_aggregate(aggregate),
            LogicalOperator::Unnest(unnest) => self.plan_unnest(unnest),
            LogicalOperator::Order(order) => {
                let keys: Vec<BoundExpression> =
                    order.orders.iter().map(|o| o.expression.clone()).collect();
                self.check_subqueries(&keys)?;
                let child = self.plan_operator(&order.input)?;
                Ok(PhysicalOperator::Order(PhysicalOrder::new(
                    child,
                    order.orders.clone(),
                )))
            }
            LogicalOperator::Limit(limit) => {
                let child = self.plan_operator(&limit.input)?;
                Ok(PhysicalOperator::Limit(PhysicalLimit::new(
                    child,
                    limit.limit,
                    limit.offset,
                )))
            }
            LogicalOperator::Join(join) => self.plan_join(join),
            LogicalOperator::Create(create) => self.plan_create(&create.info),
            LogicalOperator::Insert(insert) => self.plan_insert(insert),
            LogicalOperator::Copy(copy) => Err(StrataError::not_implemented(format!(
                "COPY TO '{}' (FORMAT {})",
                copy.path, copy.format
            ))),
        }
    }

    fn plan_get(&self, get: &GetOperator) -> PhysicalOperator {
        PhysicalOperator::TableScan(PhysicalTableScan::new(
            get.schema_name.clone(),
            get.table_name.clone(),
            get.column_ids.clone(),
            get.schema.types(),
        ))
    }

    fn plan_aggregate(&self, aggregate: &AggregateOperator) -> StrataResult<PhysicalOperator> {
        self.check_subqueries(&aggregate.groups)?;
        for expression in &aggregate.aggregates {
            self.check_subqueries(&expression.children)?;
        }
        let child = self.plan_operator(&aggregate.input)?;
        let operator = PhysicalOperator::HashAggregate(PhysicalHashAggregate::new(
            child,
            aggregate.groups.clone(),
            aggregate.aggregates.clone(),
        ));

        match &aggregate.having {
            Some(having) => {
                self.check_subqueries(std::slice::from_ref(having))?;
                Ok(PhysicalOperator::Filter(PhysicalFilter::new(
                    operator,
                    having.clone(),
                )))
            }
            None => Ok(operator),
        }
    }

    fn plan_unnest(&self, unnest: &UnnestOperator) -> StrataResult<PhysicalOperator> {
        let lists: Vec<BoundExpression> = unnest.unnests.iter().map(|u| u.child.clone()).collect();
        self.check_subqueries(&lists)?;
        let child = self.plan_operator(&unnest.input)?;
        Ok(PhysicalOperator::Unnest(PhysicalUnnest::new(
            child,
            unnest.unnests.clone(),
        )))
    }

    fn plan_join(&self, join: &JoinOperator) -> StrataResult<PhysicalOperator> {
        if let Some(condition) = &join.condition {
            self.check_subqueries(std::slice::from_ref(condition))?;
        }
        let left = self.plan_operator(&join.left)?;
        let right = self.plan_operator(&join.right)?;
        Ok(PhysicalOperator::NestedLoopJoin(PhysicalNestedLoopJoin::new(
            left,
            right,
            join.join_type,
            join.condition.clone(),
        )))
    }

    fn plan_create(&self, info: &CreateInfo) -> StrataResult<PhysicalOperator> {
        Ok(match info {
            CreateInfo::Schema(info) => PhysicalOperator::CreateSchema(PhysicalCreate::new(info.clone())),
            CreateInfo::Sequence(info) => {
                PhysicalOperator::CreateSequence(PhysicalCreate::new(info.clone()))
            }
            CreateInfo::View(info) => {
                self.plan_operator(&info.query)?;
                PhysicalOperator::CreateView(PhysicalCreate::new(info.clone()))
            }
            CreateInfo::Table(info) => PhysicalOperator::CreateTable(PhysicalCreate::new(info.clone())),
            CreateInfo::Index(info) => PhysicalOperator::CreateIndex(PhysicalCreate::new(info.clone())),
            CreateInfo::Function(info) => {
                return Err(StrataError::not_implemented(format!(
                    "CREATE FUNCTION {}",
                    info.name
                )))
            }
        })
    }

    fn plan_insert(&self, insert: &InsertOperator) -> StrataResult<PhysicalOperator> {
        let child = self.plan_operator(&insert.input)?;
        Ok(PhysicalOperator::Insert(PhysicalInsert::new(
            child,
            insert.schema_name.clone(),
            insert.table_name.clone(),
        )))
    }

    /// Compiles every subquery referenced by `expressions`.
    fn check_subqueries(&self, expressions: &[BoundExpression]) -> StrataResult<()> {
        let mut subqueries = Vec::new();
        for expression in expressions {
            expression.collect_subqueries(&mut subqueries);
        }
        for subquery in subqueries {
            self.plan_operator(subquery)?;
        }
        Ok(())
    }
}
