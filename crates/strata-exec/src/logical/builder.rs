//! Fluent construction of bound logical plans.
//!
//! The builder plays the role of the statement binder: every method binds
//! its parsed expressions against the schema of the plan built so far, so
//! a finished plan carries only resolved expressions.

use std::sync::Arc;

use strata_common::{StrataError, StrataResult};
use tracing::debug;

use super::create_info::{ColumnDefinition, CreateInfo};
use super::operator::{
    AggregateOperator, CopyOperator, CreateOperator, EmptyRelationOperator, FilterOperator,
    GetOperator, InsertOperator, JoinOperator, JoinType, LimitOperator, LogicalOperator,
    OrderOperator, ProjectionOperator, UnnestOperator, ValuesOperator,
};
use super::schema::{Field, Schema, SchemaRef};
use crate::expression::binder::ExpressionClass;
use crate::expression::{
    BoundAggregateExpression, BoundExpression, BoundOrderByNode, BoundUnnestExpression,
    ExpressionBinder, OrderType, ParsedExpression, SubqueryKind,
};
use crate::function::FunctionRegistry;
use crate::types::LogicalType;

/// One ORDER BY key before binding.
#[derive(Debug, Clone)]
pub struct SortKey {
    /// Sort expression.
    pub expression: ParsedExpression,
    /// Direction.
    pub order: OrderType,
    /// Overrides the default NULL placement of the direction.
    pub nulls_first: Option<bool>,
}

impl SortKey {
    /// Ascending key.
    pub fn asc(expression: ParsedExpression) -> Self {
        Self {
            expression,
            order: OrderType::Ascending,
            nulls_first: None,
        }
    }

    /// Descending key.
    pub fn desc(expression: ParsedExpression) -> Self {
        Self {
            expression,
            order: OrderType::Descending,
            nulls_first: None,
        }
    }

    /// Sets NULL placement.
    #[must_use]
    pub fn nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = Some(nulls_first);
        self
    }
}

/// Builds a logical plan bottom-up.
#[derive(Debug, Clone)]
pub struct LogicalPlanBuilder {
    plan: Arc<LogicalOperator>,
    registry: Arc<FunctionRegistry>,
}

impl LogicalPlanBuilder {
    /// Starts from an existing plan.
    pub fn from_plan(plan: Arc<LogicalOperator>) -> Self {
        Self {
            plan,
            registry: Arc::new(FunctionRegistry::builtin()),
        }
    }

    /// Uses `registry` to resolve functions.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Scans all columns of a table. Output fields are qualified by the
    /// table name.
    pub fn scan(schema_name: &str, table_name: &str, columns: &[ColumnDefinition]) -> Self {
        let schema = Schema::new(
            columns
                .iter()
                .map(|c| Field::qualified(table_name, c.name.clone(), c.logical_type.clone()))
                .collect(),
        );
        Self::from_plan(Arc::new(LogicalOperator::Get(GetOperator {
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            column_ids: (0..columns.len()).collect(),
            schema: Arc::new(schema),
        })))
    }

    /// A relation with one row and no columns.
    pub fn empty() -> Self {
        Self::from_plan(Arc::new(LogicalOperator::EmptyRelation(
            EmptyRelationOperator::one_row(),
        )))
    }

    /// A relation with no rows and no columns.
    pub fn nothing() -> Self {
        Self::from_plan(Arc::new(LogicalOperator::EmptyRelation(
            EmptyRelationOperator {
                produce_one_row: false,
                schema: Arc::new(Schema::empty()),
            },
        )))
    }

    /// Literal rows, as in `(VALUES (1, 'a'), (2, 'b')) t(names...)`.
    ///
    /// Column types are the common type of each column; rows whose value
    /// type differs are cast.
    pub fn values(names: &[&str], rows: Vec<Vec<ParsedExpression>>) -> StrataResult<Self> {
        let registry = FunctionRegistry::builtin();
        let empty = Schema::empty();
        let binder = ExpressionBinder::new(&empty, &registry).with_clause("VALUES");

        let mut bound_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            if row.len() != names.len() {
                return Err(StrataError::bind(format!(
                    "VALUES lists must all be the same length: expected {}, got {}",
                    names.len(),
                    row.len()
                )));
            }
            let bound = row
                .iter()
                .map(|e| binder.bind(e))
                .collect::<StrataResult<Vec<_>>>()?;
            if let Some(e) = bound.iter().find(|e| !e.is_foldable()) {
                return Err(StrataError::bind(format!("VALUES entry {e} is not a constant")));
            }
            bound_rows.push(bound);
        }

        let mut types = vec![LogicalType::Null; names.len()];
        for row in &bound_rows {
            for (ty, expr) in types.iter_mut().zip(row) {
                *ty = LogicalType::max_type(ty, expr.return_type()).ok_or_else(|| {
                    StrataError::bind(format!(
                        "Cannot combine types {ty} and {} in VALUES",
                        expr.return_type()
                    ))
                })?;
            }
        }
        for row in &mut bound_rows {
            for (expr, ty) in row.iter_mut().zip(&types) {
                if expr.return_type() != ty {
                    *expr = expr.clone().cast(ty.clone());
                }
            }
        }

        let schema = Schema::new(
            names
                .iter()
                .zip(&types)
                .map(|(name, ty)| Field::new(*name, ty.clone()))
                .collect(),
        );
        Ok(Self::from_plan(Arc::new(LogicalOperator::Values(
            ValuesOperator {
                rows: bound_rows,
                schema: Arc::new(schema),
            },
        ))))
    }

    /// A DDL statement.
    pub fn create(info: CreateInfo) -> Self {
        Self::from_plan(Arc::new(LogicalOperator::Create(CreateOperator { info })))
    }

    /// Returns the output schema of the plan so far.
    pub fn schema(&self) -> SchemaRef {
        self.plan.schema()
    }

    /// Wraps the plan so far as a subquery expression.
    pub fn subquery(&self, kind: SubqueryKind) -> ParsedExpression {
        ParsedExpression::Subquery {
            kind,
            plan: self.plan.clone(),
        }
    }

    /// Returns the finished plan.
    pub fn build(self) -> Arc<LogicalOperator> {
        debug!(root = self.plan.name(), "built logical plan");
        self.plan
    }

    fn wrap(self, plan: LogicalOperator) -> Self {
        Self {
            plan: Arc::new(plan),
            registry: self.registry,
        }
    }

    /// Keeps rows for which `predicate` is true.
    pub fn filter(self, predicate: ParsedExpression) -> StrataResult<Self> {
        let schema = self.schema();
        let binder = ExpressionBinder::new(&schema, &self.registry).with_clause("WHERE clause");
        let predicate = binder.bind(&predicate)?;
        ensure_boolean(&predicate, "WHERE clause")?;
        let input = self.plan.clone();
        Ok(self.wrap(LogicalOperator::Filter(FilterOperator { input, predicate })))
    }

    /// Computes row-preserving expressions.
    pub fn project(self, expressions: Vec<ParsedExpression>) -> StrataResult<Self> {
        let schema = self.schema();
        let binder = ExpressionBinder::new(&schema, &self.registry).with_clause("SELECT list");
        let bound = expressions
            .iter()
            .map(|e| binder.bind(e))
            .collect::<StrataResult<Vec<_>>>()?;
        Ok(self.project_bound(bound))
    }

    fn project_bound(self, expressions: Vec<BoundExpression>) -> Self {
        let input_schema = self.schema();
        let fields = expressions
            .iter()
            .map(|expr| match expr {
                BoundExpression::ColumnRef { index, .. } => input_schema.fields()[*index].clone(),
                other => Field::new(other.name(), other.return_type().clone()),
            })
            .collect();
        let input = self.plan.clone();
        self.wrap(LogicalOperator::Projection(ProjectionOperator {
            input,
            expressions,
            schema: Arc::new(Schema::new(fields)),
        }))
    }

    /// A SELECT list without GROUP BY.
    ///
    /// Aggregate calls anywhere in the list make it an ungrouped aggregate;
    /// UNNEST calls anywhere outside an aggregate expand rows. The plan is
    /// Aggregate, then Unnest, then a Projection computing the rest of each
    /// expression over their output columns, so `UNNEST(LIST(e))` and
    /// `UNNEST(l) + 1` are both valid.
    pub fn select(self, expressions: Vec<ParsedExpression>) -> StrataResult<Self> {
        let registry = self.registry.clone();
        let schema = self.schema();
        let binder = ExpressionBinder::new(&schema, &registry);

        let has_unnest = expressions
            .iter()
            .any(|e| contains_call(e, &binder, ExpressionClass::Unnest));
        let has_aggregate = expressions
            .iter()
            .any(|e| contains_call(e, &binder, ExpressionClass::Aggregate));
        if !has_unnest && !has_aggregate {
            return self.project(expressions);
        }
        if !has_unnest
            && expressions
                .iter()
                .all(|e| binder.classify(e) == ExpressionClass::Aggregate)
        {
            return self.aggregate(vec![], expressions);
        }

        let mut builder = self;
        let mut expressions = expressions;

        if has_aggregate {
            let mut aggregates = Vec::new();
            let mut rewritten = Vec::with_capacity(expressions.len());
            for expr in &expressions {
                let expr = replace_calls(
                    expr,
                    &binder,
                    ExpressionClass::Aggregate,
                    &mut |call: &ParsedExpression| {
                        let aggregate = binder.bind_aggregate(call)?;
                        let column = BoundExpression::column(
                            aggregate.name(),
                            aggregates.len(),
                            aggregate.return_type.clone(),
                        );
                        aggregates.push(aggregate);
                        Ok(column)
                    },
                )?;
                if let Some(column) = first_column(&expr) {
                    return Err(StrataError::bind(format!(
                        "column \"{column}\" must appear in the GROUP BY clause or be used in an aggregate function"
                    )));
                }
                rewritten.push(expr);
            }
            builder = builder.aggregate_bound(vec![], aggregates);
            expressions = rewritten;
        }

        if has_unnest {
            let schema = builder.schema();
            let binder = ExpressionBinder::new(&schema, &registry);
            let width = schema.len();
            let mut unnests = Vec::new();
            let mut rewritten = Vec::with_capacity(expressions.len());
            for expr in &expressions {
                let expr = replace_calls(
                    expr,
                    &binder,
                    ExpressionClass::Unnest,
                    &mut |call: &ParsedExpression| {
                        let unnest = binder.bind_unnest(call)?;
                        let column = BoundExpression::column(
                            unnest.name(),
                            width + unnests.len(),
                            unnest.return_type.clone(),
                        );
                        unnests.push(unnest);
                        Ok(column)
                    },
                )?;
                rewritten.push(expr);
            }
            builder = builder.unnest_bound(unnests);
            expressions = rewritten;
        }

        builder.project(expressions)
    }

    /// Groups by `groups` and computes `aggregates` per group. Output
    /// columns are the groups followed by the aggregates.
    pub fn aggregate(
        self,
        groups: Vec<ParsedExpression>,
        aggregates: Vec<ParsedExpression>,
    ) -> StrataResult<Self> {
        let schema = self.schema();
        let group_binder =
            ExpressionBinder::new(&schema, &self.registry).with_clause("GROUP BY clause");
        let groups = groups
            .iter()
            .map(|e| group_binder.bind(e))
            .collect::<StrataResult<Vec<_>>>()?;

        let binder = ExpressionBinder::new(&schema, &self.registry);
        let aggregates = aggregates
            .iter()
            .map(|e| binder.bind_aggregate(e))
            .collect::<StrataResult<Vec<_>>>()?;

        Ok(self.aggregate_bound(groups, aggregates))
    }

    fn aggregate_bound(
        self,
        groups: Vec<BoundExpression>,
        aggregates: Vec<BoundAggregateExpression>,
    ) -> Self {
        let schema = self.schema();
        let mut fields: Vec<Field> = groups
            .iter()
            .map(|g| match g {
                BoundExpression::ColumnRef { index, .. } => schema.fields()[*index].clone(),
                other => Field::new(other.name(), other.return_type().clone()),
            })
            .collect();
        fields.extend(
            aggregates
                .iter()
                .map(|a| Field::new(a.name(), a.return_type.clone())),
        );

        let input = self.plan.clone();
        self.wrap(LogicalOperator::Aggregate(AggregateOperator {
            input,
            groups,
            aggregates,
            having: None,
            schema: Arc::new(Schema::new(fields)),
        }))
    }

    /// Adds a HAVING predicate over the output of the aggregate just built.
    pub fn having(self, predicate: ParsedExpression) -> StrataResult<Self> {
        let LogicalOperator::Aggregate(aggregate) = self.plan.as_ref() else {
            return Err(StrataError::bind("HAVING requires an aggregate"));
        };
        if aggregate.having.is_some() {
            return Err(StrataError::bind("aggregate already has a HAVING clause"));
        }
        let binder =
            ExpressionBinder::new(&aggregate.schema, &self.registry).with_clause("HAVING clause");
        let predicate = binder.bind(&predicate)?;
        ensure_boolean(&predicate, "HAVING clause")?;

        let mut aggregate = aggregate.clone();
        aggregate.having = Some(predicate);
        Ok(self.wrap(LogicalOperator::Aggregate(aggregate)))
    }

    /// Expands LIST expressions into rows. Output columns are the input
    /// columns followed by one column per expression.
    pub fn unnest(self, expressions: Vec<ParsedExpression>) -> StrataResult<Self> {
        let schema = self.schema();
        let binder = ExpressionBinder::new(&schema, &self.registry);
        let unnests = expressions
            .iter()
            .map(|e| binder.bind_unnest(e))
            .collect::<StrataResult<Vec<_>>>()?;
        Ok(self.unnest_bound(unnests))
    }

    fn unnest_bound(self, unnests: Vec<BoundUnnestExpression>) -> Self {
        let schema = self.schema();
        let mut fields = schema.fields().to_vec();
        fields.extend(
            unnests
                .iter()
                .map(|u| Field::new(u.name(), u.return_type.clone())),
        );
        let input = self.plan.clone();
        self.wrap(LogicalOperator::Unnest(UnnestOperator {
            input,
            unnests,
            schema: Arc::new(Schema::new(fields)),
        }))
    }

    /// Sorts by `keys`.
    pub fn order_by(self, keys: Vec<SortKey>) -> StrataResult<Self> {
        let schema = self.schema();
        let binder = ExpressionBinder::new(&schema, &self.registry).with_clause("ORDER BY clause");
        let orders = keys
            .into_iter()
            .map(|key| {
                let expression = binder.bind(&key.expression)?;
                let mut node = match key.order {
                    OrderType::Ascending => BoundOrderByNode::ascending(expression),
                    OrderType::Descending => BoundOrderByNode::descending(expression),
                };
                if let Some(nulls_first) = key.nulls_first {
                    node.nulls_first = nulls_first;
                }
                Ok(node)
            })
            .collect::<StrataResult<Vec<_>>>()?;
        let input = self.plan.clone();
        Ok(self.wrap(LogicalOperator::Order(OrderOperator { input, orders })))
    }

    /// Skips `offset` rows and returns at most `limit` rows.
    #[must_use]
    pub fn limit(self, limit: Option<usize>, offset: usize) -> Self {
        let input = self.plan.clone();
        self.wrap(LogicalOperator::Limit(LimitOperator {
            input,
            limit,
            offset,
        }))
    }

    /// Qualifies every output column with `qualifier`.
    #[must_use]
    pub fn alias(self, qualifier: &str) -> Self {
        let schema = self.schema();
        let expressions = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| BoundExpression::column(f.name.clone(), i, f.logical_type.clone()))
            .collect();
        let input = self.plan.clone();
        self.wrap(LogicalOperator::Projection(ProjectionOperator {
            input,
            expressions,
            schema: Arc::new(schema.qualify(qualifier)),
        }))
    }

    /// Joins with `right`. The condition is bound against the left columns
    /// followed by the right columns.
    pub fn join(
        self,
        right: LogicalPlanBuilder,
        join_type: JoinType,
        condition: Option<ParsedExpression>,
    ) -> StrataResult<Self> {
        let schema = self.schema().merge(&right.schema());
        let condition = match condition {
            Some(condition) => {
                let binder =
                    ExpressionBinder::new(&schema, &self.registry).with_clause("JOIN condition");
                let condition = binder.bind(&condition)?;
                ensure_boolean(&condition, "JOIN condition")?;
                Some(condition)
            }
            None => None,
        };
        let left = self.plan.clone();
        Ok(self.wrap(LogicalOperator::Join(JoinOperator {
            left,
            right: right.plan,
            join_type,
            condition,
            schema: Arc::new(schema),
        })))
    }

    /// Appends the rows of this plan to a table, casting each column to the
    /// table's column type.
    pub fn insert_into(
        self,
        schema_name: &str,
        table_name: &str,
        columns: &[ColumnDefinition],
    ) -> StrataResult<Self> {
        let schema = self.schema();
        if schema.len() != columns.len() {
            return Err(StrataError::bind(format!(
                "table {table_name} has {} columns but {} values were supplied",
                columns.len(),
                schema.len()
            )));
        }
        let needs_cast = schema
            .types()
            .iter()
            .zip(columns)
            .any(|(ty, c)| *ty != c.logical_type);

        let builder = if needs_cast {
            let expressions = schema
                .fields()
                .iter()
                .zip(columns)
                .enumerate()
                .map(|(i, (field, column))| {
                    let expr =
                        BoundExpression::column(field.name.clone(), i, field.logical_type.clone());
                    if field.logical_type == column.logical_type {
                        expr
                    } else {
                        expr.cast(column.logical_type.clone()).alias(column.name.clone())
                    }
                })
                .collect();
            self.project_bound(expressions)
        } else {
            self
        };

        let input = builder.plan.clone();
        Ok(builder.wrap(LogicalOperator::Insert(InsertOperator {
            input,
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
        })))
    }

    /// Exports the rows of this plan to a file.
    #[must_use]
    pub fn copy_to(self, path: &str, format: &str) -> Self {
        let input = self.plan.clone();
        self.wrap(LogicalOperator::Copy(CopyOperator {
            input,
            path: path.to_string(),
            format: format.to_string(),
        }))
    }
}

/// Returns true if `expr` calls a function of `class` at any depth.
fn contains_call(
    expr: &ParsedExpression,
    binder: &ExpressionBinder<'_>,
    class: ExpressionClass,
) -> bool {
    match expr {
        ParsedExpression::Function { children, .. } => {
            binder.classify(expr) == class
                || children.iter().any(|c| contains_call(c, binder, class))
        }
        ParsedExpression::Cast { child, .. } | ParsedExpression::Alias { child, .. } => {
            contains_call(child, binder, class)
        }
        _ => false,
    }
}

/// Replaces every outermost call of `class` with the expression returned
/// by `replace`. Arguments of a replaced call are left to `replace`.
fn replace_calls<F>(
    expr: &ParsedExpression,
    binder: &ExpressionBinder<'_>,
    class: ExpressionClass,
    replace: &mut F,
) -> StrataResult<ParsedExpression>
where
    F: FnMut(&ParsedExpression) -> StrataResult<BoundExpression>,
{
    Ok(match expr {
        ParsedExpression::Function { .. } if binder.classify(expr) == class => {
            ParsedExpression::Bound(Box::new(replace(expr)?))
        }
        ParsedExpression::Function { name, children } => {
            let mut replaced = Vec::with_capacity(children.len());
            for child in children {
                replaced.push(replace_calls(child, binder, class, &mut *replace)?);
            }
            ParsedExpression::Function {
                name: name.clone(),
                children: replaced,
            }
        }
        ParsedExpression::Cast { child, target } => ParsedExpression::Cast {
            child: Box::new(replace_calls(child, binder, class, &mut *replace)?),
            target: target.clone(),
        },
        ParsedExpression::Alias { name, child } => ParsedExpression::Alias {
            name: name.clone(),
            child: Box::new(replace_calls(child, binder, class, &mut *replace)?),
        },
        other => other.clone(),
    })
}

/// Returns the first input column referenced by `expr`.
fn first_column(expr: &ParsedExpression) -> Option<&str> {
    match expr {
        ParsedExpression::Column(name) => Some(name.as_str()),
        ParsedExpression::Function { children, .. } => children.iter().find_map(first_column),
        ParsedExpression::Cast { child, .. } | ParsedExpression::Alias { child, .. } => {
            first_column(child)
        }
        _ => None,
    }
}

fn ensure_boolean(expr: &BoundExpression, clause: &str) -> StrataResult<()> {
    match expr.return_type() {
        LogicalType::Boolean | LogicalType::Null => Ok(()),
        other => Err(StrataError::bind(format!(
            "{clause} must be a BOOLEAN expression, not {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parsed::{col, func, lit};
    use crate::types::Value;

    fn numbers() -> LogicalPlanBuilder {
        LogicalPlanBuilder::values(
            &["g", "e"],
            vec![
                vec![lit(1), lit(1)],
                vec![lit(1), lit(Value::Null)],
                vec![lit(2), lit(3i64)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_values_common_type() {
        let plan = numbers().build();
        let schema = plan.schema();
        assert_eq!(schema.types(), vec![LogicalType::Integer, LogicalType::BigInt]);

        let LogicalOperator::Values(values) = plan.as_ref() else {
            panic!("expected VALUES");
        };
        assert!(matches!(values.rows[0][1], BoundExpression::Cast { .. }));
        assert!(matches!(values.rows[2][1], BoundExpression::Constant { .. }));
    }

    #[test]
    fn test_values_errors() {
        assert!(LogicalPlanBuilder::values(&["a"], vec![vec![lit(1), lit(2)]]).is_err());
        assert!(LogicalPlanBuilder::values(&["a"], vec![vec![col("x")]]).is_err());
        assert!(
            LogicalPlanBuilder::values(&["a"], vec![vec![lit(1)], vec![lit("x")]]).is_err()
        );
    }

    #[test]
    fn test_aggregate_schema() {
        let plan = numbers()
            .aggregate(vec![col("g")], vec![func("list", vec![col("e")])])
            .unwrap()
            .build();
        let schema = plan.schema();
        assert_eq!(schema.names(), vec!["g".to_string(), "list(e)".to_string()]);
        assert_eq!(schema.types()[1], LogicalType::list(LogicalType::BigInt));
    }

    #[test]
    fn test_select_splits_unnest() {
        let plan = LogicalPlanBuilder::empty()
            .select(vec![
                lit(7).alias("x"),
                func("unnest", vec![lit(Value::list([Value::Integer(1)]))]).alias("u"),
            ])
            .unwrap()
            .build();

        let LogicalOperator::Projection(projection) = plan.as_ref() else {
            panic!("expected projection");
        };
        assert!(matches!(projection.input.as_ref(), LogicalOperator::Unnest(_)));
        assert_eq!(plan.schema().names(), vec!["x".to_string(), "u".to_string()]);
    }

    #[test]
    fn test_select_rejects_ungrouped_column() {
        let err = numbers()
            .select(vec![col("g"), func("list", vec![col("e")])])
            .unwrap_err();
        assert!(err.to_string().contains("GROUP BY"));
    }

    #[test]
    fn test_select_unnest_over_aggregate() {
        let plan = numbers()
            .select(vec![
                func("unnest", vec![func("list", vec![col("e")])]).alias("ue"),
                func("list", vec![col("g")]),
            ])
            .unwrap()
            .build();

        let LogicalOperator::Projection(projection) = plan.as_ref() else {
            panic!("expected projection");
        };
        let LogicalOperator::Unnest(unnest) = projection.input.as_ref() else {
            panic!("expected unnest");
        };
        let LogicalOperator::Aggregate(aggregate) = unnest.input.as_ref() else {
            panic!("expected aggregate");
        };
        assert!(aggregate.groups.is_empty());
        assert_eq!(aggregate.aggregates.len(), 2);
        assert_eq!(unnest.unnests.len(), 1);
        assert_eq!(plan.schema().names(), vec!["ue".to_string(), "list(g)".to_string()]);
        assert_eq!(
            plan.schema().types(),
            vec![LogicalType::BigInt, LogicalType::list(LogicalType::Integer)]
        );
    }

    #[test]
    fn test_select_expression_over_unnest() {
        let lists = numbers()
            .aggregate(vec![col("g")], vec![func("list", vec![col("e")]).alias("l")])
            .unwrap();
        let plan = lists
            .select(vec![col("g"), func("unnest", vec![col("l")]).plus(lit(1))])
            .unwrap()
            .build();
        let LogicalOperator::Projection(projection) = plan.as_ref() else {
            panic!("expected projection");
        };
        assert!(matches!(projection.input.as_ref(), LogicalOperator::Unnest(_)));
        assert_eq!(plan.schema().types()[1], LogicalType::BigInt);

        let lists = numbers()
            .aggregate(vec![col("g")], vec![func("list", vec![col("e")]).alias("l")])
            .unwrap();
        assert!(lists
            .select(vec![func("unnest", vec![col("l").plus(lit(1))])])
            .is_err());
        assert!(numbers()
            .select(vec![func("list", vec![func("list", vec![col("e")])])])
            .is_err());
    }

    #[test]
    fn test_filter_requires_boolean() {
        assert!(numbers().filter(col("g")).is_err());
        assert!(numbers().filter(col("g").greater_than(lit(1))).is_ok());
    }

    #[test]
    fn test_having_needs_aggregate() {
        assert!(numbers().having(col("g").greater_than(lit(1))).is_err());
        let plan = numbers()
            .aggregate(vec![col("g")], vec![func("count_star", vec![]).alias("n")])
            .unwrap()
            .having(col("n").greater_than(lit(1)))
            .unwrap()
            .build();
        let LogicalOperator::Aggregate(aggregate) = plan.as_ref() else {
            panic!("expected aggregate");
        };
        assert!(aggregate.having.is_some());
    }

    #[test]
    fn test_insert_casts_to_table_types() {
        let columns = vec![
            ColumnDefinition::new("g", LogicalType::BigInt),
            ColumnDefinition::new("e", LogicalType::BigInt),
        ];
        let plan = numbers().insert_into("main", "t", &columns).unwrap().build();
        let LogicalOperator::Insert(insert) = plan.as_ref() else {
            panic!("expected insert");
        };
        assert_eq!(
            insert.input.schema().types(),
            vec![LogicalType::BigInt, LogicalType::BigInt]
        );
        assert!(numbers().insert_into("main", "t", &columns[..1]).is_err());
    }

    #[test]
    fn test_join_schema() {
        let right = numbers().alias("r");
        let plan = numbers()
            .alias("l")
            .join(right, JoinType::Inner, Some(col("l.g").equals(col("r.g"))))
            .unwrap()
            .build();
        let schema = plan.schema();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.index_of("r.e"), Some(3));
    }
}
