//! Evaluation of bound expressions over data chunks.
//!
//! The executor turns one bound expression and one input chunk into one
//! output vector with the same number of rows. Column references and
//! scalar functions that return their input are zero copy; constants are
//! broadcast without materializing a row per input row.

use std::collections::HashMap;
use std::sync::Arc;

use strata_common::{StrataError, StrataResult};
use tracing::trace;

use crate::chunk::DataChunk;
use crate::expression::{BoundExpression, BoundSubqueryExpression, SubqueryKind};
use crate::physical::{ExecutionContext, PhysicalPlanGenerator};
use crate::types::{LogicalType, Value};
use crate::vector::{SelectionVector, Vector, VectorBuilder};

/// Evaluates bound expressions.
///
/// An executor belongs to one operator. It caches the result of each
/// uncorrelated subquery so the subquery runs at most once per query.
#[derive(Debug, Default)]
pub struct ExpressionExecutor {
    subquery_results: HashMap<(usize, SubqueryKind), Value>,
}

impl ExpressionExecutor {
    /// Creates an executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `expr` over `chunk`. The result has `chunk.size()` rows.
    pub fn execute(
        &mut self,
        ctx: &ExecutionContext,
        expr: &BoundExpression,
        chunk: &DataChunk,
    ) -> StrataResult<Vector> {
        self.execute_expression(Some(ctx), expr, chunk)
    }

    /// Evaluates every expression, producing one column each.
    pub fn execute_all(
        &mut self,
        ctx: &ExecutionContext,
        exprs: &[BoundExpression],
        chunk: &DataChunk,
    ) -> StrataResult<DataChunk> {
        let columns = exprs
            .iter()
            .map(|e| self.execute(ctx, e, chunk))
            .collect::<StrataResult<Vec<_>>>()?;
        DataChunk::with_count(columns, chunk.size())
    }

    /// Returns the rows of `chunk` for which `predicate` is true. NULL
    /// counts as false.
    pub fn select(
        &mut self,
        ctx: &ExecutionContext,
        predicate: &BoundExpression,
        chunk: &DataChunk,
    ) -> StrataResult<SelectionVector> {
        let result = self.execute(ctx, predicate, chunk)?;
        if result.is_constant() {
            return Ok(if result.value(0) == Value::Boolean(true) {
                SelectionVector::range(0, chunk.size())
            } else {
                SelectionVector::new(Vec::new())
            });
        }
        Ok((0..chunk.size())
            .filter(|&row| matches!(result.value(row), Value::Boolean(true)))
            .collect())
    }

    /// Evaluates an expression that depends on no input rows.
    pub fn evaluate_constant(expr: &BoundExpression) -> StrataResult<Value> {
        if !expr.is_foldable() {
            return Err(StrataError::internal(format!(
                "cannot evaluate non-constant expression {expr}"
            )));
        }
        let input = DataChunk::with_count(Vec::new(), 1)?;
        let result = Self::new().execute_expression(None, expr, &input)?;
        Ok(result.value(0))
    }

    fn execute_expression(
        &mut self,
        ctx: Option<&ExecutionContext>,
        expr: &BoundExpression,
        chunk: &DataChunk,
    ) -> StrataResult<Vector> {
        let count = chunk.size();
        let result = match expr {
            BoundExpression::ColumnRef { index, .. } => chunk
                .column(*index)
                .cloned()
                .ok_or_else(|| StrataError::internal(format!("invalid column index: {index}")))?,
            BoundExpression::Constant { value, return_type } => {
                Vector::constant(value, return_type, count)?
            }
            BoundExpression::Function(function) => {
                let arguments = function
                    .children
                    .iter()
                    .map(|child| self.execute_expression(ctx, child, chunk))
                    .collect::<StrataResult<Vec<_>>>()?;
                let arguments = DataChunk::with_count(arguments, count)?;
                (function.function.function)(&arguments, function)?
            }
            BoundExpression::Cast { child, target } => {
                let input = self.execute_expression(ctx, child, chunk)?;
                cast_vector(&input, target)?
            }
            BoundExpression::Alias { child, .. } => self.execute_expression(ctx, child, chunk)?,
            BoundExpression::Subquery(subquery) => {
                let ctx = ctx.ok_or_else(|| {
                    StrataError::internal("subquery evaluated without an execution context")
                })?;
                let value = self.subquery_value(ctx, subquery)?;
                Vector::constant(&value, &subquery.return_type, count)?
            }
        };

        if result.len() != count {
            return Err(StrataError::internal(format!(
                "expression {expr} produced {} rows for {count} input rows",
                result.len()
            )));
        }
        Ok(result)
    }

    fn subquery_value(
        &mut self,
        ctx: &ExecutionContext,
        subquery: &BoundSubqueryExpression,
    ) -> StrataResult<Value> {
        let key = (Arc::as_ptr(&subquery.subquery) as usize, subquery.kind);
        if let Some(value) = self.subquery_results.get(&key) {
            return Ok(value.clone());
        }

        let mut root = PhysicalPlanGenerator::new().create_plan(&subquery.subquery)?;
        let mut value = match subquery.kind {
            SubqueryKind::Scalar => Value::Null,
            SubqueryKind::Exists => Value::Boolean(false),
        };
        while let Some(chunk) = root.get_chunk(ctx)? {
            if chunk.is_empty() {
                continue;
            }
            value = match subquery.kind {
                SubqueryKind::Scalar => chunk
                    .column(0)
                    .map_or(Value::Null, |column| column.value(0)),
                SubqueryKind::Exists => Value::Boolean(true),
            };
            break;
        }
        trace!(kind = %subquery.kind, %value, "evaluated subquery");

        self.subquery_results.insert(key, value.clone());
        Ok(value)
    }
}

/// Casts every row of `input` to `target`.
fn cast_vector(input: &Vector, target: &LogicalType) -> StrataResult<Vector> {
    if input.logical_type() == target {
        return Ok(input.clone());
    }
    if input.is_constant() {
        return Vector::constant(&input.value(0).cast(target)?, target, input.len());
    }
    let mut builder = VectorBuilder::with_capacity(target, input.len());
    for row in 0..input.len() {
        builder.push(&input.value(row).cast(target)?)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parsed::{col, func, lit};
    use crate::expression::ExpressionBinder;
    use crate::function::FunctionRegistry;
    use crate::logical::{Field, LogicalPlanBuilder, Schema};

    fn input() -> (Schema, DataChunk) {
        let point = LogicalType::struct_of([
            ("x", LogicalType::Integer),
            ("tags", LogicalType::list(LogicalType::Varchar)),
        ]);
        let schema = Schema::new(vec![
            Field::new("a", LogicalType::Integer),
            Field::new("p", point.clone()),
        ]);
        let chunk = DataChunk::from_rows(
            &schema.types(),
            &[
                vec![
                    Value::Integer(1),
                    Value::struct_value([("x", Value::Integer(10)), ("tags", Value::list([]))]),
                ],
                vec![Value::Null, Value::Null],
                vec![
                    Value::Integer(3),
                    Value::struct_value([
                        ("x", Value::Integer(30)),
                        ("tags", Value::list([Value::varchar("t")])),
                    ]),
                ],
            ],
        )
        .unwrap();
        (schema, chunk)
    }

    fn bind(schema: &Schema, expr: &crate::expression::ParsedExpression) -> BoundExpression {
        let registry = FunctionRegistry::builtin();
        ExpressionBinder::new(schema, &registry).bind(expr).unwrap()
    }

    #[test]
    fn test_column_ref_is_zero_copy() {
        let (schema, chunk) = input();
        let ctx = ExecutionContext::for_testing();
        let mut executor = ExpressionExecutor::new();

        let result = executor.execute(&ctx, &bind(&schema, &col("p")), &chunk).unwrap();
        assert!(result.shares_buffer(chunk.column(1).unwrap()));
    }

    #[test]
    fn test_constant_broadcast() {
        let (schema, chunk) = input();
        let ctx = ExecutionContext::for_testing();
        let mut executor = ExpressionExecutor::new();

        let result = executor.execute(&ctx, &bind(&schema, &lit(5)), &chunk).unwrap();
        assert!(result.is_constant());
        assert_eq!(result.values(), vec![Value::Integer(5); 3]);
    }

    #[test]
    fn test_struct_extract_through_executor() {
        let (schema, chunk) = input();
        let ctx = ExecutionContext::for_testing();
        let mut executor = ExpressionExecutor::new();

        let expr = bind(&schema, &func("struct_extract", vec![col("p"), lit("X")]));
        let result = executor.execute(&ctx, &expr, &chunk).unwrap();
        assert_eq!(
            result.values(),
            vec![Value::Integer(10), Value::Null, Value::Integer(30)]
        );
    }

    #[test]
    fn test_select_treats_null_as_false() {
        let (schema, chunk) = input();
        let ctx = ExecutionContext::for_testing();
        let mut executor = ExpressionExecutor::new();

        let predicate = bind(&schema, &col("a").greater_than(lit(0)));
        let selection = executor.select(&ctx, &predicate, &chunk).unwrap();
        assert_eq!(selection.indices(), &[0, 2]);

        let always = bind(&schema, &lit(true));
        assert_eq!(executor.select(&ctx, &always, &chunk).unwrap().len(), 3);
    }

    #[test]
    fn test_cast() {
        let (schema, chunk) = input();
        let ctx = ExecutionContext::for_testing();
        let mut executor = ExpressionExecutor::new();

        let expr = bind(&schema, &col("a").cast(LogicalType::Varchar));
        let result = executor.execute(&ctx, &expr, &chunk).unwrap();
        assert_eq!(
            result.values(),
            vec![Value::varchar("1"), Value::Null, Value::varchar("3")]
        );

        let bad = bind(&schema, &lit("abc").cast(LogicalType::Integer));
        assert!(matches!(
            executor.execute(&ctx, &bad, &chunk),
            Err(StrataError::Conversion { .. })
        ));
    }

    #[test]
    fn test_evaluate_constant() {
        let schema = Schema::empty();
        let expr = bind(&schema, &lit(40).plus(lit(2)));
        assert_eq!(
            ExpressionExecutor::evaluate_constant(&expr).unwrap(),
            Value::Integer(42)
        );

        let (schema, _) = input();
        assert!(ExpressionExecutor::evaluate_constant(&bind(&schema, &col("a"))).is_err());
    }

    #[test]
    fn test_subqueries_are_cached() {
        let ctx = ExecutionContext::for_testing();
        let values = LogicalPlanBuilder::values(&["v"], vec![vec![lit(7)], vec![lit(8)]]).unwrap();

        let schema = Schema::empty();
        let scalar = bind(&schema, &values.subquery(SubqueryKind::Scalar));
        let exists = bind(&schema, &values.subquery(SubqueryKind::Exists));
        let chunk = DataChunk::with_count(Vec::new(), 2).unwrap();

        let mut executor = ExpressionExecutor::new();
        let result = executor.execute(&ctx, &scalar, &chunk).unwrap();
        assert_eq!(result.values(), vec![Value::Integer(7); 2]);
        assert_eq!(executor.subquery_results.len(), 1);
        executor.execute(&ctx, &scalar, &chunk).unwrap();
        assert_eq!(executor.subquery_results.len(), 1);

        let result = executor.execute(&ctx, &exists, &chunk).unwrap();
        assert_eq!(result.values(), vec![Value::Boolean(true); 2]);
        assert_eq!(executor.subquery_results.len(), 2);

        let empty = LogicalPlanBuilder::nothing();
        let none = bind(&schema, &empty.subquery(SubqueryKind::Exists));
        let result = executor.execute(&ctx, &none, &chunk).unwrap();
        assert_eq!(result.values(), vec![Value::Boolean(false); 2]);
    }
}
