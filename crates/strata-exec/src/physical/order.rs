//! Full sort.

use std::cmp::Ordering;
use std::collections::VecDeque;

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::PhysicalOperator;
use super::rows_to_chunks;
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::{BoundOrderByNode, OrderType};
use crate::types::{LogicalType, Value};

/// Collects the whole input, sorts it and emits it again.
///
/// The sort is stable: rows with equal keys keep their input order.
#[derive(Debug)]
pub struct PhysicalOrder {
    child: Box<PhysicalOperator>,
    orders: Vec<BoundOrderByNode>,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
    sorted: Option<VecDeque<DataChunk>>,
}

impl PhysicalOrder {
    /// Creates a sort over `child`.
    pub fn new(child: PhysicalOperator, orders: Vec<BoundOrderByNode>) -> Self {
        let types = child.types().to_vec();
        Self {
            child: Box::new(child),
            orders,
            types,
            executor: ExpressionExecutor::new(),
            sorted: None,
        }
    }

    fn sort(&mut self, ctx: &ExecutionContext) -> StrataResult<Vec<Vec<Value>>> {
        let mut rows: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
        while let Some(chunk) = self.child.get_chunk(ctx)? {
            let keys = self
                .orders
                .iter()
                .map(|order| self.executor.execute(ctx, &order.expression, &chunk))
                .collect::<StrataResult<Vec<_>>>()?;
            for (row, values) in chunk.rows().enumerate() {
                let key = keys.iter().map(|k| k.value(row)).collect();
                rows.push((key, values));
            }
        }

        let orders = &self.orders;
        rows.sort_by(|(a, _), (b, _)| {
            orders
                .iter()
                .zip(a.iter().zip(b))
                .map(|(order, (a, b))| compare(order, a, b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(rows.into_iter().map(|(_, values)| values).collect())
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if self.sorted.is_none() {
            let rows = self.sort(ctx)?;
            self.sorted = Some(rows_to_chunks(&self.types, &rows, ctx.vector_size())?.into());
        }
        Ok(self.sorted.as_mut().and_then(VecDeque::pop_front))
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        self.orders
            .iter()
            .map(|order| {
                let direction = match order.order {
                    OrderType::Ascending => "ASC",
                    OrderType::Descending => "DESC",
                };
                let nulls = if order.nulls_first { "NULLS FIRST" } else { "NULLS LAST" };
                format!("{} {direction} {nulls}", order.expression)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn compare(order: &BoundOrderByNode, a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) if order.nulls_first => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, true) if order.nulls_first => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match order.order {
            OrderType::Ascending => a.cmp(b),
            OrderType::Descending => b.cmp(a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BoundExpression;
    use crate::physical::PhysicalColumnDataScan;

    fn scan(values: &[Option<i32>]) -> PhysicalOperator {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                vec![
                    BoundExpression::typed_constant(Value::from(*v), LogicalType::Integer),
                    BoundExpression::constant(Value::Integer(i as i32)),
                ]
            })
            .collect();
        PhysicalOperator::ColumnDataScan(PhysicalColumnDataScan::new(
            rows,
            vec![LogicalType::Integer, LogicalType::Integer],
        ))
    }

    fn sorted(values: &[Option<i32>], order: BoundOrderByNode) -> Vec<Value> {
        let ctx = ExecutionContext::for_testing();
        let mut op = PhysicalOperator::Order(PhysicalOrder::new(scan(values), vec![order]));
        let mut out = Vec::new();
        while let Some(chunk) = op.get_chunk(&ctx).unwrap() {
            out.extend(chunk.column(0).unwrap().values());
        }
        out
    }

    fn key() -> BoundExpression {
        BoundExpression::column("v", 0, LogicalType::Integer)
    }

    #[test]
    fn test_ascending_nulls_first() {
        let values = [Some(3), None, Some(1), Some(2), None, Some(0)];
        assert_eq!(
            sorted(&values, BoundOrderByNode::ascending(key())),
            vec![
                Value::Null,
                Value::Null,
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ]
        );
    }

    #[test]
    fn test_descending_nulls_last() {
        let values = [Some(3), None, Some(1)];
        assert_eq!(
            sorted(&values, BoundOrderByNode::descending(key())),
            vec![Value::Integer(3), Value::Integer(1), Value::Null]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let ctx = ExecutionContext::for_testing();
        let values = [Some(1), Some(0), Some(1), Some(0), Some(1)];
        let mut op = PhysicalOperator::Order(PhysicalOrder::new(
            scan(&values),
            vec![BoundOrderByNode::ascending(key())],
        ));
        let mut positions = Vec::new();
        while let Some(chunk) = op.get_chunk(&ctx).unwrap() {
            positions.extend(chunk.column(1).unwrap().values());
        }
        let expected: Vec<Value> = [1, 3, 0, 2, 4].into_iter().map(Value::Integer).collect();
        assert_eq!(positions, expected);
    }
}
