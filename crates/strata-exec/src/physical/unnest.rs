//! List expansion.

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::{join_display, PhysicalOperator};
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::BoundUnnestExpression;
use crate::types::LogicalType;
use crate::vector::{SelectionVector, Vector, VectorBuilder};

/// Expands LIST values into rows.
///
/// Each input row produces `max(len, 1)` output rows, where `len` is the
/// longest of its lists; a NULL or empty list counts as length zero and
/// yields a single NULL. Several lists are zipped, shorter ones padded
/// with NULL. Input columns are repeated through a selection, so they are
/// never copied. A row with a long list may spill over several pulls.
#[derive(Debug)]
pub struct PhysicalUnnest {
    child: Box<PhysicalOperator>,
    unnests: Vec<BoundUnnestExpression>,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
    state: Option<UnnestState>,
}

/// Position inside the input chunk being expanded.
#[derive(Debug)]
struct UnnestState {
    input: DataChunk,
    lists: Vec<Vector>,
    row: usize,
    element: usize,
}

impl PhysicalUnnest {
    /// Creates an unnest over `child`.
    pub fn new(child: PhysicalOperator, unnests: Vec<BoundUnnestExpression>) -> Self {
        let types = child
            .types()
            .iter()
            .cloned()
            .chain(unnests.iter().map(|u| u.return_type.clone()))
            .collect();
        Self {
            child: Box::new(child),
            unnests,
            types,
            executor: ExpressionExecutor::new(),
            state: None,
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        loop {
            if self.state.is_none() {
                let Some(input) = self.child.get_chunk(ctx)? else {
                    return Ok(None);
                };
                if input.is_empty() {
                    continue;
                }
                let lists = self
                    .unnests
                    .iter()
                    .map(|u| self.executor.execute(ctx, &u.child, &input))
                    .collect::<StrataResult<Vec<_>>>()?;
                self.state = Some(UnnestState {
                    input,
                    lists,
                    row: 0,
                    element: 0,
                });
            }

            let Some(state) = self.state.as_mut() else {
                continue;
            };
            let output = Self::expand(state, &self.types, ctx.vector_size())?;
            if state.row >= state.input.size() {
                self.state = None;
            }
            if let Some(output) = output {
                return Ok(Some(output));
            }
        }
    }

    /// Produces the next output chunk from the current input chunk.
    fn expand(
        state: &mut UnnestState,
        types: &[LogicalType],
        vector_size: usize,
    ) -> StrataResult<Option<DataChunk>> {
        let mut input_rows = SelectionVector::with_capacity(vector_size);
        let mut element_rows: Vec<Vec<Option<usize>>> = vec![Vec::new(); state.lists.len()];

        while input_rows.len() < vector_size && state.row < state.input.size() {
            let entries: Vec<_> = state
                .lists
                .iter()
                .map(|list| list.list_entry(state.row))
                .collect();
            let rows = entries
                .iter()
                .map(|entry| entry.map_or(0, |e| e.length))
                .max()
                .unwrap_or(0)
                .max(1);

            while state.element < rows && input_rows.len() < vector_size {
                input_rows.push(state.row);
                for (out, entry) in element_rows.iter_mut().zip(&entries) {
                    out.push(
                        entry
                            .filter(|e| state.element < e.length)
                            .map(|e| e.offset + state.element),
                    );
                }
                state.element += 1;
            }
            if state.element >= rows {
                state.row += 1;
                state.element = 0;
            }
        }

        if input_rows.is_empty() {
            return Ok(None);
        }
        let mut output = state.input.slice(&input_rows)?;
        let unnest_types = &types[state.input.column_count()..];
        for ((list, rows), ty) in state.lists.iter().zip(&element_rows).zip(unnest_types) {
            let column = DataChunk::new(vec![elements(list, rows, ty)?])?;
            output = output.fuse(column)?;
        }
        Ok(Some(output))
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        join_display(
            &self
                .unnests
                .iter()
                .map(BoundUnnestExpression::name)
                .collect::<Vec<_>>(),
        )
    }
}

/// Builds the output column for one list. Rows that map to an element are
/// a zero-copy slice of the element child; padding forces a copy.
fn elements(list: &Vector, rows: &[Option<usize>], ty: &LogicalType) -> StrataResult<Vector> {
    if rows.iter().all(Option::is_some) {
        let selection: SelectionVector = rows.iter().flatten().copied().collect();
        return list.list_child()?.slice(&selection);
    }
    let mut builder = VectorBuilder::with_capacity(ty, rows.len());
    for row in rows {
        match row {
            Some(index) => builder.push_from(list.list_child()?, *index)?,
            None => builder.push_null(),
        }
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parsed::{col, func};
    use crate::expression::{BoundExpression, ExpressionBinder};
    use crate::function::FunctionRegistry;
    use crate::logical::{Field, Schema};
    use crate::physical::PhysicalColumnDataScan;
    use crate::types::Value;

    fn list_input(lists: Vec<Value>) -> (Schema, PhysicalOperator) {
        let schema = Schema::new(vec![
            Field::new("id", LogicalType::Integer),
            Field::new("l", LogicalType::list(LogicalType::Integer)),
        ]);
        let rows = lists
            .into_iter()
            .enumerate()
            .map(|(i, list)| {
                vec![
                    BoundExpression::constant(Value::Integer(i as i32)),
                    BoundExpression::typed_constant(list, LogicalType::list(LogicalType::Integer)),
                ]
            })
            .collect();
        let scan = PhysicalColumnDataScan::new(rows, schema.types());
        (schema, PhysicalOperator::ColumnDataScan(scan))
    }

    fn ints(values: &[i32]) -> Value {
        Value::list(values.iter().map(|v| Value::Integer(*v)))
    }

    fn unnest_of(schema: &Schema, name: &str) -> BoundUnnestExpression {
        let registry = FunctionRegistry::builtin();
        ExpressionBinder::new(schema, &registry)
            .bind_unnest(&func("unnest", vec![col(name)]))
            .unwrap()
    }

    #[test]
    fn test_null_and_empty_lists_yield_one_null_row() {
        let ctx = ExecutionContext::for_testing();
        let (schema, scan) = list_input(vec![ints(&[1, 2]), Value::Null, ints(&[]), ints(&[3])]);
        let unnest = unnest_of(&schema, "l");
        let mut op = PhysicalOperator::Unnest(PhysicalUnnest::new(scan, vec![unnest]));

        let mut rows = Vec::new();
        while let Some(chunk) = op.get_chunk(&ctx).unwrap() {
            assert!(chunk.size() <= ctx.vector_size());
            rows.extend(chunk.rows().map(|r| (r[0].clone(), r[2].clone())));
        }
        assert_eq!(
            rows,
            vec![
                (Value::Integer(0), Value::Integer(1)),
                (Value::Integer(0), Value::Integer(2)),
                (Value::Integer(1), Value::Null),
                (Value::Integer(2), Value::Null),
                (Value::Integer(3), Value::Integer(3)),
            ]
        );
    }

    #[test]
    fn test_long_list_spills_across_pulls() {
        let ctx = ExecutionContext::for_testing();
        let long: Vec<i32> = (0..10).collect();
        let (schema, scan) = list_input(vec![ints(&long), ints(&[42])]);
        let unnest = unnest_of(&schema, "l");
        let mut op = PhysicalOperator::Unnest(PhysicalUnnest::new(scan, vec![unnest]));

        let mut sizes = Vec::new();
        let mut values = Vec::new();
        while let Some(chunk) = op.get_chunk(&ctx).unwrap() {
            sizes.push(chunk.size());
            values.extend(chunk.column(2).unwrap().values());
        }
        assert_eq!(sizes, vec![4, 4, 3]);
        let expected: Vec<Value> = (0..10).chain([42]).map(Value::Integer).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_sibling_columns_are_broadcast_without_copy() {
        let ctx = ExecutionContext::for_testing();
        let (schema, scan) = list_input(vec![ints(&[1, 2, 3])]);
        let unnest = unnest_of(&schema, "l");
        let mut op = PhysicalOperator::Unnest(PhysicalUnnest::new(scan, vec![unnest]));

        let chunk = op.get_chunk(&ctx).unwrap().unwrap();
        assert_eq!(chunk.column(0).unwrap().values(), vec![Value::Integer(0); 3]);
        assert_eq!(
            chunk.column(1).unwrap().values(),
            vec![ints(&[1, 2, 3]); 3]
        );
    }

    #[test]
    fn test_zipped_lists_pad_with_null() {
        let ctx = ExecutionContext::for_testing();
        let schema = Schema::new(vec![
            Field::new("l1", LogicalType::list(LogicalType::Integer)),
            Field::new("l2", LogicalType::list(LogicalType::Integer)),
        ]);
        let rows = vec![vec![
            BoundExpression::constant(ints(&[1, 2, 3])),
            BoundExpression::constant(ints(&[4, 5, 6, 7])),
        ]];
        let scan = PhysicalOperator::ColumnDataScan(PhysicalColumnDataScan::new(
            rows,
            schema.types(),
        ));
        let unnests = vec![unnest_of(&schema, "l1"), unnest_of(&schema, "l2")];
        let mut op = PhysicalOperator::Unnest(PhysicalUnnest::new(scan, unnests));

        let mut pairs = Vec::new();
        while let Some(chunk) = op.get_chunk(&ctx).unwrap() {
            pairs.extend(chunk.rows().map(|r| (r[2].clone(), r[3].clone())));
        }
        assert_eq!(
            pairs,
            vec![
                (Value::Integer(1), Value::Integer(4)),
                (Value::Integer(2), Value::Integer(5)),
                (Value::Integer(3), Value::Integer(6)),
                (Value::Null, Value::Integer(7)),
            ]
        );
    }
}
