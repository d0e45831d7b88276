//! Hash aggregation.

use std::collections::{HashMap, VecDeque};

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::{join_display, PhysicalOperator};
use super::rows_to_chunks;
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::{BoundAggregateExpression, BoundExpression};
use crate::function::Accumulator;
use crate::types::{LogicalType, Value};

/// Groups the input by the group expressions and computes every aggregate
/// per group.
///
/// Output rows are the group values followed by the aggregate results.
/// Groups are emitted in the order they were first seen. Without groups the
/// operator always emits exactly one row, even for empty input.
#[derive(Debug)]
pub struct PhysicalHashAggregate {
    child: Box<PhysicalOperator>,
    groups: Vec<BoundExpression>,
    aggregates: Vec<BoundAggregateExpression>,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
    results: Option<VecDeque<DataChunk>>,
}

/// Accumulated state of one group.
#[derive(Debug)]
struct GroupState {
    key: Vec<Value>,
    accumulators: Vec<Accumulator>,
}

impl PhysicalHashAggregate {
    /// Creates an aggregate over `child`.
    pub fn new(
        child: PhysicalOperator,
        groups: Vec<BoundExpression>,
        aggregates: Vec<BoundAggregateExpression>,
    ) -> Self {
        let types = groups
            .iter()
            .map(|g| g.return_type().clone())
            .chain(aggregates.iter().map(|a| a.return_type.clone()))
            .collect();
        Self {
            child: Box::new(child),
            groups,
            aggregates,
            types,
            executor: ExpressionExecutor::new(),
            results: None,
        }
    }

    fn new_accumulators(&self) -> Vec<Accumulator> {
        self.aggregates
            .iter()
            .map(|a| Accumulator::new(a.function.kind, &a.return_type))
            .collect()
    }

    fn aggregate(&mut self, ctx: &ExecutionContext) -> StrataResult<Vec<GroupState>> {
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut states: Vec<GroupState> = Vec::new();

        while let Some(chunk) = self.child.get_chunk(ctx)? {
            if chunk.is_empty() {
                continue;
            }
            let keys = self.executor.execute_all(ctx, &self.groups, &chunk)?;
            let arguments = self
                .aggregates
                .iter()
                .map(|aggregate| {
                    aggregate
                        .children
                        .first()
                        .map(|child| self.executor.execute(ctx, child, &chunk))
                        .transpose()
                })
                .collect::<StrataResult<Vec<_>>>()?;

            for row in 0..chunk.size() {
                let key: Vec<Value> = keys.columns().iter().map(|c| c.value(row)).collect();
                let slot = match index.get(&key) {
                    Some(&slot) => slot,
                    None => {
                        let slot = states.len();
                        index.insert(key.clone(), slot);
                        states.push(GroupState {
                            key,
                            accumulators: self.new_accumulators(),
                        });
                        slot
                    }
                };
                let state = &mut states[slot];
                for (accumulator, argument) in state.accumulators.iter_mut().zip(&arguments) {
                    let value = argument.as_ref().map_or(Value::Null, |v| v.value(row));
                    accumulator.update(&value)?;
                }
            }
        }

        if states.is_empty() && self.groups.is_empty() {
            states.push(GroupState {
                key: Vec::new(),
                accumulators: self.new_accumulators(),
            });
        }
        Ok(states)
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if self.results.is_none() {
            let states = self.aggregate(ctx)?;
            let rows: Vec<Vec<Value>> = states
                .into_iter()
                .map(|state| {
                    let mut row = state.key;
                    row.extend(state.accumulators.iter().map(Accumulator::result));
                    row
                })
                .collect();
            let chunks = rows_to_chunks(&self.types, &rows, ctx.vector_size())?;
            self.results = Some(chunks.into());
        }
        Ok(self.results.as_mut().and_then(VecDeque::pop_front))
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        let aggregates = join_display(&self.aggregates);
        if self.groups.is_empty() {
            aggregates
        } else {
            format!("groups: {}; {aggregates}", join_display(&self.groups))
        }
    }
}
