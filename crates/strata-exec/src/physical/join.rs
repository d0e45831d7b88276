//! Nested loop join.

use std::collections::VecDeque;

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::PhysicalOperator;
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::BoundExpression;
use crate::logical::JoinType;
use crate::types::{LogicalType, Value};
use crate::vector::{SelectionVector, Vector};

/// Joins every left row with every right row that satisfies the
/// condition.
///
/// The right side is materialized on the first pull. Output preserves the
/// order of the left input; a LEFT join emits unmatched left rows padded
/// with NULL after the matches of their left chunk.
#[derive(Debug)]
pub struct PhysicalNestedLoopJoin {
    left: Box<PhysicalOperator>,
    right: Box<PhysicalOperator>,
    join_type: JoinType,
    condition: Option<BoundExpression>,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
    right_chunks: Option<Vec<DataChunk>>,
    pending: VecDeque<DataChunk>,
}

impl PhysicalNestedLoopJoin {
    /// Creates a join of `left` and `right`.
    pub fn new(
        left: PhysicalOperator,
        right: PhysicalOperator,
        join_type: JoinType,
        condition: Option<BoundExpression>,
    ) -> Self {
        let types = left
            .types()
            .iter()
            .chain(right.types())
            .cloned()
            .collect();
        Self {
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            condition,
            types,
            executor: ExpressionExecutor::new(),
            right_chunks: None,
            pending: VecDeque::new(),
        }
    }

    fn materialize_right(&mut self, ctx: &ExecutionContext) -> StrataResult<Vec<DataChunk>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.right.get_chunk(ctx)? {
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// Joins one left chunk against the materialized right side.
    fn probe(
        &mut self,
        ctx: &ExecutionContext,
        left: &DataChunk,
        right_chunks: &[DataChunk],
    ) -> StrataResult<()> {
        let mut matched = vec![false; left.size()];
        for row in 0..left.size() {
            for right in right_chunks {
                let repeated = left.slice(&SelectionVector::repeat(row, right.size()))?;
                let candidate = repeated.fuse(right.clone())?;
                let selection = match &self.condition {
                    Some(condition) => self.executor.select(ctx, condition, &candidate)?,
                    None => SelectionVector::range(0, candidate.size()),
                };
                if selection.is_empty() {
                    continue;
                }
                matched[row] = true;
                self.pending.push_back(candidate.slice(&selection)?);
            }
        }

        if self.join_type.preserves_left() {
            let unmatched: SelectionVector = (0..left.size()).filter(|&row| !matched[row]).collect();
            if !unmatched.is_empty() {
                let rows = left.slice(&unmatched)?;
                let padding = self.types[left.column_count()..]
                    .iter()
                    .map(|ty| Vector::constant(&Value::Null, ty, unmatched.len()))
                    .collect::<StrataResult<Vec<_>>>()?;
                let padding = DataChunk::with_count(padding, unmatched.len())?;
                self.pending.push_back(rows.fuse(padding)?);
            }
        }
        Ok(())
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        let right_chunks = match self.right_chunks.take() {
            Some(chunks) => chunks,
            None => self.materialize_right(ctx)?,
        };
        let result = self.next_output(ctx, &right_chunks);
        self.right_chunks = Some(right_chunks);
        result
    }

    fn next_output(
        &mut self,
        ctx: &ExecutionContext,
        right_chunks: &[DataChunk],
    ) -> StrataResult<Option<DataChunk>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Ok(Some(chunk));
            }
            let Some(left) = self.left.get_chunk(ctx)? else {
                return Ok(None);
            };
            self.probe(ctx, &left, right_chunks)?;
        }
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        match &self.condition {
            Some(condition) => format!("{} {condition}", self.join_type),
            None => format!("{} CROSS", self.join_type),
        }
    }
}
