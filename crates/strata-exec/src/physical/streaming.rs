//! Operators that transform one input chunk at a time.

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::{join_display, PhysicalOperator};
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::BoundExpression;
use crate::types::LogicalType;

/// Keeps the rows for which the predicate is true.
#[derive(Debug)]
pub struct PhysicalFilter {
    child: Box<PhysicalOperator>,
    predicate: BoundExpression,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
}

impl PhysicalFilter {
    /// Creates a filter over `child`.
    pub fn new(child: PhysicalOperator, predicate: BoundExpression) -> Self {
        let types = child.types().to_vec();
        Self {
            child: Box::new(child),
            predicate,
            types,
            executor: ExpressionExecutor::new(),
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        while let Some(chunk) = self.child.get_chunk(ctx)? {
            if chunk.is_empty() {
                continue;
            }
            let selection = self.executor.select(ctx, &self.predicate, &chunk)?;
            if selection.is_empty() {
                continue;
            }
            if selection.len() == chunk.size() {
                return Ok(Some(chunk));
            }
            return chunk.slice(&selection).map(Some);
        }
        Ok(None)
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        self.predicate.to_string()
    }
}

/// Evaluates one expression per output column.
#[derive(Debug)]
pub struct PhysicalProjection {
    child: Box<PhysicalOperator>,
    expressions: Vec<BoundExpression>,
    types: Vec<LogicalType>,
    executor: ExpressionExecutor,
}

impl PhysicalProjection {
    /// Creates a projection over `child`.
    pub fn new(child: PhysicalOperator, expressions: Vec<BoundExpression>) -> Self {
        let types = expressions
            .iter()
            .map(|e| e.return_type().clone())
            .collect();
        Self {
            child: Box::new(child),
            expressions,
            types,
            executor: ExpressionExecutor::new(),
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        match self.child.get_chunk(ctx)? {
            Some(chunk) => self
                .executor
                .execute_all(ctx, &self.expressions, &chunk)
                .map(Some),
            None => Ok(None),
        }
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        join_display(&self.expressions)
    }
}

/// Skips `offset` rows, then passes through at most `limit` rows.
#[derive(Debug)]
pub struct PhysicalLimit {
    child: Box<PhysicalOperator>,
    limit: Option<usize>,
    offset: usize,
    types: Vec<LogicalType>,
    skipped: usize,
    emitted: usize,
}

impl PhysicalLimit {
    /// Creates a limit over `child`.
    pub fn new(child: PhysicalOperator, limit: Option<usize>, offset: usize) -> Self {
        let types = child.types().to_vec();
        Self {
            child: Box::new(child),
            limit,
            offset,
            types,
            skipped: 0,
            emitted: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(self.emitted))
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        while self.remaining() > 0 {
            let Some(chunk) = self.child.get_chunk(ctx)? else {
                return Ok(None);
            };
            let skip = (self.offset - self.skipped).min(chunk.size());
            self.skipped += skip;
            let take = (chunk.size() - skip).min(self.remaining());
            if take == 0 {
                continue;
            }
            self.emitted += take;
            return chunk.slice_range(skip, take).map(Some);
        }
        Ok(None)
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        match self.limit {
            Some(limit) => format!("limit {limit} offset {}", self.offset),
            None => format!("offset {}", self.offset),
        }
    }
}
