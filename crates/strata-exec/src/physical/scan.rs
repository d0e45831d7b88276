//! Leaf operators: table scans, literal rows and the dummy scan.

use std::collections::VecDeque;
use std::sync::Arc;

use strata_common::StrataResult;

use super::context::ExecutionContext;
use super::operator::PhysicalOperator;
use super::rows_to_chunks;
use crate::catalog::{DataTable, TableScanState};
use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::BoundExpression;
use crate::types::LogicalType;

/// Sequential scan of a catalog table.
///
/// The table is resolved on the first pull, so a plan can be compiled
/// before the table it reads is created.
#[derive(Debug)]
pub struct PhysicalTableScan {
    schema_name: String,
    table_name: String,
    column_ids: Vec<usize>,
    types: Vec<LogicalType>,
    table: Option<Arc<dyn DataTable>>,
    state: TableScanState,
}

impl PhysicalTableScan {
    /// Creates a scan producing `column_ids` of the table.
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        column_ids: Vec<usize>,
        types: Vec<LogicalType>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            column_ids,
            types,
            table: None,
            state: TableScanState::default(),
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        let table = match &self.table {
            Some(table) => Arc::clone(table),
            None => {
                let table = ctx
                    .catalog()
                    .get_table(&self.schema_name, &self.table_name)?;
                self.table = Some(Arc::clone(&table));
                table
            }
        };
        table.scan_chunk(&mut self.state, &self.column_ids, ctx.vector_size())
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        Vec::new()
    }

    pub(super) fn details(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

/// Scan over literal rows.
///
/// The rows are evaluated and materialized on the first pull, then
/// returned in chunks of at most the vector size.
#[derive(Debug)]
pub struct PhysicalColumnDataScan {
    rows: Vec<Vec<BoundExpression>>,
    types: Vec<LogicalType>,
    chunks: Option<VecDeque<DataChunk>>,
}

impl PhysicalColumnDataScan {
    /// Creates a scan over constant rows.
    pub fn new(rows: Vec<Vec<BoundExpression>>, types: Vec<LogicalType>) -> Self {
        Self {
            rows,
            types,
            chunks: None,
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if self.chunks.is_none() {
            let values = self
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(ExpressionExecutor::evaluate_constant)
                        .collect::<StrataResult<Vec<_>>>()
                })
                .collect::<StrataResult<Vec<_>>>()?;
            let chunks = rows_to_chunks(&self.types, &values, ctx.vector_size())?;
            self.chunks = Some(chunks.into());
        }
        Ok(self.chunks.as_mut().and_then(VecDeque::pop_front))
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        Vec::new()
    }

    pub(super) fn details(&self) -> String {
        format!("{} rows", self.rows.len())
    }
}

/// Produces one row without columns, or nothing.
#[derive(Debug)]
pub struct PhysicalDummyScan {
    produce_one_row: bool,
    finished: bool,
}

impl PhysicalDummyScan {
    /// Creates a scan; `produce_one_row` selects between one row and none.
    pub fn new(produce_one_row: bool) -> Self {
        Self {
            produce_one_row,
            finished: false,
        }
    }

    /// Returns true if the scan produces its single row.
    pub fn produces_row(&self) -> bool {
        self.produce_one_row
    }

    pub(super) fn get_data(&mut self, _ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if self.finished || !self.produce_one_row {
            return Ok(None);
        }
        self.finished = true;
        DataChunk::with_count(Vec::new(), 1).map(Some)
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &[]
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        Vec::new()
    }

    pub(super) fn details(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::logical::{ColumnDefinition, CreateTableInfo};
    use crate::types::Value;

    #[test]
    fn test_dummy_scan() {
        let ctx = ExecutionContext::for_testing();
        let mut scan = PhysicalDummyScan::new(true);
        let chunk = scan.get_data(&ctx).unwrap().unwrap();
        assert_eq!(chunk.size(), 1);
        assert_eq!(chunk.column_count(), 0);
        assert!(scan.get_data(&ctx).unwrap().is_none());

        let mut empty = PhysicalDummyScan::new(false);
        assert!(empty.get_data(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_column_data_scan_chunks_by_vector_size() {
        let ctx = ExecutionContext::for_testing();
        let rows = (0..10)
            .map(|i| vec![BoundExpression::constant(Value::Integer(i))])
            .collect();
        let mut scan = PhysicalColumnDataScan::new(rows, vec![LogicalType::Integer]);

        let mut sizes = Vec::new();
        while let Some(chunk) = scan.get_data(&ctx).unwrap() {
            sizes.push(chunk.size());
        }
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_table_scan_resolves_lazily() {
        let ctx = ExecutionContext::for_testing();
        let mut scan = PhysicalTableScan::new("main", "t", vec![0], vec![LogicalType::Integer]);

        ctx.catalog()
            .create_table(&CreateTableInfo::new(
                "t",
                vec![ColumnDefinition::new("a", LogicalType::Integer)],
            ))
            .unwrap();
        let table = ctx.catalog().get_table("main", "t").unwrap();
        let chunk = DataChunk::from_rows(
            &[LogicalType::Integer],
            &[vec![Value::Integer(1)], vec![Value::Integer(2)]],
        )
        .unwrap();
        table.append(&chunk).unwrap();

        let chunk = scan.get_data(&ctx).unwrap().unwrap();
        assert_eq!(chunk.column(0).unwrap().values(), vec![Value::Integer(1), Value::Integer(2)]);
        assert!(scan.get_data(&ctx).unwrap().is_none());
    }
}
