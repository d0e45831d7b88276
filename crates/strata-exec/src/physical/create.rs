//! DDL and insert operators.

use strata_common::StrataResult;
use tracing::info;

use super::context::ExecutionContext;
use super::operator::PhysicalOperator;
use crate::catalog::Catalog;
use crate::chunk::DataChunk;
use crate::logical::{
    CreateIndexInfo, CreateSchemaInfo, CreateSequenceInfo, CreateTableInfo, CreateViewInfo,
};
use crate::types::{LogicalType, Value};

/// A catalog entry a [`PhysicalCreate`] operator can create.
pub trait CreateEntry: std::fmt::Debug + Send {
    /// Entry kind for logging.
    const KIND: &'static str;

    /// Entry name.
    fn entry_name(&self) -> &str;

    /// Creates the entry in `catalog`.
    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()>;
}

impl CreateEntry for CreateSchemaInfo {
    const KIND: &'static str = "schema";

    fn entry_name(&self) -> &str {
        &self.name
    }

    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()> {
        catalog.create_schema(self)
    }
}

impl CreateEntry for CreateSequenceInfo {
    const KIND: &'static str = "sequence";

    fn entry_name(&self) -> &str {
        &self.name
    }

    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()> {
        catalog.create_sequence(self)
    }
}

impl CreateEntry for CreateViewInfo {
    const KIND: &'static str = "view";

    fn entry_name(&self) -> &str {
        &self.name
    }

    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()> {
        catalog.create_view(self)
    }
}

impl CreateEntry for CreateTableInfo {
    const KIND: &'static str = "table";

    fn entry_name(&self) -> &str {
        &self.name
    }

    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()> {
        catalog.create_table(self)
    }
}

impl CreateEntry for CreateIndexInfo {
    const KIND: &'static str = "index";

    fn entry_name(&self) -> &str {
        &self.name
    }

    fn create_in(&self, catalog: &dyn Catalog) -> StrataResult<()> {
        catalog.create_index(self)
    }
}

/// Creates one catalog entry on its first pull and produces no rows.
#[derive(Debug)]
pub struct PhysicalCreate<I: CreateEntry> {
    info: I,
    finished: bool,
}

impl<I: CreateEntry> PhysicalCreate<I> {
    /// Creates the operator.
    pub fn new(info: I) -> Self {
        Self {
            info,
            finished: false,
        }
    }

    /// Returns the entry description.
    pub fn info(&self) -> &I {
        &self.info
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if !self.finished {
            self.finished = true;
            self.info.create_in(ctx.catalog().as_ref())?;
            info!(kind = I::KIND, name = self.info.entry_name(), "created catalog entry");
        }
        Ok(None)
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &[]
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        Vec::new()
    }

    pub(super) fn details(&self) -> String {
        self.info.entry_name().to_string()
    }
}

/// Appends every input chunk to a table, then produces one row holding
/// the number of inserted rows.
#[derive(Debug)]
pub struct PhysicalInsert {
    child: Box<PhysicalOperator>,
    schema_name: String,
    table_name: String,
    types: Vec<LogicalType>,
    finished: bool,
}

impl PhysicalInsert {
    /// Creates an insert of `child` into `schema_name.table_name`.
    pub fn new(
        child: PhysicalOperator,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            child: Box::new(child),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            types: vec![LogicalType::BigInt],
            finished: false,
        }
    }

    pub(super) fn get_data(&mut self, ctx: &ExecutionContext) -> StrataResult<Option<DataChunk>> {
        if self.finished {
            return Ok(None);
        }
        self.finished = true;

        let table = ctx.catalog().get_table(&self.schema_name, &self.table_name)?;
        let mut inserted: usize = 0;
        while let Some(chunk) = self.child.get_chunk(ctx)? {
            inserted += table.append(&chunk)?;
        }
        info!(
            table = %table.description(),
            rows = inserted,
            "inserted rows"
        );

        let count = i64::try_from(inserted).unwrap_or(i64::MAX);
        DataChunk::from_rows(&self.types, &[vec![Value::BigInt(count)]]).map(Some)
    }

    pub(super) fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub(super) fn children(&self) -> Vec<&PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    pub(super) fn details(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BoundExpression;
    use crate::logical::ColumnDefinition;
    use crate::physical::PhysicalColumnDataScan;
    use strata_common::StrataError;

    #[test]
    fn test_create_runs_once() {
        let ctx = ExecutionContext::for_testing();
        let mut op = PhysicalOperator::CreateSchema(PhysicalCreate::new(CreateSchemaInfo::new("s")));
        assert!(op.get_chunk(&ctx).unwrap().is_none());
        assert!(op.get_chunk(&ctx).unwrap().is_none());

        let mut again =
            PhysicalOperator::CreateSchema(PhysicalCreate::new(CreateSchemaInfo::new("s")));
        assert!(matches!(
            again.get_chunk(&ctx),
            Err(StrataError::CatalogEntryExists { .. })
        ));
    }

    #[test]
    fn test_insert_reports_count() {
        let ctx = ExecutionContext::for_testing();
        let mut create = PhysicalOperator::CreateTable(PhysicalCreate::new(CreateTableInfo::new(
            "t",
            vec![ColumnDefinition::new("a", LogicalType::BigInt)],
        )));
        create.get_chunk(&ctx).unwrap();

        let rows = (0..6)
            .map(|i| vec![BoundExpression::typed_constant(Value::BigInt(i), LogicalType::BigInt)])
            .collect();
        let scan = PhysicalOperator::ColumnDataScan(PhysicalColumnDataScan::new(
            rows,
            vec![LogicalType::BigInt],
        ));
        let mut insert = PhysicalOperator::Insert(PhysicalInsert::new(scan, "main", "t"));
        let chunk = insert.get_chunk(&ctx).unwrap().unwrap();
        assert_eq!(chunk.row(0), Some(vec![Value::BigInt(6)]));
        assert!(insert.get_chunk(&ctx).unwrap().is_none());
        assert_eq!(ctx.catalog().get_table("main", "t").unwrap().row_count(), 6);
    }
}
