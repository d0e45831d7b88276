//! In-memory catalog.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use strata_common::{StrataError, StrataResult, DEFAULT_SCHEMA, MAX_IDENTIFIER_LENGTH};

use super::{Catalog, DataTable, TableDescription, TableScanState};
use crate::chunk::DataChunk;
use crate::logical::{
    CreateIndexInfo, CreateSchemaInfo, CreateSequenceInfo, CreateTableInfo, CreateViewInfo,
    LogicalOperator,
};
use crate::vector::VectorBuilder;

/// A table stored as the list of chunks appended to it.
#[derive(Debug)]
pub struct MemoryTable {
    description: TableDescription,
    chunks: RwLock<Vec<DataChunk>>,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new(description: TableDescription) -> Self {
        Self {
            description,
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn conform(&self, chunk: &DataChunk) -> StrataResult<DataChunk> {
        let types = self.description.types();
        if chunk.types() == types {
            return Ok(chunk.clone());
        }
        let columns = chunk
            .columns()
            .iter()
            .zip(&types)
            .map(|(vector, ty)| {
                if vector.logical_type() == ty {
                    return Ok(vector.clone());
                }
                let mut builder = VectorBuilder::with_capacity(ty, vector.len());
                for row in 0..vector.len() {
                    builder.push_from(vector, row)?;
                }
                Ok(builder.finish())
            })
            .collect::<StrataResult<Vec<_>>>()?;
        DataChunk::with_count(columns, chunk.size())
    }
}

impl DataTable for MemoryTable {
    fn description(&self) -> &TableDescription {
        &self.description
    }

    fn row_count(&self) -> usize {
        self.chunks.read().iter().map(DataChunk::size).sum()
    }

    fn scan_chunk(
        &self,
        state: &mut TableScanState,
        column_ids: &[usize],
        max_rows: usize,
    ) -> StrataResult<Option<DataChunk>> {
        let chunks = self.chunks.read();
        while let Some(chunk) = chunks.get(state.chunk_index) {
            if state.offset >= chunk.size() {
                state.chunk_index += 1;
                state.offset = 0;
                continue;
            }
            let count = max_rows.min(chunk.size() - state.offset);
            let slice = chunk.slice_range(state.offset, count)?.project(column_ids)?;
            state.offset += count;
            return Ok(Some(slice));
        }
        Ok(None)
    }

    fn append(&self, chunk: &DataChunk) -> StrataResult<usize> {
        self.description.validate_chunk(chunk)?;
        chunk.verify()?;
        if chunk.is_empty() {
            return Ok(0);
        }
        let conformed = self.conform(chunk)?;
        self.chunks.write().push(conformed);
        Ok(chunk.size())
    }
}

#[derive(Debug, Clone)]
struct SequenceEntry {
    next: i64,
    increment: i64,
}

#[derive(Debug, Default)]
struct SchemaEntry {
    tables: HashMap<String, Arc<MemoryTable>>,
    views: HashMap<String, CreateViewInfo>,
    sequences: HashMap<String, SequenceEntry>,
    indexes: HashMap<String, CreateIndexInfo>,
}

impl SchemaEntry {
    fn relation_exists(&self, key: &str) -> Option<&'static str> {
        if self.tables.contains_key(key) {
            Some("table")
        } else if self.views.contains_key(key) {
            Some("view")
        } else {
            None
        }
    }
}

/// Catalog holding everything in memory.
///
/// Names are case-insensitive. The default schema always exists.
#[derive(Debug)]
pub struct MemoryCatalog {
    schemas: RwLock<HashMap<String, SchemaEntry>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Creates a catalog with only the default schema.
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(DEFAULT_SCHEMA.to_string(), SchemaEntry::default());
        Self {
            schemas: RwLock::new(schemas),
        }
    }

    /// Returns the names of all schemas.
    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the names of the tables in `schema`.
    pub fn table_names(&self, schema: &str) -> StrataResult<Vec<String>> {
        let schemas = self.schemas.read();
        let entry = schemas
            .get(&key(schema))
            .ok_or_else(|| not_found("schema", schema))?;
        let mut names: Vec<String> = entry.tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn with_schema<T>(
        &self,
        schema: &str,
        f: impl FnOnce(&mut SchemaEntry) -> StrataResult<T>,
    ) -> StrataResult<T> {
        let mut schemas = self.schemas.write();
        let entry = schemas
            .get_mut(&key(schema))
            .ok_or_else(|| not_found("schema", schema))?;
        f(entry)
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

fn not_found(kind: &'static str, name: &str) -> StrataError {
    StrataError::CatalogEntryNotFound {
        kind,
        name: name.to_string(),
    }
}

fn exists(kind: &'static str, name: &str) -> StrataError {
    StrataError::CatalogEntryExists {
        kind,
        name: name.to_string(),
    }
}

fn check_identifier(name: &str) -> StrataResult<()> {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StrataError::invalid_argument(format!(
            "identifier must be 1 to {MAX_IDENTIFIER_LENGTH} bytes: '{name}'"
        )));
    }
    Ok(())
}

impl Catalog for MemoryCatalog {
    fn create_schema(&self, info: &CreateSchemaInfo) -> StrataResult<()> {
        check_identifier(&info.name)?;
        let mut schemas = self.schemas.write();
        if schemas.contains_key(&key(&info.name)) {
            return if info.if_not_exists {
                Ok(())
            } else {
                Err(exists("schema", &info.name))
            };
        }
        schemas.insert(key(&info.name), SchemaEntry::default());
        Ok(())
    }

    fn create_sequence(&self, info: &CreateSequenceInfo) -> StrataResult<()> {
        check_identifier(&info.name)?;
        if info.increment == 0 {
            return Err(StrataError::invalid_argument("INCREMENT must not be zero"));
        }
        self.with_schema(&info.schema, |entry| {
            if entry.sequences.contains_key(&key(&info.name)) {
                return if info.if_not_exists {
                    Ok(())
                } else {
                    Err(exists("sequence", &info.name))
                };
            }
            entry.sequences.insert(
                key(&info.name),
                SequenceEntry {
                    next: info.start,
                    increment: info.increment,
                },
            );
            Ok(())
        })
    }

    fn create_view(&self, info: &CreateViewInfo) -> StrataResult<()> {
        check_identifier(&info.name)?;
        self.with_schema(&info.schema, |entry| {
            if let Some(kind) = entry.relation_exists(&key(&info.name)) {
                return Err(exists(kind, &info.name));
            }
            entry.views.insert(key(&info.name), info.clone());
            Ok(())
        })
    }

    fn create_table(&self, info: &CreateTableInfo) -> StrataResult<()> {
        check_identifier(&info.name)?;
        if info.columns.is_empty() {
            return Err(StrataError::invalid_argument(format!(
                "table {} must have at least one column",
                info.name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for column in &info.columns {
            check_identifier(&column.name)?;
            if !seen.insert(key(&column.name)) {
                return Err(exists("column", &column.name));
            }
        }

        self.with_schema(&info.schema, |entry| {
            if let Some(kind) = entry.relation_exists(&key(&info.name)) {
                return if info.if_not_exists && kind == "table" {
                    Ok(())
                } else {
                    Err(exists(kind, &info.name))
                };
            }
            let description =
                TableDescription::new(info.schema.clone(), info.name.clone(), info.columns.clone());
            entry
                .tables
                .insert(key(&info.name), Arc::new(MemoryTable::new(description)));
            Ok(())
        })
    }

    fn create_index(&self, info: &CreateIndexInfo) -> StrataResult<()> {
        check_identifier(&info.name)?;
        self.with_schema(&info.schema, |entry| {
            let table = entry
                .tables
                .get(&key(&info.table))
                .ok_or_else(|| not_found("table", &info.table))?;
            for column in &info.columns {
                let known = table
                    .description()
                    .columns
                    .iter()
                    .any(|c| key(&c.name) == key(column));
                if !known {
                    return Err(StrataError::ColumnNotFound {
                        column: column.clone(),
                    });
                }
            }
            if entry.indexes.contains_key(&key(&info.name)) {
                return Err(exists("index", &info.name));
            }
            entry.indexes.insert(key(&info.name), info.clone());
            Ok(())
        })
    }

    fn get_table(&self, schema: &str, name: &str) -> StrataResult<Arc<dyn DataTable>> {
        let schemas = self.schemas.read();
        let entry = schemas
            .get(&key(schema))
            .ok_or_else(|| not_found("schema", schema))?;
        let table = entry
            .tables
            .get(&key(name))
            .ok_or_else(|| not_found("table", name))?;
        Ok(Arc::clone(table) as Arc<dyn DataTable>)
    }

    fn get_view(&self, schema: &str, name: &str) -> StrataResult<Arc<LogicalOperator>> {
        let schemas = self.schemas.read();
        let entry = schemas
            .get(&key(schema))
            .ok_or_else(|| not_found("schema", schema))?;
        entry
            .views
            .get(&key(name))
            .map(|view| Arc::clone(&view.query))
            .ok_or_else(|| not_found("view", name))
    }

    fn next_sequence_value(&self, schema: &str, name: &str) -> StrataResult<i64> {
        self.with_schema(schema, |entry| {
            let sequence = entry
                .sequences
                .get_mut(&key(name))
                .ok_or_else(|| not_found("sequence", name))?;
            let value = sequence.next;
            sequence.next = value.checked_add(sequence.increment).ok_or_else(|| {
                StrataError::conversion(format!("sequence {name} reached its maximum value"))
            })?;
            Ok(value)
        })
    }
}
