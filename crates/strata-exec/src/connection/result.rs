//! Query results.

use std::fmt;

use serde::Serialize;
use strata_common::{ErrorCode, StrataError, StrataResult};
use tracing::{debug, trace};

use crate::chunk::DataChunk;
use crate::physical::{ExecutionContext, PhysicalOperator};
use crate::types::{LogicalType, Value};

/// A fully materialized query result.
///
/// A failed query still produces a result: `success` is false and the
/// error message is kept, so callers can report it without unwinding.
#[derive(Debug, Clone)]
pub struct QueryResult {
    success: bool,
    error: Option<String>,
    error_code: Option<ErrorCode>,
    names: Vec<String>,
    types: Vec<LogicalType>,
    chunks: Vec<DataChunk>,
}

impl QueryResult {
    pub(super) fn materialized(
        names: Vec<String>,
        types: Vec<LogicalType>,
        chunks: Vec<DataChunk>,
    ) -> Self {
        Self {
            success: true,
            error: None,
            error_code: None,
            names,
            types,
            chunks,
        }
    }

    pub(super) fn failed(error: &StrataError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_code: Some(error.code()),
            names: Vec::new(),
            types: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Returns true if the query succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the error message of a failed query.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the error code of a failed query.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    /// Returns the column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the column types.
    pub fn types(&self) -> &[LogicalType] {
        &self.types
    }

    /// Returns the result chunks.
    pub fn chunks(&self) -> &[DataChunk] {
        &self.chunks
    }

    /// Returns the total number of rows.
    pub fn row_count(&self) -> usize {
        self.chunks.iter().map(DataChunk::size).sum()
    }

    /// Returns every value of column `index`, across all chunks.
    pub fn column_values(&self, index: usize) -> Vec<Value> {
        self.chunks
            .iter()
            .filter_map(|chunk| chunk.column(index))
            .flat_map(|column| column.values())
            .collect()
    }

    /// Returns all rows.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.chunks.iter().flat_map(DataChunk::rows).collect()
    }

    /// Serializes the result as JSON. Lists become arrays and structs
    /// become objects with their fields in declaration order.
    pub fn to_json(&self) -> StrataResult<String> {
        #[derive(Serialize)]
        struct Column<'a> {
            name: &'a str,
            #[serde(rename = "type")]
            logical_type: String,
        }

        #[derive(Serialize)]
        struct Json<'a> {
            success: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
            columns: Vec<Column<'a>>,
            rows: Vec<Vec<Value>>,
        }

        let json = Json {
            success: self.success,
            error: self.error(),
            columns: self
                .names
                .iter()
                .zip(&self.types)
                .map(|(name, ty)| Column {
                    name,
                    logical_type: ty.to_string(),
                })
                .collect(),
            rows: self.rows(),
        };
        serde_json::to_string(&json)
            .map_err(|e| StrataError::internal(format!("failed to serialize result: {e}")))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "Error: {error}");
        }

        let rows: Vec<Vec<String>> = self
            .rows()
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let mut widths: Vec<usize> = self.names.iter().map(String::len).collect();
        for row in &rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.len());
            }
        }

        write_line(f, &self.names, &widths)?;
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(f, &separator, &widths)?;
        for row in &rows {
            write_line(f, row, &widths)?;
        }
        write!(f, "({} rows)", rows.len())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    for (i, (cell, width)) in cells.iter().zip(widths.iter().copied()).enumerate() {
        if i > 0 {
            write!(f, " | ")?;
        }
        write!(f, "{cell:width$}")?;
    }
    writeln!(f)
}

/// A result whose chunks are produced on demand.
///
/// Each `fetch` pulls one chunk through the operator tree. The connection
/// can interrupt the query between fetches.
#[derive(Debug)]
pub struct StreamQueryResult {
    root: PhysicalOperator,
    ctx: ExecutionContext,
    names: Vec<String>,
    types: Vec<LogicalType>,
    fetched_rows: usize,
    finished: bool,
}

impl StreamQueryResult {
    pub(super) fn new(root: PhysicalOperator, ctx: ExecutionContext, names: Vec<String>) -> Self {
        let types = root.types().to_vec();
        Self {
            root,
            ctx,
            names,
            types,
            fetched_rows: 0,
            finished: false,
        }
    }

    /// Returns the column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the column types.
    pub fn types(&self) -> &[LogicalType] {
        &self.types
    }

    /// Returns the next chunk, or `None` once the query is finished.
    pub fn fetch(&mut self) -> StrataResult<Option<DataChunk>> {
        if self.finished {
            return Ok(None);
        }
        match self.root.get_chunk(&self.ctx) {
            Ok(Some(chunk)) => {
                self.fetched_rows += chunk.size();
                trace!(rows = chunk.size(), "fetched chunk");
                Ok(Some(chunk))
            }
            Ok(None) => {
                self.finished = true;
                debug!(rows = self.fetched_rows, "finished streaming query");
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Fetches every remaining chunk into a materialized result.
    pub fn materialize(mut self) -> QueryResult {
        let mut chunks = Vec::new();
        loop {
            match self.fetch() {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => break,
                Err(e) => return QueryResult::failed(&e),
            }
        }
        QueryResult::materialized(self.names, self.types, chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QueryResult {
        let types = vec![
            LogicalType::Integer,
            LogicalType::struct_of([("a", LogicalType::list(LogicalType::Integer))]),
        ];
        let chunk = DataChunk::from_rows(
            &types,
            &[vec![
                Value::Integer(1),
                Value::struct_value([("a", Value::list([Value::Integer(2), Value::Null]))]),
            ]],
        )
        .unwrap();
        QueryResult::materialized(vec!["k".to_string(), "s".to_string()], types, vec![chunk])
    }

    #[test]
    fn test_json_nested_values() {
        let json: serde_json::Value = serde_json::from_str(&result().to_json().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["columns"][1]["name"], "s");
        assert_eq!(json["rows"][0][0], 1);
        assert_eq!(json["rows"][0][1]["a"], serde_json::json!([2, null]));
    }

    #[test]
    fn test_failed_result() {
        let failed = QueryResult::failed(&StrataError::bind("bad"));
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("binder error: bad"));
        assert_eq!(failed.error_code(), Some(ErrorCode::BindError));
        assert_eq!(failed.row_count(), 0);
        assert_eq!(failed.to_string(), "Error: binder error: bad");
    }

    #[test]
    fn test_display() {
        let text = result().to_string();
        assert!(text.starts_with("k | s"));
        assert!(text.ends_with("(1 rows)"));
    }
}
