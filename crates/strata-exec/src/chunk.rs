//! Data chunks: the batch unit passed between operators.

use std::fmt;

use strata_common::{StrataError, StrataResult, STANDARD_VECTOR_SIZE};

use crate::types::{LogicalType, Value};
use crate::vector::{SelectionVector, Vector, VectorBuilder};

/// An ordered set of equally sized vectors.
///
/// Every vector has exactly `size()` rows and `size() <= capacity()`.
/// Operators hand chunks to their parent by value; the vectors inside
/// may still share buffers with the producer.
#[derive(Debug, Clone)]
pub struct DataChunk {
    columns: Vec<Vector>,
    count: usize,
    capacity: usize,
}

impl DataChunk {
    /// Creates a chunk from vectors that all have the same row count.
    pub fn new(columns: Vec<Vector>) -> StrataResult<Self> {
        let count = columns.first().map_or(0, Vector::len);
        Self::with_count(columns, count)
    }

    /// Creates a chunk with an explicit row count. Used for chunks without
    /// columns (a single-row dummy scan still has one row).
    pub fn with_count(columns: Vec<Vector>, count: usize) -> StrataResult<Self> {
        if count > STANDARD_VECTOR_SIZE {
            return Err(StrataError::CapacityExceeded {
                count,
                capacity: STANDARD_VECTOR_SIZE,
            });
        }
        for (i, column) in columns.iter().enumerate() {
            if column.len() != count {
                return Err(StrataError::internal(format!(
                    "column {i} has {} rows, expected {count}",
                    column.len()
                )));
            }
        }
        Ok(Self {
            columns,
            count,
            capacity: STANDARD_VECTOR_SIZE,
        })
    }

    /// Creates an empty chunk with the given column types.
    pub fn empty(types: &[LogicalType]) -> Self {
        Self {
            columns: types.iter().map(Vector::empty).collect(),
            count: 0,
            capacity: STANDARD_VECTOR_SIZE,
        }
    }

    /// Creates a chunk from rows of values.
    pub fn from_rows(types: &[LogicalType], rows: &[Vec<Value>]) -> StrataResult<Self> {
        let mut builders: Vec<VectorBuilder> = types
            .iter()
            .map(|t| VectorBuilder::with_capacity(t, rows.len()))
            .collect();
        for row in rows {
            if row.len() != types.len() {
                return Err(StrataError::invalid_argument(format!(
                    "row has {} values, expected {}",
                    row.len(),
                    types.len()
                )));
            }
            for (builder, value) in builders.iter_mut().zip(row) {
                builder.push(value)?;
            }
        }
        Self::with_count(
            builders.into_iter().map(VectorBuilder::finish).collect(),
            rows.len(),
        )
    }

    /// Returns the number of rows.
    pub fn size(&self) -> usize {
        self.count
    }

    /// Returns true if the chunk has no rows.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the maximum number of rows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Vector> {
        self.columns.get(index)
    }

    /// Returns all columns.
    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    /// Consumes the chunk, returning its columns.
    pub fn into_columns(self) -> Vec<Vector> {
        self.columns
    }

    /// Returns the column types.
    pub fn types(&self) -> Vec<LogicalType> {
        self.columns.iter().map(|c| c.logical_type().clone()).collect()
    }

    /// Sets the shared row count. Every vector is cut to `count` rows; no
    /// vector may be asked to grow past its own data.
    pub fn set_cardinality(&mut self, count: usize) -> StrataResult<()> {
        if count > self.capacity {
            return Err(StrataError::CapacityExceeded {
                count,
                capacity: self.capacity,
            });
        }
        for column in &mut self.columns {
            column.set_count(count)?;
        }
        self.count = count;
        Ok(())
    }

    /// Drops all rows, keeping the column types.
    pub fn reset(&mut self) {
        for column in &mut self.columns {
            *column = Vector::empty(column.logical_type());
        }
        self.count = 0;
    }

    /// Makes this chunk an alias of `other`.
    pub fn reference(&mut self, other: &DataChunk) {
        self.columns.clone_from(&other.columns);
        self.count = other.count;
        self.capacity = other.capacity;
    }

    /// Returns the values of row `index`.
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.count {
            return None;
        }
        Some(self.columns.iter().map(|c| c.value(index)).collect())
    }

    /// Returns an iterator over all rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.count).map(move |i| self.columns.iter().map(|c| c.value(i)).collect())
    }

    /// Returns a zero-copy view of the selected rows.
    pub fn slice(&self, selection: &SelectionVector) -> StrataResult<DataChunk> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(selection))
            .collect::<StrataResult<Vec<_>>>()?;
        Self::with_count(columns, selection.len())
    }

    /// Returns a zero-copy view of `length` rows starting at `offset`.
    pub fn slice_range(&self, offset: usize, length: usize) -> StrataResult<DataChunk> {
        self.slice(&SelectionVector::range(offset, length))
    }

    /// Returns a chunk with only the given columns, sharing their buffers.
    pub fn project(&self, indices: &[usize]) -> StrataResult<DataChunk> {
        let columns = indices
            .iter()
            .map(|&i| {
                self.columns
                    .get(i)
                    .cloned()
                    .ok_or_else(|| StrataError::internal(format!("invalid column index: {i}")))
            })
            .collect::<StrataResult<Vec<_>>>()?;
        Self::with_count(columns, self.count)
    }

    /// Appends the columns of `other` to the right of this chunk.
    pub fn fuse(mut self, other: DataChunk) -> StrataResult<DataChunk> {
        if other.count != self.count {
            return Err(StrataError::internal(format!(
                "cannot fuse chunks of {} and {} rows",
                self.count, other.count
            )));
        }
        self.columns.extend(other.columns);
        Ok(self)
    }

    /// Checks that every vector has the chunk's row count and is
    /// internally consistent.
    pub fn verify(&self) -> StrataResult<()> {
        if self.count > self.capacity {
            return Err(StrataError::CapacityExceeded {
                count: self.count,
                capacity: self.capacity,
            });
        }
        for (i, column) in self.columns.iter().enumerate() {
            if column.len() != self.count {
                return Err(StrataError::internal(format!(
                    "column {i} has {} rows, chunk has {}",
                    column.len(),
                    self.count
                )));
            }
            column.verify()?;
        }
        Ok(())
    }
}

impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DataChunk ({} rows x {} cols)",
            self.count,
            self.columns.len()
        )?;

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", column.logical_type())?;
        }
        writeln!(f)?;

        let display_rows = self.count.min(10);
        for row in 0..display_rows {
            for (j, column) in self.columns.iter().enumerate() {
                if j > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{}", column.value(row))?;
            }
            writeln!(f)?;
        }

        if self.count > 10 {
            writeln!(f, "... ({} more rows)", self.count - 10)?;
        }

        Ok(())
    }
}
