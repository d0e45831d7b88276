//! Columnar vectors.
//!
//! A `Vector` is a typed column of up to `STANDARD_VECTOR_SIZE` rows. Its
//! data lives in a reference-counted `VectorBuffer` that is frozen once
//! built: every alias of a vector (references, slices, extracted struct
//! fields) shares the buffer and nothing can write through it. New data is
//! only produced by a `VectorBuilder`, which owns its storage until
//! `finish`.
//!
//! Nested types store their children inside the buffer:
//!
//! - STRUCT: ordered `(name, Vector)` children sharing the parent's rows.
//! - LIST: one element child holding every list's elements back to back,
//!   plus a `ListEntry { offset, length }` per row.

mod builder;
mod selection;
mod validity;

pub use builder::VectorBuilder;
pub use selection::SelectionVector;
pub use validity::ValidityMask;

use std::sync::Arc;

use strata_common::{StrataError, StrataResult, LIST_CHILD_NAME, STANDARD_VECTOR_SIZE};

use crate::types::{LogicalType, Value};

/// Location of one list row inside the element child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListEntry {
    /// Index of the first element in the child vector.
    pub offset: usize,
    /// Number of elements.
    pub length: usize,
}

#[derive(Debug)]
pub(crate) enum VectorData {
    Null,
    Boolean(Vec<bool>),
    Integer(Vec<i32>),
    BigInt(Vec<i64>),
    Double(Vec<f64>),
    Varchar(Vec<String>),
    List {
        entries: Vec<ListEntry>,
        child: Vector,
    },
    Struct(Vec<(String, Vector)>),
}

/// Immutable storage shared by every alias of a vector.
#[derive(Debug)]
pub struct VectorBuffer {
    data: VectorData,
    validity: ValidityMask,
    len: usize,
}

impl VectorBuffer {
    pub(crate) fn new(data: VectorData, validity: ValidityMask, len: usize) -> Self {
        Self {
            data,
            validity,
            len,
        }
    }

    /// Returns the number of physical rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the validity mask.
    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    /// Returns the number of child vectors (struct fields, or 1 for a list).
    pub fn child_count(&self) -> usize {
        match &self.data {
            VectorData::List { .. } => 1,
            VectorData::Struct(children) => children.len(),
            _ => 0,
        }
    }

    /// Returns child `index` in physical row space.
    pub fn child(&self, index: usize) -> Option<&Vector> {
        match &self.data {
            VectorData::List { child, .. } if index == 0 => Some(child),
            VectorData::Struct(children) => children.get(index).map(|(_, v)| v),
            _ => None,
        }
    }

    fn value(&self, row: usize) -> Value {
        if row >= self.len || !self.validity.is_valid(row) {
            return Value::Null;
        }
        match &self.data {
            VectorData::Null => Value::Null,
            VectorData::Boolean(v) => Value::Boolean(v[row]),
            VectorData::Integer(v) => Value::Integer(v[row]),
            VectorData::BigInt(v) => Value::BigInt(v[row]),
            VectorData::Double(v) => Value::Double(v[row]),
            VectorData::Varchar(v) => Value::Varchar(v[row].clone()),
            VectorData::List { entries, child } => {
                let entry = entries[row];
                Value::List(
                    (entry.offset..entry.offset + entry.length)
                        .map(|i| child.value(i))
                        .collect(),
                )
            }
            VectorData::Struct(children) => Value::Struct(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.value(row)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone)]
enum RowMapping {
    Flat,
    Constant,
    Selection(Arc<SelectionVector>),
}

/// A typed column of rows backed by a shared, immutable buffer.
///
/// Cloning a vector is a reference: it shares the buffer and costs one
/// atomic increment.
#[derive(Debug, Clone)]
pub struct Vector {
    logical_type: LogicalType,
    buffer: Arc<VectorBuffer>,
    mapping: RowMapping,
    count: usize,
}

impl Vector {
    pub(crate) fn from_buffer(logical_type: LogicalType, buffer: VectorBuffer) -> Self {
        let count = buffer.len();
        Self {
            logical_type,
            buffer: Arc::new(buffer),
            mapping: RowMapping::Flat,
            count,
        }
    }

    /// Creates an empty vector of the given type.
    pub fn empty(logical_type: &LogicalType) -> Self {
        VectorBuilder::new(logical_type).finish()
    }

    /// Builds a flat vector from values.
    pub fn from_values(logical_type: &LogicalType, values: &[Value]) -> StrataResult<Self> {
        let mut builder = VectorBuilder::with_capacity(logical_type, values.len());
        for value in values {
            builder.push(value)?;
        }
        Ok(builder.finish())
    }

    /// Creates a vector that reads `value` for each of its `count` rows.
    ///
    /// Only one physical row is stored. `count` is bounded by
    /// `STANDARD_VECTOR_SIZE`.
    pub fn constant(value: &Value, logical_type: &LogicalType, count: usize) -> StrataResult<Self> {
        let mut builder = VectorBuilder::with_capacity(logical_type, 1);
        builder.push(value)?;
        let mut vector = builder.finish();
        vector.mapping = RowMapping::Constant;
        vector.set_count(count)?;
        Ok(vector)
    }

    /// Creates a STRUCT vector from child vectors without copying them.
    ///
    /// Every child must have `count` rows. All struct rows are valid.
    pub fn struct_from_children(children: Vec<(String, Vector)>, count: usize) -> StrataResult<Self> {
        if let Some((name, child)) = children.iter().find(|(_, c)| c.len() != count) {
            return Err(StrataError::internal(format!(
                "struct child '{name}' has {} rows, expected {count}",
                child.len()
            )));
        }
        let logical_type = LogicalType::Struct(
            children
                .iter()
                .map(|(n, c)| (n.clone(), c.logical_type().clone()))
                .collect(),
        );
        let buffer = VectorBuffer::new(VectorData::Struct(children), ValidityMask::all_valid(), count);
        Ok(Self::from_buffer(logical_type, buffer))
    }

    /// Returns a new alias of `other`.
    pub fn referencing(other: &Vector) -> Self {
        other.clone()
    }

    /// Makes this vector an alias of `other`: same buffer, validity, type
    /// and row count. Referencing the same source twice is a no-op.
    pub fn reference(&mut self, other: &Vector) {
        *self = other.clone();
    }

    /// Returns true if both vectors share the same buffer.
    pub fn shares_buffer(&self, other: &Vector) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Returns the shared buffer.
    pub fn buffer(&self) -> &Arc<VectorBuffer> {
        &self.buffer
    }

    /// Returns the logical type.
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the vector has no rows.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if every row reads the same physical row.
    pub fn is_constant(&self) -> bool {
        matches!(self.mapping, RowMapping::Constant)
    }

    /// Sets the row count. Flat and selected vectors can only shrink;
    /// constant vectors accept up to `STANDARD_VECTOR_SIZE` rows.
    pub fn set_count(&mut self, count: usize) -> StrataResult<()> {
        let available = match &self.mapping {
            RowMapping::Constant => STANDARD_VECTOR_SIZE,
            RowMapping::Flat => self.buffer.len(),
            RowMapping::Selection(sel) => sel.len(),
        };
        if count > available {
            return Err(StrataError::CapacityExceeded {
                count,
                capacity: available,
            });
        }
        self.count = count;
        Ok(())
    }

    /// Maps a logical row to its physical row in the buffer.
    pub fn physical_index(&self, row: usize) -> usize {
        match &self.mapping {
            RowMapping::Flat => row,
            RowMapping::Constant => 0,
            RowMapping::Selection(sel) => sel.get(row),
        }
    }

    /// Returns true if `row` is in range and not NULL.
    pub fn is_valid(&self, row: usize) -> bool {
        row < self.count && self.buffer.validity.is_valid(self.physical_index(row))
    }

    /// Returns the value at `row`, or NULL past the end.
    pub fn value(&self, row: usize) -> Value {
        if row >= self.count {
            return Value::Null;
        }
        self.buffer.value(self.physical_index(row))
    }

    /// Returns all values.
    pub fn values(&self) -> Vec<Value> {
        (0..self.count).map(|row| self.value(row)).collect()
    }

    /// Returns a zero-copy view of the selected rows.
    pub fn slice(&self, selection: &SelectionVector) -> StrataResult<Vector> {
        if let Some(max) = selection.max_index() {
            if max >= self.count {
                return Err(StrataError::NotEnoughElements {
                    requested: max,
                    available: self.count,
                });
            }
        }
        let mapping = match &self.mapping {
            RowMapping::Constant => RowMapping::Constant,
            RowMapping::Flat => RowMapping::Selection(Arc::new(selection.clone())),
            RowMapping::Selection(sel) => RowMapping::Selection(Arc::new(sel.compose(selection))),
        };
        Ok(Vector {
            logical_type: self.logical_type.clone(),
            buffer: Arc::clone(&self.buffer),
            mapping,
            count: selection.len(),
        })
    }

    /// Returns a zero-copy view of `length` rows starting at `offset`.
    pub fn slice_range(&self, offset: usize, length: usize) -> StrataResult<Vector> {
        if offset == 0 && length == self.count {
            return Ok(self.clone());
        }
        self.slice(&SelectionVector::range(offset, length))
    }

    /// Returns the children of a nested vector.
    ///
    /// STRUCT children are aligned to this vector's rows (a slice of the
    /// parent slices its fields). A LIST returns its single element child,
    /// whose rows are elements rather than list rows. Scalar vectors have
    /// no children.
    pub fn get_children(&self) -> StrataResult<Vec<(String, Vector)>> {
        match &self.buffer.data {
            VectorData::Struct(children) => children
                .iter()
                .map(|(name, child)| Ok((name.clone(), self.align_child(child)?)))
                .collect(),
            VectorData::List { child, .. } => Ok(vec![(LIST_CHILD_NAME.to_string(), child.clone())]),
            _ => Err(StrataError::type_mismatch("STRUCT or LIST", &self.logical_type)),
        }
    }

    fn align_child(&self, child: &Vector) -> StrataResult<Vector> {
        match &self.mapping {
            RowMapping::Flat if self.count == child.len() => Ok(child.clone()),
            RowMapping::Flat => child.slice_range(0, self.count),
            _ => {
                let selection: SelectionVector =
                    (0..self.count).map(|row| self.physical_index(row)).collect();
                child.slice(&selection)
            }
        }
    }

    /// Returns the list entry of `row`, or `None` if the row is NULL.
    pub fn list_entry(&self, row: usize) -> Option<ListEntry> {
        if !self.is_valid(row) {
            return None;
        }
        match &self.buffer.data {
            VectorData::List { entries, .. } => entries.get(self.physical_index(row)).copied(),
            _ => None,
        }
    }

    /// Returns the element child of a LIST vector.
    pub fn list_child(&self) -> StrataResult<&Vector> {
        match &self.buffer.data {
            VectorData::List { child, .. } => Ok(child),
            _ => Err(StrataError::type_mismatch("LIST", &self.logical_type)),
        }
    }

    /// Copies the visible rows into a new flat vector.
    pub fn flatten(&self) -> StrataResult<Vector> {
        let mut builder = VectorBuilder::with_capacity(&self.logical_type, self.count);
        for row in 0..self.count {
            builder.push(&self.value(row))?;
        }
        Ok(builder.finish())
    }

    /// Checks structural invariants: mapped rows exist in the buffer, the
    /// data matches the logical type and nested children are consistent.
    pub fn verify(&self) -> StrataResult<()> {
        let physical_rows = match &self.mapping {
            RowMapping::Flat => self.count,
            RowMapping::Constant => usize::from(self.count > 0),
            RowMapping::Selection(sel) => sel.max_index().map_or(0, |m| m + 1),
        };
        if physical_rows > self.buffer.len() {
            return Err(StrataError::internal(format!(
                "vector maps {physical_rows} rows onto a buffer of {}",
                self.buffer.len()
            )));
        }

        let corrupt = || StrataError::internal(format!("buffer layout does not match {}", self.logical_type));
        match (&self.buffer.data, &self.logical_type) {
            (VectorData::Null, LogicalType::Null)
            | (VectorData::Boolean(_), LogicalType::Boolean)
            | (VectorData::Integer(_), LogicalType::Integer)
            | (VectorData::BigInt(_), LogicalType::BigInt)
            | (VectorData::Double(_), LogicalType::Double)
            | (VectorData::Varchar(_), LogicalType::Varchar) => Ok(()),
            (VectorData::List { entries, child }, LogicalType::List(child_type)) => {
                if child.logical_type() != child_type.as_ref() {
                    return Err(corrupt());
                }
                if entries.iter().any(|e| e.offset + e.length > child.len()) {
                    return Err(StrataError::internal("list entry exceeds element child"));
                }
                child.verify()
            }
            (VectorData::Struct(children), LogicalType::Struct(fields)) => {
                if children.len() != fields.len() {
                    return Err(corrupt());
                }
                for ((_, child), (_, field_type)) in children.iter().zip(fields) {
                    if child.logical_type() != field_type || child.len() != self.buffer.len() {
                        return Err(corrupt());
                    }
                    child.verify()?;
                }
                Ok(())
            }
            _ => Err(corrupt()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[Option<i32>]) -> Vector {
        let values: Vec<Value> = values.iter().map(|v| (*v).into()).collect();
        Vector::from_values(&LogicalType::Integer, &values).unwrap()
    }

    fn point_type() -> LogicalType {
        LogicalType::struct_of([
            ("x", LogicalType::Integer),
            ("tags", LogicalType::list(LogicalType::Varchar)),
        ])
    }

    fn points() -> Vector {
        let values = vec![
            Value::struct_value([
                ("x", Value::Integer(1)),
                ("tags", Value::list([Value::varchar("a"), Value::varchar("b")])),
            ]),
            Value::Null,
            Value::struct_value([("x", Value::Integer(3)), ("tags", Value::list([]))]),
        ];
        Vector::from_values(&point_type(), &values).unwrap()
    }

    #[test]
    fn test_reference_shares_buffer() {
        let source = ints(&[Some(1), None, Some(3)]);
        let mut target = Vector::empty(&LogicalType::Integer);
        target.reference(&source);

        assert!(target.shares_buffer(&source));
        assert_eq!(target.len(), 3);
        assert_eq!(target.values(), source.values());
        assert!(!target.is_valid(1));
    }

    #[test]
    fn test_reference_idempotent() {
        let source = points();
        let mut target = Vector::referencing(&source);
        let before = Arc::strong_count(source.buffer());
        target.reference(&source);
        target.reference(&source);

        assert_eq!(Arc::strong_count(source.buffer()), before);
        assert_eq!(target.values(), source.values());
        assert_eq!(target.logical_type(), source.logical_type());
    }

    #[test]
    fn test_constant_broadcast() {
        let v = Vector::constant(&Value::Integer(42), &LogicalType::Integer, 5).unwrap();
        assert!(v.is_constant());
        assert_eq!(v.len(), 5);
        assert_eq!(v.buffer().len(), 1);
        assert!(v.values().iter().all(|x| *x == Value::Integer(42)));
    }

    #[test]
    fn test_slice_composes_without_copy() {
        let v = ints(&[Some(10), Some(20), Some(30), Some(40)]);
        let first = v.slice(&SelectionVector::new(vec![3, 1, 0])).unwrap();
        let second = first.slice(&SelectionVector::new(vec![2, 0, 0])).unwrap();

        assert!(second.shares_buffer(&v));
        assert_eq!(
            second.values(),
            vec![Value::Integer(10), Value::Integer(40), Value::Integer(40)]
        );
        assert!(v.slice(&SelectionVector::new(vec![4])).is_err());
    }

    #[test]
    fn test_struct_null_row_nulls_children() {
        let v = points();
        assert_eq!(v.value(1), Value::Null);

        let children = v.get_children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].0, "x");
        assert_eq!(
            children[0].1.values(),
            vec![Value::Integer(1), Value::Null, Value::Integer(3)]
        );
        assert_eq!(children[1].1.value(1), Value::Null);
        assert_eq!(children[1].1.value(2), Value::list([]));
    }

    #[test]
    fn test_struct_children_follow_parent_slice() {
        let v = points();
        let sliced = v.slice(&SelectionVector::new(vec![2, 0])).unwrap();
        let children = sliced.get_children().unwrap();

        assert_eq!(children[0].1.values(), vec![Value::Integer(3), Value::Integer(1)]);
        assert!(children[0].1.shares_buffer(&v.get_children().unwrap()[0].1));
    }

    #[test]
    fn test_list_layout() {
        let ty = LogicalType::list(LogicalType::Integer);
        let values = vec![
            Value::list([1.into(), 2.into()]),
            Value::Null,
            Value::list([]),
            Value::list([Value::Null, 5.into()]),
        ];
        let v = Vector::from_values(&ty, &values).unwrap();

        assert_eq!(v.list_entry(0), Some(ListEntry { offset: 0, length: 2 }));
        assert_eq!(v.list_entry(1), None);
        assert_eq!(v.list_entry(2), Some(ListEntry { offset: 2, length: 0 }));
        assert_eq!(v.list_entry(3), Some(ListEntry { offset: 2, length: 2 }));

        let child = v.list_child().unwrap();
        assert_eq!(child.len(), 4);
        assert_eq!(v.values(), values);
        assert!(v.verify().is_ok());

        let children = v.get_children().unwrap();
        assert_eq!(children[0].0, "child");
        assert!(children[0].1.shares_buffer(child));
    }

    #[test]
    fn test_scalar_has_no_children() {
        let v = ints(&[Some(1)]);
        assert!(matches!(
            v.get_children(),
            Err(StrataError::TypeMismatch { .. })
        ));
        assert!(v.list_child().is_err());
    }

    #[test]
    fn test_set_count() {
        let mut v = ints(&[Some(1), Some(2), Some(3)]);
        v.set_count(2).unwrap();
        assert_eq!(v.values(), vec![Value::Integer(1), Value::Integer(2)]);
        assert!(v.set_count(4).is_err());

        let mut c = Vector::constant(&Value::Null, &LogicalType::Integer, 1).unwrap();
        c.set_count(900).unwrap();
        assert_eq!(c.len(), 900);
        c.set_count(STANDARD_VECTOR_SIZE).unwrap();
        assert!(matches!(
            c.set_count(STANDARD_VECTOR_SIZE + 1),
            Err(StrataError::CapacityExceeded { .. })
        ));
        assert_eq!(c.len(), STANDARD_VECTOR_SIZE);

        assert!(Vector::constant(&Value::Integer(1), &LogicalType::Integer, STANDARD_VECTOR_SIZE + 1).is_err());
    }

    #[test]
    fn test_flatten_copies() {
        let v = ints(&[Some(1), None, Some(3)]);
        let sliced = v.slice(&SelectionVector::new(vec![2, 1])).unwrap();
        let flat = sliced.flatten().unwrap();

        assert!(!flat.shares_buffer(&v));
        assert_eq!(flat.values(), vec![Value::Integer(3), Value::Null]);
        assert!(flat.verify().is_ok());
    }

    #[test]
    fn test_struct_from_children_zero_copy() {
        let a = ints(&[Some(1), Some(2)]);
        let b = Vector::constant(&Value::varchar("k"), &LogicalType::Varchar, 2).unwrap();
        let s = Vector::struct_from_children(vec![("a".into(), a.clone()), ("b".into(), b)], 2).unwrap();

        assert_eq!(
            s.value(1),
            Value::struct_value([("a", Value::Integer(2)), ("b", Value::varchar("k"))])
        );
        assert!(s.get_children().unwrap()[0].1.shares_buffer(&a));
        assert!(Vector::struct_from_children(vec![("a".into(), a)], 3).is_err());
    }
}
