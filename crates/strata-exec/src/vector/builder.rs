//! Owning writer for new vectors.

use strata_common::{StrataError, StrataResult};

use super::{ListEntry, ValidityMask, Vector, VectorBuffer, VectorData};
use crate::types::{LogicalType, Value};

#[derive(Debug)]
enum BuilderData {
    Null,
    Boolean(Vec<bool>),
    Integer(Vec<i32>),
    BigInt(Vec<i64>),
    Double(Vec<f64>),
    Varchar(Vec<String>),
    List {
        entries: Vec<ListEntry>,
        child: Box<VectorBuilder>,
    },
    Struct(Vec<(String, VectorBuilder)>),
}

/// Appends rows to a vector under construction.
///
/// The builder is the sole owner of the storage it writes; `finish`
/// freezes it into a shareable `Vector`. Nested values recurse into child
/// builders. After a failed push the builder should be discarded.
#[derive(Debug)]
pub struct VectorBuilder {
    logical_type: LogicalType,
    data: BuilderData,
    validity: ValidityMask,
    len: usize,
}

impl VectorBuilder {
    /// Creates a builder for the given type.
    pub fn new(logical_type: &LogicalType) -> Self {
        Self::with_capacity(logical_type, 0)
    }

    /// Creates a builder with room for `capacity` rows.
    pub fn with_capacity(logical_type: &LogicalType, capacity: usize) -> Self {
        let data = match logical_type {
            LogicalType::Null => BuilderData::Null,
            LogicalType::Boolean => BuilderData::Boolean(Vec::with_capacity(capacity)),
            LogicalType::Integer => BuilderData::Integer(Vec::with_capacity(capacity)),
            LogicalType::BigInt => BuilderData::BigInt(Vec::with_capacity(capacity)),
            LogicalType::Double => BuilderData::Double(Vec::with_capacity(capacity)),
            LogicalType::Varchar => BuilderData::Varchar(Vec::with_capacity(capacity)),
            LogicalType::List(child) => BuilderData::List {
                entries: Vec::with_capacity(capacity),
                child: Box::new(VectorBuilder::with_capacity(child, capacity)),
            },
            LogicalType::Struct(fields) => BuilderData::Struct(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), VectorBuilder::with_capacity(ty, capacity)))
                    .collect(),
            ),
        };
        Self {
            logical_type: logical_type.clone(),
            data,
            validity: ValidityMask::all_valid(),
            len: 0,
        }
    }

    /// Returns the type being built.
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Returns the number of rows appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rows were appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a NULL row. A NULL struct row also appends NULL to every
    /// field; a NULL list row has length 0.
    pub fn push_null(&mut self) {
        match &mut self.data {
            BuilderData::Null => {}
            BuilderData::Boolean(v) => v.push(false),
            BuilderData::Integer(v) => v.push(0),
            BuilderData::BigInt(v) => v.push(0),
            BuilderData::Double(v) => v.push(0.0),
            BuilderData::Varchar(v) => v.push(String::new()),
            BuilderData::List { entries, child } => entries.push(ListEntry {
                offset: child.len(),
                length: 0,
            }),
            BuilderData::Struct(children) => {
                for (_, child) in children {
                    child.push_null();
                }
            }
        }
        self.validity.set_invalid(self.len);
        self.len += 1;
    }

    /// Appends a value, widening numbers where the type allows.
    pub fn push(&mut self, value: &Value) -> StrataResult<()> {
        if value.is_null() {
            self.push_null();
            return Ok(());
        }
        let mismatch = || StrataError::type_mismatch(&self.logical_type, value.logical_type());

        match (&mut self.data, value) {
            (BuilderData::Boolean(v), Value::Boolean(b)) => v.push(*b),
            (BuilderData::Integer(v), Value::Integer(i)) => v.push(*i),
            (BuilderData::BigInt(v), Value::Integer(i)) => v.push(i64::from(*i)),
            (BuilderData::BigInt(v), Value::BigInt(i)) => v.push(*i),
            (BuilderData::Double(v), Value::Integer(_) | Value::BigInt(_) | Value::Double(_)) => {
                v.push(value.to_f64().ok_or_else(mismatch)?);
            }
            (BuilderData::Varchar(v), Value::Varchar(s)) => v.push(s.clone()),
            (BuilderData::List { entries, child }, Value::List(items)) => {
                let offset = child.len();
                for item in items {
                    child.push(item)?;
                }
                entries.push(ListEntry {
                    offset,
                    length: items.len(),
                });
            }
            (BuilderData::Struct(children), Value::Struct(fields)) if children.len() == fields.len() => {
                for ((_, child), (_, field)) in children.iter_mut().zip(fields) {
                    child.push(field)?;
                }
            }
            _ => return Err(mismatch()),
        }
        self.len += 1;
        Ok(())
    }

    /// Appends row `row` of `vector`.
    pub fn push_from(&mut self, vector: &Vector, row: usize) -> StrataResult<()> {
        self.push(&vector.value(row))
    }

    /// Freezes the builder into a vector.
    pub fn finish(self) -> Vector {
        let data = match self.data {
            BuilderData::Null => VectorData::Null,
            BuilderData::Boolean(v) => VectorData::Boolean(v),
            BuilderData::Integer(v) => VectorData::Integer(v),
            BuilderData::BigInt(v) => VectorData::BigInt(v),
            BuilderData::Double(v) => VectorData::Double(v),
            BuilderData::Varchar(v) => VectorData::Varchar(v),
            BuilderData::List { entries, child } => VectorData::List {
                entries,
                child: child.finish(),
            },
            BuilderData::Struct(children) => VectorData::Struct(
                children
                    .into_iter()
                    .map(|(name, child)| (name, child.finish()))
                    .collect(),
            ),
        };
        Vector::from_buffer(self.logical_type, VectorBuffer::new(data, self.validity, self.len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening() {
        let mut builder = VectorBuilder::new(&LogicalType::Double);
        builder.push(&Value::Integer(1)).unwrap();
        builder.push(&Value::BigInt(2)).unwrap();
        builder.push(&Value::Double(2.5)).unwrap();
        let v = builder.finish();
        assert_eq!(
            v.values(),
            vec![Value::Double(1.0), Value::Double(2.0), Value::Double(2.5)]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let mut builder = VectorBuilder::new(&LogicalType::Integer);
        let err = builder.push(&Value::varchar("x")).unwrap_err();
        assert!(matches!(err, StrataError::TypeMismatch { .. }));

        let mut builder = VectorBuilder::new(&LogicalType::struct_of([("a", LogicalType::Integer)]));
        assert!(builder
            .push(&Value::struct_value([("a", Value::Integer(1)), ("b", Value::Integer(2))]))
            .is_err());
    }

    #[test]
    fn test_list_of_structs() {
        let ty = LogicalType::list(LogicalType::struct_of([
            ("a", LogicalType::Integer),
            ("b", LogicalType::Varchar),
        ]));
        let row = Value::list([
            Value::struct_value([("a", Value::Integer(1)), ("b", Value::varchar("x"))]),
            Value::Null,
        ]);
        let mut builder = VectorBuilder::new(&ty);
        builder.push(&row).unwrap();
        builder.push_null();
        let v = builder.finish();

        assert_eq!(v.len(), 2);
        assert_eq!(v.value(0), row);
        assert_eq!(v.value(1), Value::Null);
        assert!(v.verify().is_ok());

        let elements = v.list_child().unwrap();
        assert_eq!(elements.len(), 2);
        let fields = elements.get_children().unwrap();
        assert_eq!(fields[1].1.values(), vec![Value::varchar("x"), Value::Null]);
    }
}
