//! Schema representation for logical plans.
//!
//! Schemas describe the output columns of each operator in a logical plan.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::LogicalType;

/// A field in a schema (name + type + optional relation qualifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Optional table/relation qualifier.
    pub qualifier: Option<String>,
    /// Column name.
    pub name: String,
    /// Data type.
    pub logical_type: LogicalType,
}

impl Field {
    /// Creates a new unqualified field.
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
            logical_type,
        }
    }

    /// Creates a new qualified field.
    pub fn qualified(
        qualifier: impl Into<String>,
        name: impl Into<String>,
        logical_type: LogicalType,
    ) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            logical_type,
        }
    }

    /// Returns the fully qualified name.
    pub fn qualified_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.qualified_name(), self.logical_type)
    }
}

/// Schema describes the columns output by a plan node.
///
/// Lookups are case-insensitive. When two fields share a name, the first
/// one wins for unqualified lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a schema from a list of fields.
    pub fn new(fields: Vec<Field>) -> Self {
        let mut schema = Self {
            fields: Vec::with_capacity(fields.len()),
            index: HashMap::new(),
        };
        for field in fields {
            schema.add_field(field);
        }
        schema
    }

    /// Adds a field to the schema.
    pub fn add_field(&mut self, field: Field) {
        let position = self.fields.len();
        self.index
            .entry(field.qualified_name().to_lowercase())
            .or_insert(position);
        self.index
            .entry(field.name.to_lowercase())
            .or_insert(position);
        self.fields.push(field);
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at the given index.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Finds the index of a field by plain or qualified name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Finds a field by plain or qualified name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.index_of(name).and_then(|i| self.fields.get(i))
    }

    /// Merges two schemas (for joins).
    pub fn merge(&self, other: &Schema) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        Schema::new(fields)
    }

    /// Projects the schema to the specified column indices.
    pub fn project(&self, indices: &[usize]) -> Self {
        let fields: Vec<_> = indices
            .iter()
            .filter_map(|&i| self.fields.get(i).cloned())
            .collect();
        Schema::new(fields)
    }

    /// Returns a copy with every field qualified by `qualifier`.
    pub fn qualify(&self, qualifier: &str) -> Self {
        Schema::new(
            self.fields
                .iter()
                .map(|f| Field::qualified(qualifier, f.name.clone(), f.logical_type.clone()))
                .collect(),
        )
    }

    /// Returns the column types.
    pub fn types(&self) -> Vec<LogicalType> {
        self.fields.iter().map(|f| f.logical_type.clone()).collect()
    }

    /// Returns the column names.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, "]")
    }
}

/// A reference-counted schema for sharing.
pub type SchemaRef = Arc<Schema>;
