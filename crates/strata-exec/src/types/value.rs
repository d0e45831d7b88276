//! Row-at-a-time values.
//!
//! `Value` is the boxed counterpart of a single vector row. Vectors are the
//! unit of execution; values are used at the edges (constants, results,
//! aggregate states, grouping keys).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use strata_common::{StrataError, StrataResult};

use super::LogicalType;

/// A single runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 64-bit floating point.
    Double(f64),
    /// String value.
    Varchar(String),
    /// List of values.
    List(Vec<Value>),
    /// Ordered named fields.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Creates a string value.
    pub fn varchar(v: impl Into<String>) -> Self {
        Value::Varchar(v.into())
    }

    /// Creates a list value.
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(values.into_iter().collect())
    }

    /// Creates a struct value from `(name, value)` pairs.
    pub fn struct_value<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts this value to a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::BigInt(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Converts this value to an i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Integer(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    /// Converts this value to an f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(f64::from(*i)),
            Value::BigInt(i) => Some(*i as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice of a VARCHAR value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of a LIST value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the fields of a STRUCT value.
    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Infers the logical type of this value.
    ///
    /// A list takes the type of its first non-NULL element.
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Value::Null => LogicalType::Null,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::Integer(_) => LogicalType::Integer,
            Value::BigInt(_) => LogicalType::BigInt,
            Value::Double(_) => LogicalType::Double,
            Value::Varchar(_) => LogicalType::Varchar,
            Value::List(values) => LogicalType::list(
                values
                    .iter()
                    .find(|v| !v.is_null())
                    .map_or(LogicalType::Null, Value::logical_type),
            ),
            Value::Struct(fields) => LogicalType::Struct(
                fields
                    .iter()
                    .map(|(n, v)| (n.clone(), v.logical_type()))
                    .collect(),
            ),
        }
    }

    /// Casts this value to the specified type.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn cast(&self, target: &LogicalType) -> StrataResult<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        let fail = || StrataError::conversion(format!("Could not convert {self} to {target}"));

        match target {
            LogicalType::Null => Err(fail()),
            LogicalType::Boolean => match self {
                Value::Varchar(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" => Ok(Value::Boolean(true)),
                    "false" | "f" | "0" => Ok(Value::Boolean(false)),
                    _ => Err(fail()),
                },
                other => other.to_bool().map(Value::Boolean).ok_or_else(fail),
            },
            LogicalType::Integer => {
                let wide = match self {
                    Value::Varchar(s) => s.trim().parse::<i64>().map_err(|_| fail())?,
                    Value::Double(f) if f.is_finite() => {
                        let rounded = f.round();
                        if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
                            return Err(fail());
                        }
                        rounded as i64
                    }
                    other => other.to_i64().ok_or_else(fail)?,
                };
                i32::try_from(wide).map(Value::Integer).map_err(|_| fail())
            }
            LogicalType::BigInt => match self {
                Value::Varchar(s) => s.trim().parse().map(Value::BigInt).map_err(|_| fail()),
                Value::Double(f) if f.is_finite() => {
                    let rounded = f.round();
                    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                        return Err(fail());
                    }
                    Ok(Value::BigInt(rounded as i64))
                }
                other => other.to_i64().map(Value::BigInt).ok_or_else(fail),
            },
            LogicalType::Double => match self {
                Value::Varchar(s) => s.trim().parse().map(Value::Double).map_err(|_| fail()),
                other => other.to_f64().map(Value::Double).ok_or_else(fail),
            },
            LogicalType::Varchar => Ok(Value::Varchar(self.to_string())),
            LogicalType::List(child) => match self {
                Value::List(values) => values
                    .iter()
                    .map(|v| v.cast(child))
                    .collect::<StrataResult<Vec<_>>>()
                    .map(Value::List),
                _ => Err(fail()),
            },
            LogicalType::Struct(fields) => match self {
                Value::Struct(values) if values.len() == fields.len() => values
                    .iter()
                    .zip(fields)
                    .map(|((_, v), (name, ty))| Ok((name.clone(), v.cast(ty)?)))
                    .collect::<StrataResult<Vec<_>>>()
                    .map(Value::Struct),
                _ => Err(fail()),
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::BigInt(_) | Value::Double(_) => 2,
            Value::Varchar(_) => 3,
            Value::List(_) => 4,
            Value::Struct(_) => 5,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order used for sorting and grouping: NULL sorts first, numbers
    /// compare across widths, lists compare lexicographically and structs
    /// field by field.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Integer(a), Value::BigInt(b)) => i64::from(*a).cmp(b),
            (Value::BigInt(a), Value::Integer(b)) => a.cmp(&i64::from(*b)),
            (Value::Double(a), Value::Double(b)) => compare_doubles(*a, *b),
            (Value::Integer(a), Value::Double(b)) => compare_int_double(i64::from(*a), *b),
            (Value::BigInt(a), Value::Double(b)) => compare_int_double(*a, *b),
            (Value::Double(a), Value::Integer(b)) => compare_int_double(i64::from(*b), *a).reverse(),
            (Value::Double(a), Value::BigInt(b)) => compare_int_double(*b, *a).reverse(),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Struct(a), Value::Struct(b)) => a
                .iter()
                .map(|(_, v)| v)
                .cmp(b.iter().map(|(_, v)| v)),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

/// IEEE equality first so that `-0.0 == 0.0`, then the total order.
fn compare_doubles(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Exact comparison of an integer with a double. Going through `f64`
/// would round integers above 2^53 and make distinct integers equal to
/// the same double.
fn compare_int_double(i: i64, d: f64) -> Ordering {
    // 2^63, the first double above i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if d.is_nan() {
        return (i as f64).total_cmp(&d);
    }
    if d >= LIMIT {
        return Ordering::Less;
    }
    if d < -LIMIT {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if d > whole => Ordering::Less,
        Ordering::Equal if d < whole => Ordering::Greater,
        ordering => ordering,
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            // Numbers that compare equal across widths must hash alike.
            Value::Integer(_) | Value::BigInt(_) | Value::Double(_) => {
                let f = self.to_f64().unwrap_or_default();
                let normalized = if f == 0.0 { 0.0 } else { f };
                normalized.to_bits().hash(state);
            }
            Value::Varchar(s) => s.hash(state),
            Value::List(values) => values.hash(state),
            Value::Struct(fields) => {
                for (_, v) in fields {
                    v.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::BigInt(i) => write!(f, "{i}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Varchar(s) => write!(f, "{s}"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{name}': {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    /// LIST serializes as a sequence, STRUCT as an ordered map.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i32(*i),
            Value::BigInt(i) => serializer.serialize_i64(*i),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Varchar(s) => serializer.serialize_str(s),
            Value::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, v) in fields {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_comparison() {
        assert!(Value::Integer(10) < Value::Integer(20));
        assert!(Value::Null < Value::Integer(0));
        assert_eq!(Value::Integer(10), Value::BigInt(10));
        assert!(Value::Integer(10) < Value::Double(10.5));
        assert!(Value::list([1.into(), 2.into()]) < Value::list([1.into(), 3.into()]));
        assert!(Value::list([1.into()]) < Value::list([1.into(), 0.into()]));
        assert_eq!(Value::Double(-0.0), Value::Integer(0));
        assert_eq!(Value::Double(-0.0), Value::Double(0.0));
        assert!(Value::Double(-1.5) < Value::BigInt(-1));
        assert!(Value::BigInt(i64::MAX) < Value::Double(9_223_372_036_854_775_808.0));
        assert!(Value::BigInt(i64::MIN) > Value::Double(f64::NEG_INFINITY));
    }

    #[test]
    fn test_wide_integers_compare_exactly_with_doubles() {
        let big = 1i64 << 53;
        let below = Value::BigInt(big);
        let above = Value::BigInt(big + 1);
        let double = Value::Double(big as f64);

        assert_eq!(below, double);
        assert_ne!(above, double);
        assert!(above > double);
        assert!(double < above);
        assert_ne!(below, above);

        let mut groups = std::collections::HashMap::new();
        for key in [below.clone(), above.clone(), double] {
            *groups.entry(key).or_insert(0) += 1;
        }
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&below], 2);
        assert_eq!(groups[&above], 1);
    }

    #[test]
    fn test_value_hash_consistent_with_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Value::Integer(1), "one");
        map.insert(Value::list([Value::Null]), "null list");

        assert_eq!(map.get(&Value::BigInt(1)), Some(&"one"));
        assert_eq!(map.get(&Value::list([Value::Null])), Some(&"null list"));
        assert_eq!(map.get(&Value::Null), None);
    }

    #[test]
    fn test_logical_type_inference() {
        let v = Value::list([Value::Null, Value::Integer(3)]);
        assert_eq!(v.logical_type(), LogicalType::list(LogicalType::Integer));

        let v = Value::struct_value([("a", Value::varchar("x"))]);
        assert_eq!(
            v.logical_type(),
            LogicalType::struct_of([("a", LogicalType::Varchar)])
        );
    }

    #[test]
    fn test_value_cast() {
        assert_eq!(
            Value::Integer(42).cast(&LogicalType::Varchar).unwrap(),
            Value::varchar("42")
        );
        assert_eq!(
            Value::varchar(" 17 ").cast(&LogicalType::Integer).unwrap(),
            Value::Integer(17)
        );
        assert_eq!(
            Value::Double(2.5).cast(&LogicalType::BigInt).unwrap(),
            Value::BigInt(3)
        );
        assert!(Value::varchar("abc").cast(&LogicalType::Integer).is_err());
        assert!(Value::BigInt(i64::MAX).cast(&LogicalType::Integer).is_err());
        assert!(Value::Null.cast(&LogicalType::Boolean).unwrap().is_null());

        let list = Value::list([1.into(), Value::Null]);
        assert_eq!(
            list.cast(&LogicalType::list(LogicalType::Double)).unwrap(),
            Value::list([Value::Double(1.0), Value::Null])
        );
    }

    #[test]
    fn test_display_nested() {
        let v = Value::struct_value([
            ("a", Value::Integer(1)),
            ("b", Value::list([2.into(), Value::Null])),
        ]);
        assert_eq!(v.to_string(), "{'a': 1, 'b': [2, NULL]}");
    }

    #[test]
    fn test_serialize_nested() {
        let v = Value::list([
            Value::struct_value([("b", Value::Integer(1)), ("a", Value::Null)]),
            Value::Null,
        ]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"[{"b":1,"a":null},null]"#);
    }
}
