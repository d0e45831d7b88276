//! Logical types of vectors and values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The logical type of a vector, column or expression.
///
/// Nested types compose freely: `List(Struct(..))` and
/// `Struct(.., List(..))` are both valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// Type of an untyped NULL literal.
    Null,
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Variable-length string.
    Varchar,
    /// Variable-length list of elements of one type.
    List(Box<LogicalType>),
    /// Ordered named fields.
    Struct(Vec<(String, LogicalType)>),
}

impl LogicalType {
    /// Creates a LIST type with the given element type.
    #[must_use]
    pub fn list(child: LogicalType) -> Self {
        LogicalType::List(Box::new(child))
    }

    /// Creates a STRUCT type from `(name, type)` pairs.
    #[must_use]
    pub fn struct_of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, LogicalType)>,
        S: Into<String>,
    {
        LogicalType::Struct(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    /// Returns true for numeric types.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Integer | LogicalType::BigInt | LogicalType::Double
        )
    }

    /// Returns true for integral types.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, LogicalType::Integer | LogicalType::BigInt)
    }

    /// Returns true for LIST and STRUCT.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self, LogicalType::List(_) | LogicalType::Struct(_))
    }

    /// Returns the element type of a LIST.
    #[must_use]
    pub fn list_child(&self) -> Option<&LogicalType> {
        match self {
            LogicalType::List(child) => Some(child),
            _ => None,
        }
    }

    /// Returns the fields of a STRUCT.
    #[must_use]
    pub fn struct_fields(&self) -> Option<&[(String, LogicalType)]> {
        match self {
            LogicalType::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns true if values of this type can be implicitly widened to `target`.
    #[must_use]
    pub fn can_implicit_cast_to(&self, target: &LogicalType) -> bool {
        match (self, target) {
            (a, b) if a == b => true,
            (LogicalType::Null, _) => true,
            (LogicalType::Integer, LogicalType::BigInt | LogicalType::Double)
            | (LogicalType::BigInt, LogicalType::Double) => true,
            (LogicalType::List(a), LogicalType::List(b)) => a.can_implicit_cast_to(b),
            (LogicalType::Struct(a), LogicalType::Struct(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((_, ta), (_, tb))| ta.can_implicit_cast_to(tb))
            }
            _ => false,
        }
    }

    /// Returns the narrowest type both `a` and `b` widen to, if any.
    #[must_use]
    pub fn max_type(a: &LogicalType, b: &LogicalType) -> Option<LogicalType> {
        if a.can_implicit_cast_to(b) {
            Some(b.clone())
        } else if b.can_implicit_cast_to(a) {
            Some(a.clone())
        } else {
            match (a, b) {
                (LogicalType::List(x), LogicalType::List(y)) => {
                    Self::max_type(x, y).map(LogicalType::list)
                }
                _ => None,
            }
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Null => write!(f, "NULL"),
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Varchar => write!(f, "VARCHAR"),
            LogicalType::List(child) => write!(f, "{child}[]"),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let ty = LogicalType::list(LogicalType::struct_of([
            ("a", LogicalType::Integer),
            ("b", LogicalType::list(LogicalType::Varchar)),
        ]));
        assert_eq!(ty.to_string(), "STRUCT(a INTEGER, b VARCHAR[])[]");
    }

    #[test]
    fn test_implicit_casts() {
        assert!(LogicalType::Integer.can_implicit_cast_to(&LogicalType::Double));
        assert!(LogicalType::Null.can_implicit_cast_to(&LogicalType::list(LogicalType::Integer)));
        assert!(!LogicalType::Double.can_implicit_cast_to(&LogicalType::Integer));
        assert!(LogicalType::list(LogicalType::Integer)
            .can_implicit_cast_to(&LogicalType::list(LogicalType::BigInt)));
        assert!(!LogicalType::Varchar.can_implicit_cast_to(&LogicalType::Integer));
    }

    #[test]
    fn test_max_type() {
        assert_eq!(
            LogicalType::max_type(&LogicalType::Integer, &LogicalType::BigInt),
            Some(LogicalType::BigInt)
        );
        assert_eq!(
            LogicalType::max_type(&LogicalType::Null, &LogicalType::Varchar),
            Some(LogicalType::Varchar)
        );
        assert_eq!(
            LogicalType::max_type(&LogicalType::Varchar, &LogicalType::Integer),
            None
        );
    }

    #[test]
    fn test_accessors() {
        let list = LogicalType::list(LogicalType::Integer);
        assert_eq!(list.list_child(), Some(&LogicalType::Integer));
        assert!(list.is_nested());
        assert!(list.struct_fields().is_none());
        assert!(LogicalType::BigInt.is_integral());
        assert!(!LogicalType::Double.is_integral());
    }
}
