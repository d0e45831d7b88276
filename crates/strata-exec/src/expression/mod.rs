//! Bound expressions.
//!
//! A bound expression has every name resolved: columns are input indices,
//! functions are resolved entries with their bind data attached and every
//! node knows its return type. Parsed (unresolved) expressions live in
//! [`parsed`] and are turned into bound ones by the [`binder`].

pub mod binder;
pub mod parsed;

pub use binder::ExpressionBinder;
pub use parsed::ParsedExpression;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::function::{AggregateFunction, FunctionData, FunctionDisplay, ScalarFunction};
use crate::logical::LogicalOperator;
use crate::types::{LogicalType, Value};

/// A resolved expression that can be executed against a chunk.
#[derive(Debug, Clone)]
pub enum BoundExpression {
    /// Reference to an input column.
    ColumnRef {
        /// Column name for display.
        name: String,
        /// Column index in the input chunk.
        index: usize,
        /// Column type.
        return_type: LogicalType,
    },

    /// Constant value.
    Constant {
        /// The value.
        value: Value,
        /// Value type.
        return_type: LogicalType,
    },

    /// Scalar function call.
    Function(BoundFunctionExpression),

    /// Type cast.
    Cast {
        /// Expression to cast.
        child: Box<BoundExpression>,
        /// Target type.
        target: LogicalType,
    },

    /// Named expression.
    Alias {
        /// Output name.
        name: String,
        /// Aliased expression.
        child: Box<BoundExpression>,
    },

    /// Uncorrelated subquery.
    Subquery(BoundSubqueryExpression),
}

impl BoundExpression {
    /// Creates a column reference.
    pub fn column(name: impl Into<String>, index: usize, return_type: LogicalType) -> Self {
        BoundExpression::ColumnRef {
            name: name.into(),
            index,
            return_type,
        }
    }

    /// Creates a constant whose type is inferred from the value.
    pub fn constant(value: Value) -> Self {
        let return_type = value.logical_type();
        BoundExpression::Constant { value, return_type }
    }

    /// Creates a constant with an explicit type.
    pub fn typed_constant(value: Value, return_type: LogicalType) -> Self {
        BoundExpression::Constant { value, return_type }
    }

    /// Wraps this expression in a cast.
    #[must_use]
    pub fn cast(self, target: LogicalType) -> Self {
        BoundExpression::Cast {
            child: Box::new(self),
            target,
        }
    }

    /// Names this expression.
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        BoundExpression::Alias {
            name: name.into(),
            child: Box::new(self),
        }
    }

    /// Returns the result type.
    pub fn return_type(&self) -> &LogicalType {
        match self {
            BoundExpression::ColumnRef { return_type, .. }
            | BoundExpression::Constant { return_type, .. } => return_type,
            BoundExpression::Function(f) => &f.return_type,
            BoundExpression::Cast { target, .. } => target,
            BoundExpression::Alias { child, .. } => child.return_type(),
            BoundExpression::Subquery(s) => &s.return_type,
        }
    }

    /// Returns the output column name.
    pub fn name(&self) -> String {
        match self {
            BoundExpression::ColumnRef { name, .. } | BoundExpression::Alias { name, .. } => {
                name.clone()
            }
            other => other.to_string(),
        }
    }

    /// Returns true if the expression depends on neither input rows nor
    /// subqueries, so it can be evaluated once at bind time.
    pub fn is_foldable(&self) -> bool {
        match self {
            BoundExpression::Constant { .. } => true,
            BoundExpression::ColumnRef { .. } | BoundExpression::Subquery(_) => false,
            BoundExpression::Function(f) => f.children.iter().all(BoundExpression::is_foldable),
            BoundExpression::Cast { child, .. } | BoundExpression::Alias { child, .. } => {
                child.is_foldable()
            }
        }
    }

    /// Collects the plans of all subqueries in this expression.
    pub fn collect_subqueries<'a>(&'a self, out: &mut Vec<&'a Arc<LogicalOperator>>) {
        match self {
            BoundExpression::Subquery(s) => out.push(&s.subquery),
            BoundExpression::Function(f) => {
                for child in &f.children {
                    child.collect_subqueries(out);
                }
            }
            BoundExpression::Cast { child, .. } | BoundExpression::Alias { child, .. } => {
                child.collect_subqueries(out);
            }
            BoundExpression::ColumnRef { .. } | BoundExpression::Constant { .. } => {}
        }
    }
}

impl fmt::Display for BoundExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpression::ColumnRef { name, .. } => write!(f, "{name}"),
            BoundExpression::Constant { value, .. } => match value {
                Value::Varchar(s) => write!(f, "'{s}'"),
                other => write!(f, "{other}"),
            },
            BoundExpression::Function(func) => write!(f, "{func}"),
            BoundExpression::Cast { child, target } => write!(f, "CAST({child} AS {target})"),
            BoundExpression::Alias { name, child } => write!(f, "{child} AS {name}"),
            BoundExpression::Subquery(s) => write!(f, "{}(SUBQUERY)", s.kind),
        }
    }
}

/// A bound scalar function call.
#[derive(Debug, Clone)]
pub struct BoundFunctionExpression {
    /// The resolved function.
    pub function: ScalarFunction,
    /// Runtime arguments. Binding may remove arguments it consumed.
    pub children: Vec<BoundExpression>,
    /// Argument types as written, before binding touched the children.
    pub arguments: Vec<LogicalType>,
    /// Resolved return type.
    pub return_type: LogicalType,
    /// Data produced by the bind callback.
    pub bind_info: Option<Arc<dyn FunctionData>>,
}

impl BoundFunctionExpression {
    /// Creates an unbound call; the bind callback fills in the return type.
    pub fn new(function: ScalarFunction, children: Vec<BoundExpression>) -> Self {
        let arguments = children.iter().map(|c| c.return_type().clone()).collect();
        Self {
            function,
            children,
            arguments,
            return_type: LogicalType::Null,
            bind_info: None,
        }
    }

    /// Returns the bind data downcast to `T`.
    pub fn bind_data<T: FunctionData + 'static>(&self) -> Option<&T> {
        self.bind_info.as_deref()?.as_any().downcast_ref::<T>()
    }
}

impl fmt::Display for BoundFunctionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function.name;
        match (self.function.display, self.children.as_slice()) {
            (FunctionDisplay::Infix, [left, right]) => write!(f, "({left} {name} {right})"),
            (FunctionDisplay::Prefix, [child]) => write!(f, "{name} {child}"),
            _ => {
                write!(f, "{name}(")?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A bound aggregate call.
#[derive(Debug, Clone)]
pub struct BoundAggregateExpression {
    /// The resolved aggregate.
    pub function: AggregateFunction,
    /// Arguments, evaluated per input row.
    pub children: Vec<BoundExpression>,
    /// Resolved return type.
    pub return_type: LogicalType,
    /// Output name.
    pub alias: Option<String>,
}

impl BoundAggregateExpression {
    /// Returns the output column name.
    pub fn name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for BoundAggregateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.children.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.function.name, args.join(", "))
    }
}

/// A bound UNNEST call.
#[derive(Debug, Clone)]
pub struct BoundUnnestExpression {
    /// LIST-typed argument.
    pub child: BoundExpression,
    /// Element type.
    pub return_type: LogicalType,
    /// Output name.
    pub alias: Option<String>,
}

impl BoundUnnestExpression {
    /// Returns the output column name.
    pub fn name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("unnest({})", self.child))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Ascending.
    Ascending,
    /// Descending.
    Descending,
}

/// One ORDER BY key.
#[derive(Debug, Clone)]
pub struct BoundOrderByNode {
    /// Sort key.
    pub expression: BoundExpression,
    /// Direction.
    pub order: OrderType,
    /// NULLs before other values.
    pub nulls_first: bool,
}

impl BoundOrderByNode {
    /// Ascending, NULLs first.
    pub fn ascending(expression: BoundExpression) -> Self {
        Self {
            expression,
            order: OrderType::Ascending,
            nulls_first: true,
        }
    }

    /// Descending, NULLs last.
    pub fn descending(expression: BoundExpression) -> Self {
        Self {
            expression,
            order: OrderType::Descending,
            nulls_first: false,
        }
    }
}

/// Kind of subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubqueryKind {
    /// First column of the first row, or NULL.
    Scalar,
    /// Whether the subquery yields any row.
    Exists,
}

impl fmt::Display for SubqueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubqueryKind::Scalar => write!(f, "SCALAR"),
            SubqueryKind::Exists => write!(f, "EXISTS"),
        }
    }
}

/// An uncorrelated subquery embedded in an expression.
#[derive(Debug, Clone)]
pub struct BoundSubqueryExpression {
    /// Subquery kind.
    pub kind: SubqueryKind,
    /// Plan of the subquery.
    pub subquery: Arc<LogicalOperator>,
    /// Result type.
    pub return_type: LogicalType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionRegistry;
    use crate::function::FunctionEntry;

    fn plus(left: BoundExpression, right: BoundExpression) -> BoundExpression {
        let registry = FunctionRegistry::builtin();
        let FunctionEntry::Scalar(function) = registry.lookup("+").unwrap().clone() else {
            panic!("+ is a scalar function");
        };
        let mut call = BoundFunctionExpression::new(function.clone(), vec![left, right]);
        (function.bind)(&mut call).unwrap();
        BoundExpression::Function(call)
    }

    #[test]
    fn test_display_and_names() {
        let expr = plus(
            BoundExpression::column("a", 0, LogicalType::Integer),
            BoundExpression::constant(Value::Integer(1)),
        );
        assert_eq!(expr.to_string(), "(a + 1)");
        assert_eq!(expr.name(), "(a + 1)");
        assert_eq!(expr.clone().alias("b").name(), "b");
        assert_eq!(*expr.return_type(), LogicalType::Integer);
    }

    #[test]
    fn test_foldable() {
        let constant = plus(
            BoundExpression::constant(Value::Integer(1)),
            BoundExpression::constant(Value::Integer(2)),
        );
        assert!(constant.is_foldable());
        assert!(constant.clone().cast(LogicalType::Varchar).is_foldable());

        let column = BoundExpression::column("a", 0, LogicalType::Integer);
        assert!(!plus(column, BoundExpression::constant(Value::Integer(1))).is_foldable());
    }
}
