//! Unresolved expressions as they come out of a parser.

use std::fmt;
use std::sync::Arc;

use crate::expression::{BoundExpression, SubqueryKind};
use crate::logical::LogicalOperator;
use crate::types::{LogicalType, Value};

/// An expression whose names are not yet resolved.
#[derive(Debug, Clone)]
pub enum ParsedExpression {
    /// Column reference by name.
    Column(String),
    /// Literal value.
    Constant(Value),
    /// Function call by name. Operators are functions named `+`, `=`, ...
    Function {
        /// Function name.
        name: String,
        /// Arguments.
        children: Vec<ParsedExpression>,
    },
    /// Explicit cast.
    Cast {
        /// Expression to cast.
        child: Box<ParsedExpression>,
        /// Target type.
        target: LogicalType,
    },
    /// Named expression.
    Alias {
        /// Output name.
        name: String,
        /// Aliased expression.
        child: Box<ParsedExpression>,
    },
    /// Uncorrelated subquery over an already planned relation.
    Subquery {
        /// Subquery kind.
        kind: SubqueryKind,
        /// Planned subquery.
        plan: Arc<LogicalOperator>,
    },
    /// An expression bound while planning an earlier node, such as the
    /// output column of an aggregate or UNNEST call. Binds to itself.
    Bound(Box<BoundExpression>),
}

/// Column reference.
pub fn col(name: impl Into<String>) -> ParsedExpression {
    ParsedExpression::Column(name.into())
}

/// Literal.
pub fn lit(value: impl Into<Value>) -> ParsedExpression {
    ParsedExpression::Constant(value.into())
}

/// Function call.
pub fn func(name: impl Into<String>, children: Vec<ParsedExpression>) -> ParsedExpression {
    ParsedExpression::Function {
        name: name.into(),
        children,
    }
}

impl ParsedExpression {
    fn binary(self, op: &str, other: ParsedExpression) -> Self {
        func(op, vec![self, other])
    }

    /// `self = other`
    #[must_use]
    pub fn equals(self, other: ParsedExpression) -> Self {
        self.binary("=", other)
    }

    /// `self <> other`
    #[must_use]
    pub fn not_equals(self, other: ParsedExpression) -> Self {
        self.binary("<>", other)
    }

    /// `self < other`
    #[must_use]
    pub fn less_than(self, other: ParsedExpression) -> Self {
        self.binary("<", other)
    }

    /// `self > other`
    #[must_use]
    pub fn greater_than(self, other: ParsedExpression) -> Self {
        self.binary(">", other)
    }

    /// `self + other`
    #[must_use]
    pub fn plus(self, other: ParsedExpression) -> Self {
        self.binary("+", other)
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: ParsedExpression) -> Self {
        self.binary("and", other)
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: ParsedExpression) -> Self {
        self.binary("or", other)
    }

    /// `CAST(self AS target)`
    #[must_use]
    pub fn cast(self, target: LogicalType) -> Self {
        ParsedExpression::Cast {
            child: Box::new(self),
            target,
        }
    }

    /// `self AS name`
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        ParsedExpression::Alias {
            name: name.into(),
            child: Box::new(self),
        }
    }

    /// Returns the alias name if the expression is aliased.
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            ParsedExpression::Alias { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Strips a top-level alias.
    pub fn unaliased(&self) -> &ParsedExpression {
        match self {
            ParsedExpression::Alias { child, .. } => child.unaliased(),
            other => other,
        }
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedExpression::Column(name) => write!(f, "{name}"),
            ParsedExpression::Constant(Value::Varchar(s)) => write!(f, "'{s}'"),
            ParsedExpression::Constant(value) => write!(f, "{value}"),
            ParsedExpression::Function { name, children } => {
                let args: Vec<String> = children.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", args.join(", "))
            }
            ParsedExpression::Cast { child, target } => write!(f, "CAST({child} AS {target})"),
            ParsedExpression::Alias { name, child } => write!(f, "{child} AS {name}"),
            ParsedExpression::Subquery { kind, .. } => write!(f, "{kind}(SUBQUERY)"),
            ParsedExpression::Bound(expr) => write!(f, "{expr}"),
        }
    }
}
