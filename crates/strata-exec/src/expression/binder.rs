//! Resolves parsed expressions against an input schema.
//!
//! Binding is where every static check happens: unknown columns and
//! functions, wrong argument counts, type errors and misplaced aggregates
//! or UNNEST calls all fail here, before a plan is ever compiled.

use strata_common::{StrataError, StrataResult};

use super::parsed::ParsedExpression;
use super::{
    BoundAggregateExpression, BoundExpression, BoundFunctionExpression, BoundSubqueryExpression,
    BoundUnnestExpression, SubqueryKind,
};
use crate::function::{FunctionEntry, FunctionRegistry};
use crate::logical::Schema;
use crate::types::LogicalType;

/// What kind of call sits at the top of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionClass {
    /// Row-preserving expression.
    Scalar,
    /// Aggregate call.
    Aggregate,
    /// UNNEST call.
    Unnest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindContext {
    Scalar,
    AggregateArgument,
    UnnestArgument,
}

/// Binds expressions against one input schema.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionBinder<'a> {
    schema: &'a Schema,
    registry: &'a FunctionRegistry,
    clause: &'a str,
}

impl<'a> ExpressionBinder<'a> {
    /// Creates a binder over `schema`.
    pub fn new(schema: &'a Schema, registry: &'a FunctionRegistry) -> Self {
        Self {
            schema,
            registry,
            clause: "this context",
        }
    }

    /// Names the clause being bound, for error messages.
    #[must_use]
    pub fn with_clause(mut self, clause: &'a str) -> Self {
        self.clause = clause;
        self
    }

    /// Classifies the top-level call of `expr`, looking through aliases.
    pub fn classify(&self, expr: &ParsedExpression) -> ExpressionClass {
        if let ParsedExpression::Function { name, .. } = expr.unaliased() {
            match self.registry.lookup(name) {
                Ok(FunctionEntry::Aggregate(_)) => return ExpressionClass::Aggregate,
                Ok(FunctionEntry::Unnest) => return ExpressionClass::Unnest,
                _ => {}
            }
        }
        ExpressionClass::Scalar
    }

    /// Binds a row-preserving expression. Aggregates and UNNEST are errors.
    pub fn bind(&self, expr: &ParsedExpression) -> StrataResult<BoundExpression> {
        self.bind_expression(expr, BindContext::Scalar)
    }

    /// Binds a top-level aggregate call such as `list(x) AS l`.
    pub fn bind_aggregate(&self, expr: &ParsedExpression) -> StrataResult<BoundAggregateExpression> {
        let (name, children) = call_parts(expr.unaliased())?;
        let FunctionEntry::Aggregate(function) = self.registry.lookup(name)? else {
            return Err(StrataError::bind(format!("{name} is not an aggregate function")));
        };
        check_arity(function.name, function.arity, children.len())?;

        let children = children
            .iter()
            .map(|child| self.bind_expression(child, BindContext::AggregateArgument))
            .collect::<StrataResult<Vec<_>>>()?;
        let arguments: Vec<LogicalType> =
            children.iter().map(|c| c.return_type().clone()).collect();
        let return_type = (function.bind)(&arguments)?;

        Ok(BoundAggregateExpression {
            function: function.clone(),
            children,
            return_type,
            alias: expr.alias_name().map(str::to_string),
        })
    }

    /// Binds a top-level UNNEST call such as `unnest(l) AS e`.
    pub fn bind_unnest(&self, expr: &ParsedExpression) -> StrataResult<BoundUnnestExpression> {
        let (name, children) = call_parts(expr.unaliased())?;
        if !matches!(self.registry.lookup(name)?, FunctionEntry::Unnest) {
            return Err(StrataError::bind(format!("{name} is not UNNEST")));
        }
        if children.len() != 1 {
            return Err(StrataError::bind("UNNEST() requires a single argument"));
        }

        let child = self.bind_expression(&children[0], BindContext::UnnestArgument)?;
        let return_type = match child.return_type() {
            LogicalType::List(element) => element.as_ref().clone(),
            LogicalType::Null => LogicalType::Null,
            _ => return Err(StrataError::bind("UNNEST() can only be applied to lists")),
        };

        Ok(BoundUnnestExpression {
            child,
            return_type,
            alias: expr.alias_name().map(str::to_string),
        })
    }

    fn bind_expression(
        &self,
        expr: &ParsedExpression,
        context: BindContext,
    ) -> StrataResult<BoundExpression> {
        match expr {
            ParsedExpression::Column(name) => {
                let index = self
                    .schema
                    .index_of(name)
                    .ok_or_else(|| StrataError::ColumnNotFound {
                        column: name.clone(),
                    })?;
                let field = &self.schema.fields()[index];
                Ok(BoundExpression::column(
                    field.name.clone(),
                    index,
                    field.logical_type.clone(),
                ))
            }
            ParsedExpression::Constant(value) => Ok(BoundExpression::constant(value.clone())),
            ParsedExpression::Function { name, children } => {
                self.bind_function(name, children, context)
            }
            ParsedExpression::Cast { child, target } => {
                let child = self.bind_expression(child, context)?;
                if child.return_type() == target {
                    return Ok(child);
                }
                if !cast_supported(child.return_type(), target) {
                    return Err(StrataError::bind(format!(
                        "Unimplemented type for cast ({} -> {target})",
                        child.return_type()
                    )));
                }
                Ok(child.cast(target.clone()))
            }
            ParsedExpression::Alias { name, child } => {
                Ok(self.bind_expression(child, context)?.alias(name.clone()))
            }
            ParsedExpression::Subquery { kind, plan } => {
                let schema = plan.schema();
                let return_type = match kind {
                    SubqueryKind::Exists => LogicalType::Boolean,
                    SubqueryKind::Scalar if schema.len() == 1 => schema.types().remove(0),
                    SubqueryKind::Scalar => {
                        return Err(StrataError::bind(format!(
                            "Subquery returns {} columns - expected 1",
                            schema.len()
                        )))
                    }
                };
                Ok(BoundExpression::Subquery(BoundSubqueryExpression {
                    kind: *kind,
                    subquery: plan.clone(),
                    return_type,
                }))
            }
            ParsedExpression::Bound(expr) => Ok(expr.as_ref().clone()),
        }
    }

    fn bind_function(
        &self,
        name: &str,
        children: &[ParsedExpression],
        context: BindContext,
    ) -> StrataResult<BoundExpression> {
        match self.registry.lookup(name)? {
            FunctionEntry::Scalar(function) => {
                check_arity(function.name, function.arity, children.len())?;
                let children = children
                    .iter()
                    .map(|child| self.bind_expression(child, context))
                    .collect::<StrataResult<Vec<_>>>()?;
                let mut call = BoundFunctionExpression::new(function.clone(), children);
                (function.bind)(&mut call)?;
                Ok(BoundExpression::Function(call))
            }
            FunctionEntry::Aggregate(_) => Err(match context {
                BindContext::AggregateArgument => {
                    StrataError::bind("aggregate function calls cannot be nested")
                }
                BindContext::UnnestArgument => {
                    StrataError::bind("aggregate functions are not allowed in UNNEST")
                }
                BindContext::Scalar => StrataError::bind(format!(
                    "aggregate functions are not allowed in {}",
                    self.clause
                )),
            }),
            FunctionEntry::Unnest => Err(match context {
                BindContext::UnnestArgument => StrataError::bind("UNNEST calls cannot be nested"),
                BindContext::AggregateArgument => {
                    StrataError::bind("UNNEST not supported inside an aggregate")
                }
                BindContext::Scalar => {
                    StrataError::bind(format!("UNNEST not supported in {}", self.clause))
                }
            }),
        }
    }
}

fn call_parts(expr: &ParsedExpression) -> StrataResult<(&str, &[ParsedExpression])> {
    match expr {
        ParsedExpression::Function { name, children } => Ok((name, children)),
        other => Err(StrataError::bind(format!("expected a function call, got {other}"))),
    }
}

fn check_arity(name: &str, arity: crate::function::Arity, given: usize) -> StrataResult<()> {
    if arity.accepts(given) {
        return Ok(());
    }
    Err(StrataError::bind(format!(
        "{name}() requires {arity}, got {given}"
    )))
}

fn cast_supported(from: &LogicalType, to: &LogicalType) -> bool {
    match (from, to) {
        (LogicalType::Null, _) | (_, LogicalType::Varchar) => true,
        (LogicalType::List(a), LogicalType::List(b)) => cast_supported(a, b),
        (LogicalType::Struct(a), LogicalType::Struct(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((_, x), (_, y))| cast_supported(x, y))
        }
        (a, b) => !a.is_nested() && !b.is_nested(),
    }
}
