//! Scalar and aggregate functions.
//!
//! Every function is a closed, tagged entry carrying plain function
//! pointers. Binding resolves the entry once, runs its bind callback and
//! stores the result (return type plus optional bind data) in the bound
//! expression; execution never looks functions up again.

pub mod aggregate;
pub mod scalar;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use strata_common::{StrataError, StrataResult};

use crate::chunk::DataChunk;
use crate::expression::BoundFunctionExpression;
use crate::types::LogicalType;
use crate::vector::Vector;

pub use aggregate::{Accumulator, AggregateFunction, AggregateKind};
pub use scalar::{StructExtractBindData, StructPackBindData};

/// Opaque per-call-site data produced by a bind callback.
///
/// Bind data is created once, never mutated afterwards and may be shared
/// across executions and threads.
pub trait FunctionData: fmt::Debug + Send + Sync {
    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Resolves the return type and bind data of a scalar call. May rewrite
/// the child list (for example to drop constant arguments consumed at bind).
pub type ScalarBindFn = fn(&mut BoundFunctionExpression) -> StrataResult<()>;

/// Executes a scalar function over a chunk holding one vector per argument.
/// The result has exactly as many rows as the argument chunk.
pub type ScalarExecuteFn = fn(&DataChunk, &BoundFunctionExpression) -> StrataResult<Vector>;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// At least `n` arguments.
    AtLeast(usize),
}

impl Arity {
    /// Returns true if `n` arguments are accepted.
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(1) => write!(f, "exactly one argument"),
            Arity::Exact(n) => write!(f, "exactly {n} arguments"),
            Arity::AtLeast(n) => write!(f, "at least {n} arguments"),
        }
    }
}

/// How a call renders in plan output and column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionDisplay {
    /// `name(a, b)`.
    Call,
    /// `(a name b)`.
    Infix,
    /// `name a`.
    Prefix,
}

/// A scalar function.
#[derive(Clone)]
pub struct ScalarFunction {
    /// Function name.
    pub name: &'static str,
    /// Accepted argument count.
    pub arity: Arity,
    /// Rendering style.
    pub display: FunctionDisplay,
    /// Bind callback.
    pub bind: ScalarBindFn,
    /// Execute callback.
    pub function: ScalarExecuteFn,
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A registered function.
#[derive(Debug, Clone)]
pub enum FunctionEntry {
    /// Row-preserving scalar function.
    Scalar(ScalarFunction),
    /// Grouping aggregate.
    Aggregate(AggregateFunction),
    /// Row-multiplying list expansion.
    Unnest,
}

/// Name-to-function lookup used by the binder.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionEntry>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in function.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        scalar::register(&mut registry);
        aggregate::register(&mut registry);
        registry.register("unnest", FunctionEntry::Unnest);
        registry.register("unlist", FunctionEntry::Unnest);
        registry
    }

    /// Registers a function under `name` (case-insensitive).
    pub fn register(&mut self, name: &str, entry: FunctionEntry) {
        self.functions.insert(name.to_lowercase(), entry);
    }

    /// Looks up a function by name (case-insensitive).
    pub fn lookup(&self, name: &str) -> StrataResult<&FunctionEntry> {
        self.functions
            .get(&name.to_lowercase())
            .ok_or_else(|| StrataError::FunctionNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Rejects nested types for functions that only work on scalars.
pub(crate) fn ensure_scalar_argument(function: &str, ty: &LogicalType) -> StrataResult<()> {
    if ty.is_nested() {
        return Err(StrataError::bind(format!(
            "function {function} does not support arguments of type {ty}"
        )));
    }
    Ok(())
}
