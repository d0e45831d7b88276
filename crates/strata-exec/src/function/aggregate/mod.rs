//! Aggregate functions and their per-group accumulators.

mod list;

use std::fmt;

use strata_common::{StrataError, StrataResult};

use super::{Arity, FunctionEntry, FunctionRegistry};
use crate::types::{LogicalType, Value};

use list::ListState;

/// Resolves the return type of an aggregate from its argument types.
pub type AggregateBindFn = fn(&[LogicalType]) -> StrataResult<LogicalType>;

/// The built-in aggregate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// Collect values into a LIST.
    List,
    /// Count non-NULL values.
    Count,
    /// Count rows.
    CountStar,
    /// Sum of non-NULL values.
    Sum,
    /// Minimum non-NULL value.
    Min,
    /// Maximum non-NULL value.
    Max,
}

/// An aggregate function.
#[derive(Clone)]
pub struct AggregateFunction {
    /// Function name.
    pub name: &'static str,
    /// Aggregate kind, selecting the accumulator.
    pub kind: AggregateKind,
    /// Accepted argument count.
    pub arity: Arity,
    /// Return type resolution.
    pub bind: AggregateBindFn,
}

impl fmt::Debug for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateFunction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let list = AggregateFunction {
        name: "list",
        kind: AggregateKind::List,
        arity: Arity::Exact(1),
        bind: list::bind,
    };
    registry.register("list", FunctionEntry::Aggregate(list.clone()));
    registry.register("array_agg", FunctionEntry::Aggregate(list));

    registry.register(
        "count",
        FunctionEntry::Aggregate(AggregateFunction {
            name: "count",
            kind: AggregateKind::Count,
            arity: Arity::Exact(1),
            bind: bind_count,
        }),
    );
    registry.register(
        "count_star",
        FunctionEntry::Aggregate(AggregateFunction {
            name: "count_star",
            kind: AggregateKind::CountStar,
            arity: Arity::Exact(0),
            bind: bind_count,
        }),
    );
    registry.register(
        "sum",
        FunctionEntry::Aggregate(AggregateFunction {
            name: "sum",
            kind: AggregateKind::Sum,
            arity: Arity::Exact(1),
            bind: bind_sum,
        }),
    );
    for (name, kind) in [("min", AggregateKind::Min), ("max", AggregateKind::Max)] {
        registry.register(
            name,
            FunctionEntry::Aggregate(AggregateFunction {
                name,
                kind,
                arity: Arity::Exact(1),
                bind: bind_min_max,
            }),
        );
    }
}

fn bind_count(_arguments: &[LogicalType]) -> StrataResult<LogicalType> {
    Ok(LogicalType::BigInt)
}

fn bind_sum(arguments: &[LogicalType]) -> StrataResult<LogicalType> {
    match &arguments[0] {
        LogicalType::Null | LogicalType::Integer | LogicalType::BigInt => Ok(LogicalType::BigInt),
        LogicalType::Double => Ok(LogicalType::Double),
        other => Err(StrataError::bind(format!(
            "No function matches the given name and argument types 'sum({other})'"
        ))),
    }
}

fn bind_min_max(arguments: &[LogicalType]) -> StrataResult<LogicalType> {
    Ok(arguments[0].clone())
}

#[derive(Debug, Clone)]
enum AccumulatorState {
    List(ListState),
    Count(i64),
    IntegerSum(Option<i64>),
    DoubleSum(Option<f64>),
    Min(Option<Value>),
    Max(Option<Value>),
}

/// Running state of one aggregate for one group.
#[derive(Debug, Clone)]
pub struct Accumulator {
    kind: AggregateKind,
    state: AccumulatorState,
}

impl Accumulator {
    /// Creates an accumulator for `kind` producing `return_type`.
    pub fn new(kind: AggregateKind, return_type: &LogicalType) -> Self {
        let state = match kind {
            AggregateKind::List => AccumulatorState::List(ListState::default()),
            AggregateKind::Count | AggregateKind::CountStar => AccumulatorState::Count(0),
            AggregateKind::Sum if *return_type == LogicalType::Double => {
                AccumulatorState::DoubleSum(None)
            }
            AggregateKind::Sum => AccumulatorState::IntegerSum(None),
            AggregateKind::Min => AccumulatorState::Min(None),
            AggregateKind::Max => AccumulatorState::Max(None),
        };
        Self { kind, state }
    }

    /// Accumulates one input value. `count_star` ignores the value.
    pub fn update(&mut self, value: &Value) -> StrataResult<()> {
        if let AccumulatorState::List(list) = &mut self.state {
            list.append(value);
            return Ok(());
        }
        if value.is_null() && self.kind != AggregateKind::CountStar {
            return Ok(());
        }

        match &mut self.state {
            AccumulatorState::List(_) => {}
            AccumulatorState::Count(count) => *count += 1,
            AccumulatorState::IntegerSum(sum) => {
                let v = value
                    .to_i64()
                    .ok_or_else(|| StrataError::type_mismatch("BIGINT", value.logical_type()))?;
                let next = sum
                    .unwrap_or(0)
                    .checked_add(v)
                    .ok_or_else(|| StrataError::conversion("Overflow in SUM"))?;
                *sum = Some(next);
            }
            AccumulatorState::DoubleSum(sum) => {
                let v = value
                    .to_f64()
                    .ok_or_else(|| StrataError::type_mismatch("DOUBLE", value.logical_type()))?;
                *sum = Some(sum.unwrap_or(0.0) + v);
            }
            AccumulatorState::Min(min) => {
                if min.as_ref().map_or(true, |m| value < m) {
                    *min = Some(value.clone());
                }
            }
            AccumulatorState::Max(max) => {
                if max.as_ref().map_or(true, |m| value > m) {
                    *max = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    /// Returns the final result.
    pub fn result(&self) -> Value {
        match &self.state {
            AccumulatorState::List(list) => list.finalize(),
            AccumulatorState::Count(count) => Value::BigInt(*count),
            AccumulatorState::IntegerSum(sum) => sum.map_or(Value::Null, Value::BigInt),
            AccumulatorState::DoubleSum(sum) => sum.map_or(Value::Null, Value::Double),
            AccumulatorState::Min(v) | AccumulatorState::Max(v) => v.clone().unwrap_or(Value::Null),
        }
    }

    /// Resets the accumulator.
    pub fn reset(&mut self) {
        match &mut self.state {
            AccumulatorState::List(list) => list.clear(),
            AccumulatorState::Count(count) => *count = 0,
            AccumulatorState::IntegerSum(sum) => *sum = None,
            AccumulatorState::DoubleSum(sum) => *sum = None,
            AccumulatorState::Min(v) | AccumulatorState::Max(v) => *v = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_keeps_nulls_in_order() {
        let ty = LogicalType::list(LogicalType::Integer);
        let mut acc = Accumulator::new(AggregateKind::List, &ty);
        for v in [Value::Integer(3), Value::Null, Value::Integer(1)] {
            acc.update(&v).unwrap();
        }
        assert_eq!(
            acc.result(),
            Value::list([Value::Integer(3), Value::Null, Value::Integer(1)])
        );

        acc.reset();
        assert_eq!(acc.result(), Value::list([]));
    }

    #[test]
    fn test_count_and_count_star() {
        let mut count = Accumulator::new(AggregateKind::Count, &LogicalType::BigInt);
        let mut star = Accumulator::new(AggregateKind::CountStar, &LogicalType::BigInt);
        for v in [Value::Integer(1), Value::Null] {
            count.update(&v).unwrap();
            star.update(&v).unwrap();
        }
        assert_eq!(count.result(), Value::BigInt(1));
        assert_eq!(star.result(), Value::BigInt(2));
    }

    #[test]
    fn test_sum() {
        let mut sum = Accumulator::new(AggregateKind::Sum, &LogicalType::BigInt);
        assert_eq!(sum.result(), Value::Null);
        sum.update(&Value::Integer(2)).unwrap();
        sum.update(&Value::BigInt(40)).unwrap();
        assert_eq!(sum.result(), Value::BigInt(42));

        sum.update(&Value::BigInt(i64::MAX)).unwrap_err();

        let mut sum = Accumulator::new(AggregateKind::Sum, &LogicalType::Double);
        sum.update(&Value::Double(0.5)).unwrap();
        sum.update(&Value::Double(0.25)).unwrap();
        assert_eq!(sum.result(), Value::Double(0.75));
    }

    #[test]
    fn test_min_max() {
        let mut min = Accumulator::new(AggregateKind::Min, &LogicalType::Varchar);
        let mut max = Accumulator::new(AggregateKind::Max, &LogicalType::Varchar);
        for v in [Value::varchar("b"), Value::Null, Value::varchar("a"), Value::varchar("c")] {
            min.update(&v).unwrap();
            max.update(&v).unwrap();
        }
        assert_eq!(min.result(), Value::varchar("a"));
        assert_eq!(max.result(), Value::varchar("c"));
    }

    #[test]
    fn test_sum_rejects_varchar() {
        assert!(bind_sum(&[LogicalType::Varchar]).is_err());
        assert_eq!(bind_sum(&[LogicalType::Integer]).unwrap(), LogicalType::BigInt);
    }
}
