//! Arithmetic, comparison and boolean operators.

use std::cmp::Ordering;

use strata_common::{StrataError, StrataResult};

use crate::chunk::DataChunk;
use crate::expression::BoundFunctionExpression;
use crate::function::{
    ensure_scalar_argument, Arity, FunctionDisplay, ScalarBindFn, ScalarExecuteFn, ScalarFunction,
};
use crate::types::{LogicalType, Value};
use crate::vector::{Vector, VectorBuilder};

fn operator(
    name: &'static str,
    arity: usize,
    bind: ScalarBindFn,
    function: ScalarExecuteFn,
) -> ScalarFunction {
    ScalarFunction {
        name,
        arity: Arity::Exact(arity),
        display: if arity == 1 {
            FunctionDisplay::Prefix
        } else {
            FunctionDisplay::Infix
        },
        bind,
        function,
    }
}

/// Returns every operator function.
pub fn operator_functions() -> Vec<ScalarFunction> {
    vec![
        operator("+", 2, bind_arithmetic, execute_add),
        operator("-", 2, bind_arithmetic, execute_subtract),
        operator("*", 2, bind_arithmetic, execute_multiply),
        operator("/", 2, bind_arithmetic, execute_divide),
        operator("%", 2, bind_arithmetic, execute_modulo),
        operator("=", 2, bind_comparison, execute_equal),
        operator("<>", 2, bind_comparison, execute_not_equal),
        operator("<", 2, bind_comparison, execute_less),
        operator("<=", 2, bind_comparison, execute_less_equal),
        operator(">", 2, bind_comparison, execute_greater),
        operator(">=", 2, bind_comparison, execute_greater_equal),
        operator("and", 2, bind_boolean, execute_and),
        operator("or", 2, bind_boolean, execute_or),
        operator("not", 1, bind_boolean, execute_not),
    ]
}

fn no_match(expr: &BoundFunctionExpression) -> StrataError {
    let args: Vec<String> = expr.arguments.iter().map(ToString::to_string).collect();
    StrataError::bind(format!(
        "No function matches the given name and argument types '{}({})'",
        expr.function.name,
        args.join(", ")
    ))
}

fn bind_arithmetic(expr: &mut BoundFunctionExpression) -> StrataResult<()> {
    let (left, right) = (&expr.arguments[0], &expr.arguments[1]);
    let numeric = |t: &LogicalType| t.is_numeric() || *t == LogicalType::Null;
    if !numeric(left) || !numeric(right) {
        return Err(no_match(expr));
    }
    expr.return_type = match LogicalType::max_type(left, right) {
        Some(LogicalType::Null) | None => LogicalType::Integer,
        Some(ty) => ty,
    };
    Ok(())
}

fn bind_comparison(expr: &mut BoundFunctionExpression) -> StrataResult<()> {
    for ty in &expr.arguments {
        ensure_scalar_argument(expr.function.name, ty)?;
    }
    if LogicalType::max_type(&expr.arguments[0], &expr.arguments[1]).is_none() {
        return Err(no_match(expr));
    }
    expr.return_type = LogicalType::Boolean;
    Ok(())
}

fn bind_boolean(expr: &mut BoundFunctionExpression) -> StrataResult<()> {
    if expr
        .arguments
        .iter()
        .any(|t| !matches!(t, LogicalType::Boolean | LogicalType::Null))
    {
        return Err(no_match(expr));
    }
    expr.return_type = LogicalType::Boolean;
    Ok(())
}

fn binary_map<F>(args: &DataChunk, return_type: &LogicalType, mut op: F) -> StrataResult<Vector>
where
    F: FnMut(&Value, &Value) -> StrataResult<Value>,
{
    let (left, right) = match (args.column(0), args.column(1)) {
        (Some(l), Some(r)) => (l, r),
        _ => return Err(StrataError::internal("binary operator expects two arguments")),
    };
    let mut builder = VectorBuilder::with_capacity(return_type, args.size());
    for row in 0..args.size() {
        let (a, b) = (left.value(row), right.value(row));
        if a.is_null() || b.is_null() {
            builder.push_null();
        } else {
            builder.push(&op(&a, &b)?)?;
        }
    }
    Ok(builder.finish())
}

fn arithmetic(
    args: &DataChunk,
    expr: &BoundFunctionExpression,
    integer: fn(i64, i64) -> Option<Option<i64>>,
    double: fn(f64, f64) -> Option<f64>,
    label: &'static str,
) -> StrataResult<Vector> {
    let return_type = &expr.return_type;
    binary_map(args, return_type, |a, b| {
        if *return_type == LogicalType::Double {
            let (x, y) = (a.to_f64().unwrap_or_default(), b.to_f64().unwrap_or_default());
            return Ok(double(x, y).map_or(Value::Null, Value::Double));
        }
        let (x, y) = (a.to_i64().unwrap_or_default(), b.to_i64().unwrap_or_default());
        let result = match integer(x, y) {
            None => return Err(StrataError::conversion(format!("Overflow in {label}"))),
            Some(None) => return Ok(Value::Null),
            Some(Some(v)) => v,
        };
        if *return_type == LogicalType::Integer {
            i32::try_from(result)
                .map(Value::Integer)
                .map_err(|_| StrataError::conversion(format!("Overflow in {label}")))
        } else {
            Ok(Value::BigInt(result))
        }
    })
}

fn execute_add(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    arithmetic(args, expr, |a, b| a.checked_add(b).map(Some), |a, b| Some(a + b), "addition")
}

fn execute_subtract(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    arithmetic(args, expr, |a, b| a.checked_sub(b).map(Some), |a, b| Some(a - b), "subtraction")
}

fn execute_multiply(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    arithmetic(args, expr, |a, b| a.checked_mul(b).map(Some), |a, b| Some(a * b), "multiplication")
}

// Division and modulo by zero produce NULL.
fn execute_divide(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    arithmetic(
        args,
        expr,
        |a, b| if b == 0 { Some(None) } else { a.checked_div(b).map(Some) },
        |a, b| if b == 0.0 { None } else { Some(a / b) },
        "division",
    )
}

fn execute_modulo(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    arithmetic(
        args,
        expr,
        |a, b| if b == 0 { Some(None) } else { a.checked_rem(b).map(Some) },
        |a, b| if b == 0.0 { None } else { Some(a % b) },
        "modulo",
    )
}

fn comparison(args: &DataChunk, accept: fn(Ordering) -> bool) -> StrataResult<Vector> {
    binary_map(args, &LogicalType::Boolean, |a, b| Ok(Value::Boolean(accept(a.cmp(b)))))
}

fn execute_equal(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_eq)
}

fn execute_not_equal(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_ne)
}

fn execute_less(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_lt)
}

fn execute_less_equal(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_le)
}

fn execute_greater(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_gt)
}

fn execute_greater_equal(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    comparison(args, Ordering::is_ge)
}

/// Three-valued AND/OR: a NULL operand only matters when the other
/// operand does not decide the result.
fn logical(args: &DataChunk, is_and: bool) -> StrataResult<Vector> {
    let (left, right) = match (args.column(0), args.column(1)) {
        (Some(l), Some(r)) => (l, r),
        _ => return Err(StrataError::internal("boolean operator expects two arguments")),
    };
    let mut builder = VectorBuilder::with_capacity(&LogicalType::Boolean, args.size());
    for row in 0..args.size() {
        let a = left.value(row).to_bool();
        let b = right.value(row).to_bool();
        let result = match (a, b) {
            (Some(x), Some(y)) => Some(if is_and { x && y } else { x || y }),
            (Some(x), None) | (None, Some(x)) if x != is_and => Some(x),
            _ => None,
        };
        builder.push(&result.into())?;
    }
    Ok(builder.finish())
}

fn execute_and(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    logical(args, true)
}

fn execute_or(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    logical(args, false)
}

fn execute_not(args: &DataChunk, _: &BoundFunctionExpression) -> StrataResult<Vector> {
    let input = args
        .column(0)
        .ok_or_else(|| StrataError::internal("NOT expects one argument"))?;
    let mut builder = VectorBuilder::with_capacity(&LogicalType::Boolean, args.size());
    for row in 0..args.size() {
        builder.push(&input.value(row).to_bool().map(|b| !b).into())?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BoundExpression;

    fn find(name: &str) -> ScalarFunction {
        operator_functions()
            .into_iter()
            .find(|f| f.name == name)
            .unwrap()
    }

    fn run(name: &str, types: [LogicalType; 2], rows: &[[Value; 2]]) -> StrataResult<Vec<Value>> {
        let children = vec![
            BoundExpression::column("a", 0, types[0].clone()),
            BoundExpression::column("b", 1, types[1].clone()),
        ];
        let function = find(name);
        let mut expr = BoundFunctionExpression::new(function.clone(), children);
        (function.bind)(&mut expr)?;
        let rows: Vec<Vec<Value>> = rows.iter().map(|r| r.to_vec()).collect();
        let chunk = DataChunk::from_rows(&types, &rows)?;
        Ok((function.function)(&chunk, &expr)?.values())
    }

    #[test]
    fn test_integer_arithmetic() {
        let ints = [LogicalType::Integer, LogicalType::Integer];
        let out = run(
            "+",
            ints.clone(),
            &[[1.into(), 2.into()], [Value::Null, 2.into()]],
        )
        .unwrap();
        assert_eq!(out, vec![Value::Integer(3), Value::Null]);

        let out = run("/", ints.clone(), &[[7.into(), 2.into()], [1.into(), 0.into()]]).unwrap();
        assert_eq!(out, vec![Value::Integer(3), Value::Null]);

        assert!(run("*", ints, &[[i32::MAX.into(), 2.into()]]).is_err());
    }

    #[test]
    fn test_mixed_arithmetic_widens() {
        let out = run(
            "/",
            [LogicalType::Integer, LogicalType::Double],
            &[[5.into(), 2.0.into()]],
        )
        .unwrap();
        assert_eq!(out, vec![Value::Double(2.5)]);
    }

    #[test]
    fn test_comparison() {
        let out = run(
            ">",
            [LogicalType::Integer, LogicalType::BigInt],
            &[[3.into(), 2i64.into()], [1.into(), Value::Null]],
        )
        .unwrap();
        assert_eq!(out, vec![Value::Boolean(true), Value::Null]);
    }

    #[test]
    fn test_bind_rejects_incompatible_types() {
        assert!(run("+", [LogicalType::Varchar, LogicalType::Integer], &[]).is_err());
        assert!(run(
            "=",
            [LogicalType::list(LogicalType::Integer), LogicalType::list(LogicalType::Integer)],
            &[]
        )
        .is_err());
        assert!(run("=", [LogicalType::Varchar, LogicalType::Integer], &[]).is_err());
    }

    #[test]
    fn test_three_valued_logic() {
        let bools = [LogicalType::Boolean, LogicalType::Boolean];
        let rows = [
            [Value::Boolean(false), Value::Null],
            [Value::Boolean(true), Value::Null],
        ];
        assert_eq!(
            run("and", bools.clone(), &rows).unwrap(),
            vec![Value::Boolean(false), Value::Null]
        );
        assert_eq!(
            run("or", bools, &rows).unwrap(),
            vec![Value::Null, Value::Boolean(true)]
        );
    }
}
