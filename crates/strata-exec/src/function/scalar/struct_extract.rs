//! `struct_extract(struct, 'key')`: returns one field of a STRUCT.
//!
//! The key is resolved to a field index at bind time and removed from the
//! argument list; at run time the field vector is returned as a reference
//! to the struct's child, so no data is copied.

use std::any::Any;
use std::sync::Arc;

use strata_common::{StrataError, StrataResult};

use crate::chunk::DataChunk;
use crate::executor::ExpressionExecutor;
use crate::expression::BoundFunctionExpression;
use crate::function::{Arity, FunctionData, FunctionDisplay, ScalarFunction};
use crate::types::{LogicalType, Value};
use crate::vector::Vector;

/// Field resolved by binding `struct_extract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructExtractBindData {
    /// Lower-cased field name.
    pub key: String,
    /// Position of the field in the struct.
    pub index: usize,
    /// Type of the field.
    pub return_type: LogicalType,
}

impl FunctionData for StructExtractBindData {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The `struct_extract` function.
pub fn struct_extract_function() -> ScalarFunction {
    ScalarFunction {
        name: "struct_extract",
        arity: Arity::Exact(2),
        display: FunctionDisplay::Call,
        bind,
        function: execute,
    }
}

fn bind(expr: &mut BoundFunctionExpression) -> StrataResult<()> {
    if expr.children.len() != 2 {
        return Err(StrataError::bind("struct_extract expects exactly two arguments"));
    }

    let fields = match expr.children[0].return_type() {
        LogicalType::Struct(fields) => fields.clone(),
        other => {
            return Err(StrataError::bind(format!(
                "struct_extract can only be applied to a STRUCT, not {other}"
            )))
        }
    };
    if fields.is_empty() {
        return Err(StrataError::bind("Can't extract something from an empty struct"));
    }

    let key_child = &expr.children[1];
    if *key_child.return_type() != LogicalType::Varchar || !key_child.is_foldable() {
        return Err(StrataError::bind(
            "Key name for struct_extract needs to be a constant string",
        ));
    }
    let key = match ExpressionExecutor::evaluate_constant(key_child)? {
        Value::Varchar(s) if !s.is_empty() => s.to_lowercase(),
        _ => {
            return Err(StrataError::bind(
                "Key name for struct_extract needs to be neither NULL nor empty",
            ))
        }
    };

    let (index, return_type) = fields
        .iter()
        .enumerate()
        .find(|(_, (name, _))| name.to_lowercase() == key)
        .map(|(i, (_, ty))| (i, ty.clone()))
        .ok_or_else(|| StrataError::bind(format!("Could not find key \"{key}\" in struct")))?;

    expr.return_type = return_type.clone();
    expr.bind_info = Some(Arc::new(StructExtractBindData {
        key,
        index,
        return_type,
    }));
    expr.children.pop();
    Ok(())
}

fn execute(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    let info = expr
        .bind_data::<StructExtractBindData>()
        .ok_or_else(|| StrataError::internal("struct_extract executed without bind data"))?;
    let input = args
        .column(0)
        .ok_or_else(|| StrataError::internal("struct_extract executed without input"))?;

    let children = input.get_children()?;
    let (name, child) = children
        .get(info.index)
        .ok_or(StrataError::NotEnoughElements {
            requested: info.index,
            available: children.len(),
        })?;
    if name.to_lowercase() != info.key || *child.logical_type() != info.return_type {
        return Err(StrataError::type_mismatch(
            format!("{} {}", info.key, info.return_type),
            format!("{name} {}", child.logical_type()),
        ));
    }
    Ok(child.clone())
}
