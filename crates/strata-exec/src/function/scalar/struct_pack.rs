//! `struct_pack(name := value, ...)`: assembles a STRUCT from its arguments.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use strata_common::{StrataError, StrataResult};

use crate::chunk::DataChunk;
use crate::expression::{BoundExpression, BoundFunctionExpression};
use crate::function::{Arity, FunctionData, FunctionDisplay, ScalarFunction};
use crate::types::LogicalType;
use crate::vector::Vector;

/// Field names resolved by binding `struct_pack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructPackBindData {
    /// Field names in argument order.
    pub names: Vec<String>,
}

impl FunctionData for StructPackBindData {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The `struct_pack` function.
pub fn struct_pack_function() -> ScalarFunction {
    ScalarFunction {
        name: "struct_pack",
        arity: Arity::AtLeast(1),
        display: FunctionDisplay::Call,
        bind,
        function: execute,
    }
}

fn bind(expr: &mut BoundFunctionExpression) -> StrataResult<()> {
    if expr.children.is_empty() {
        return Err(StrataError::bind("Can't pack nothing into a struct"));
    }

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(expr.children.len());
    for child in &expr.children {
        let name = match child {
            BoundExpression::Alias { name, .. } | BoundExpression::ColumnRef { name, .. } => name.clone(),
            _ => {
                return Err(StrataError::bind(
                    "Need named argument for struct pack, e.g. STRUCT_PACK(a := b)",
                ))
            }
        };
        if !seen.insert(name.to_lowercase()) {
            return Err(StrataError::bind(format!("Duplicate struct entry name \"{name}\"")));
        }
        fields.push((name, child.return_type().clone()));
    }

    expr.bind_info = Some(Arc::new(StructPackBindData {
        names: fields.iter().map(|(n, _)| n.clone()).collect(),
    }));
    expr.return_type = LogicalType::Struct(fields);
    Ok(())
}

fn execute(args: &DataChunk, expr: &BoundFunctionExpression) -> StrataResult<Vector> {
    let info = expr
        .bind_data::<StructPackBindData>()
        .ok_or_else(|| StrataError::internal("struct_pack executed without bind data"))?;
    if info.names.len() != args.column_count() {
        return Err(StrataError::internal(format!(
            "struct_pack bound {} fields but received {} arguments",
            info.names.len(),
            args.column_count()
        )));
    }
    let children = info
        .names
        .iter()
        .cloned()
        .zip(args.columns().iter().cloned())
        .collect();
    Vector::struct_from_children(children, args.size())
}
