//! The `list` aggregate: collects every input value of a group into a LIST.

use strata_common::StrataResult;

use crate::types::{LogicalType, Value};

/// `list(x) -> LIST<type of x>`.
pub(super) fn bind(arguments: &[LogicalType]) -> StrataResult<LogicalType> {
    Ok(LogicalType::list(arguments[0].clone()))
}

/// Per-group state. NULL inputs are kept as NULL elements, so a group
/// whose inputs are all NULL produces `[NULL, ...]` and a group that saw
/// no rows produces `[]`. The result itself is never NULL.
#[derive(Debug, Clone, Default)]
pub(super) struct ListState {
    elements: Vec<Value>,
}

impl ListState {
    pub(super) fn append(&mut self, value: &Value) {
        self.elements.push(value.clone());
    }

    pub(super) fn finalize(&self) -> Value {
        Value::List(self.elements.clone())
    }

    pub(super) fn clear(&mut self) {
        self.elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_inputs_become_elements() {
        let mut state = ListState::default();
        state.append(&Value::Null);
        assert_eq!(state.finalize(), Value::list([Value::Null]));
    }

    #[test]
    fn test_empty_group_is_empty_list() {
        let state = ListState::default();
        assert_eq!(state.finalize(), Value::list([]));
    }

    #[test]
    fn test_bind_wraps_argument_type() {
        let ty = LogicalType::struct_of([("a", LogicalType::Integer)]);
        assert_eq!(bind(&[ty.clone()]).unwrap(), LogicalType::list(ty));
    }
}
