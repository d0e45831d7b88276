//! Built-in scalar functions.

mod operators;
mod struct_extract;
mod struct_pack;

pub use operators::operator_functions;
pub use struct_extract::{struct_extract_function, StructExtractBindData};
pub use struct_pack::{struct_pack_function, StructPackBindData};

use super::{FunctionEntry, FunctionRegistry};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("struct_extract", FunctionEntry::Scalar(struct_extract_function()));
    registry.register("struct_pack", FunctionEntry::Scalar(struct_pack_function()));
    for function in operator_functions() {
        registry.register(function.name, FunctionEntry::Scalar(function));
    }
}
