//! The builtin function library, one module per domain.

pub mod array;
pub mod criteria;
pub mod datetime;
pub mod financial;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod query;
pub mod random;
pub mod regex_fns;
pub mod stats;
pub mod text;
mod utils;

use crate::function_registry::FunctionRegistryBuilder;

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    logical::register_builtins(b);
    math::register_builtins(b);
    stats::register_builtins(b);
    text::register_builtins(b);
    datetime::register_builtins(b);
    lookup::register_builtins(b);
    financial::register_builtins(b);
    info::register_builtins(b);
    array::register_builtins(b);
    regex_fns::register_builtins(b);
    query::register_builtins(b);
    random::register_builtins(b);
}
