//! Formula evaluation for sheetcalc: the interpreter, the builtin function
//! library, and the dependency-graph recalculation engine.

pub mod args;
pub mod builtins;
pub mod coercion;
pub mod engine;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod traits;

#[cfg(test)]
mod test_workbook;
#[cfg(test)]
mod tests;

pub use args::ArgumentHandle;
pub use engine::{
    CellSnapshot, CellState, CellStore, DependencyGraph, Engine, EngineError, EvalConfig,
    FormulaCache, NodeId, RecalcOrder, Scheduler,
};
pub use function::{Builtin, FnCaps, FnResult, Function};
pub use function_registry::{FunctionRegistry, FunctionRegistryBuilder};
pub use interpreter::Interpreter;
pub use traits::{EvaluationContext, FunctionContext, system_now};
