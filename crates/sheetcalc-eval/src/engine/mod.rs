//! Dependency graph engine
//!
//! Incremental recalculation over a caller-owned cell store: parsed-formula
//! caching, precedent/dependent tracking, cycle detection, and ordered
//! evaluation.

pub mod cache;
pub mod eval;
pub mod graph;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use cache::FormulaCache;
pub use eval::{CellSnapshot, CellStore, Engine, EngineError};
pub use graph::{CellState, DependencyGraph, NodeId};
pub use scheduler::{RecalcOrder, Scheduler};

/// Configuration for evaluation and recalculation.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Deepest expression nesting evaluated before yielding `#VALUE!`.
    pub max_depth: usize,
    /// Seed for `RAND()`/`RANDBETWEEN()`. Mixed with the recalculation
    /// epoch and the evaluating cell.
    pub random_seed: u64,
    /// Largest range (in cells) a single reference may materialise;
    /// bigger ranges evaluate to `#REF!`.
    pub max_range_cells: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            random_seed: 0x5eed_ca1c,
            max_range_cells: 4_000_000,
        }
    }
}
