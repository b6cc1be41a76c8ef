//! Recalculation driver over a caller-owned cell store.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sheetcalc_common::{CellKey, ErrorKind, FormulaValue};
use sheetcalc_parse::{ASTNode, ParserError, parse_formula};

use super::cache::FormulaCache;
use super::graph::{CellState, DependencyGraph};
use super::scheduler::RecalcOrder;
use super::EvalConfig;
use crate::function::FnCaps;
use crate::function_registry::FunctionRegistry;
use crate::interpreter::Interpreter;
use crate::traits::{EvaluationContext, system_now};

/// What the store holds for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    pub value: FormulaValue,
    /// Formula text, when the cell holds one.
    pub formula: Option<String>,
}

/// The document side of recalculation. The engine borrows it for a single
/// call and never keeps it.
pub trait CellStore {
    fn get_cell(&self, key: &CellKey) -> Option<CellSnapshot>;

    /// Store a formula's freshly computed value.
    fn set_computed_value(&mut self, key: &CellKey, value: FormulaValue);

    /// Store a constant entered through the engine; any formula text held
    /// for `key` is dropped.
    fn set_input(&mut self, key: &CellKey, value: FormulaValue);

    /// Store formula text entered through the engine.
    fn set_formula_text(&mut self, key: &CellKey, text: &str);

    fn resolve_name(&self, _name: &str) -> Option<FormulaValue> {
        None
    }

    fn now(&self) -> Option<NaiveDateTime> {
        system_now()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The text is not a formula; the cell keeps its previous content.
    #[error("formula cannot be entered: {0}")]
    Parse(#[from] ParserError),
}

/// Read-only view of a store for the interpreter.
struct StoreContext<'s> {
    store: &'s dyn CellStore,
}

impl EvaluationContext for StoreContext<'_> {
    fn read_cell(&self, sheet: Option<&str>, row: u32, col: u32) -> FormulaValue {
        let Some(sheet) = sheet else {
            return FormulaValue::Null;
        };
        self.store
            .get_cell(&CellKey::new(sheet, row, col))
            .map_or(FormulaValue::Null, |c| c.value)
    }

    fn resolve_name(&self, name: &str) -> Option<FormulaValue> {
        self.store.resolve_name(name)
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.store.now()
    }
}

/// Owns everything that persists between edits: the function registry,
/// the dependency graph, and the parsed formulas.
pub struct Engine {
    registry: FunctionRegistry,
    graph: DependencyGraph,
    cache: FormulaCache,
    config: EvalConfig,
    epoch: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with every builtin function.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::with_builtins())
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self {
            registry,
            graph: DependencyGraph::new(),
            cache: FormulaCache::default(),
            config: EvalConfig::default(),
            epoch: 0,
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Register a formula without evaluating anything. Use for bulk loads
    /// followed by [`recalculate_all`](Self::recalculate_all).
    pub fn load_formula(&mut self, key: &CellKey, text: &str) -> Result<(), EngineError> {
        let ast = self.cache.parse(text)?;
        let volatile = ast.function_names().into_iter().any(|name| {
            self.registry
                .get(name)
                .is_some_and(|f| f.caps().contains(FnCaps::VOLATILE))
        });
        self.graph.set_formula(key, &ast);
        self.graph.set_volatile(key, volatile);
        self.cache.insert(key.clone(), ast);
        Ok(())
    }

    /// Enter a formula and recalculate. Returns the cells whose value
    /// changed. Text that does not parse leaves the cell untouched.
    pub fn set_formula(
        &mut self,
        store: &mut dyn CellStore,
        key: &CellKey,
        text: &str,
    ) -> Result<Vec<CellKey>, EngineError> {
        self.load_formula(key, text)?;
        store.set_formula_text(key, text);
        Ok(self.recalc_from(store, key))
    }

    /// Enter a constant, dropping any formula, and recalculate dependents.
    pub fn set_value(
        &mut self,
        store: &mut dyn CellStore,
        key: &CellKey,
        value: FormulaValue,
    ) -> Vec<CellKey> {
        self.forget_formula(key);
        let before = store.get_cell(key).map_or(FormulaValue::Null, |c| c.value);
        let differs = before != value;
        store.set_input(key, value);
        let mut changed = self.recalc_from(store, key);
        if differs {
            changed.insert(0, key.clone());
        }
        changed
    }

    pub fn clear_cell(&mut self, store: &mut dyn CellStore, key: &CellKey) -> Vec<CellKey> {
        self.set_value(store, key, FormulaValue::Null)
    }

    /// Recalculate `key` and everything downstream of it. A formula the
    /// store holds but the engine has not seen is loaded first.
    pub fn recalculate(
        &mut self,
        store: &mut dyn CellStore,
        key: &CellKey,
    ) -> Result<Vec<CellKey>, EngineError> {
        if !self.graph.has_formula(key) {
            if let Some(text) = store.get_cell(key).and_then(|c| c.formula) {
                self.load_formula(key, &text)?;
            }
        }
        Ok(self.recalc_from(store, key))
    }

    /// Recalculate every formula cell.
    pub fn recalculate_all(&mut self, store: &mut dyn CellStore) -> Vec<CellKey> {
        let plan = self.graph.full_order();
        self.run(store, plan)
    }

    /// Evaluate formula text against the store without entering it anywhere.
    pub fn evaluate_formula(
        &self,
        store: &dyn CellStore,
        sheet: &str,
        text: &str,
    ) -> Result<FormulaValue, EngineError> {
        let ast = parse_formula(text, true)?;
        let ctx = StoreContext { store };
        Ok(Interpreter::new(&ctx, &self.registry)
            .with_config(self.config.clone())
            .with_sheet(sheet)
            .with_epoch(self.epoch)
            .evaluate(&ast))
    }

    /// The parsed formula held for `key`.
    pub fn formula(&self, key: &CellKey) -> Option<Arc<ASTNode>> {
        self.cache.get(key)
    }

    /* ─── internals ─── */

    fn forget_formula(&mut self, key: &CellKey) {
        self.graph.remove_formula(key);
        self.cache.remove(key);
    }

    /// `key`'s closure plus every volatile cell and its dependents.
    fn recalc_from(&mut self, store: &mut dyn CellStore, key: &CellKey) -> Vec<CellKey> {
        let mut roots = vec![key.clone()];
        roots.extend(self.graph.volatile_cells());
        let plan = self.graph.recalc_order_many(&roots);
        self.run(store, plan)
    }

    /// One pass: cycle members become `#CIRC!` first so that cells
    /// downstream of a cycle read the error, then the acyclic order runs.
    fn run(&mut self, store: &mut dyn CellStore, plan: RecalcOrder) -> Vec<CellKey> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "recalculate",
            cells = plan.order.len(),
            cycles = plan.cycles.len(),
            epoch = self.epoch
        )
        .entered();

        for key in &plan.order {
            if self.graph.has_formula(key) {
                self.graph.set_state(key, CellState::Dirty);
            }
        }

        let mut changed = Vec::new();
        for key in plan.cycles.iter().flatten() {
            self.graph.set_state(key, CellState::Errored);
            write(store, key, FormulaValue::Error(ErrorKind::Circ), &mut changed);
        }

        for key in &plan.order {
            let Some(ast) = self.cache.get(key) else {
                continue;
            };
            self.graph.set_state(key, CellState::Evaluating);
            let value = self.evaluate_cell(&*store, key, &ast);
            let state = if value.is_error() {
                CellState::Errored
            } else {
                CellState::Clean
            };
            self.graph.set_state(key, state);
            write(store, key, value, &mut changed);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(changed = changed.len(), "pass finished");

        self.epoch = self.epoch.wrapping_add(1);
        changed
    }

    fn evaluate_cell(&self, store: &dyn CellStore, key: &CellKey, ast: &ASTNode) -> FormulaValue {
        let ctx = StoreContext { store };
        Interpreter::new(&ctx, &self.registry)
            .with_config(self.config.clone())
            .with_sheet(&key.sheet)
            .with_cell(key.row, key.col)
            .with_epoch(self.epoch)
            .evaluate(ast)
    }
}

fn write(store: &mut dyn CellStore, key: &CellKey, value: FormulaValue, changed: &mut Vec<CellKey>) {
    if store.get_cell(key).map(|c| c.value).as_ref() != Some(&value) {
        changed.push(key.clone());
    }
    store.set_computed_value(key, value);
}
