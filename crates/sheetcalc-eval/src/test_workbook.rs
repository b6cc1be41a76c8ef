//! In-memory workbook for unit tests: an [`EvaluationContext`] for
//! evaluating single formulas and a [`CellStore`] for driving the engine.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use sheetcalc_common::reference::parse_a1;
use sheetcalc_common::{CellKey, FormulaValue};
use sheetcalc_parse::parse_formula;

use crate::engine::{CellSnapshot, CellStore};
use crate::function_registry::FunctionRegistry;
use crate::interpreter::Interpreter;
use crate::traits::EvaluationContext;

pub const SHEET: &str = "Sheet1";

pub struct TestWorkbook {
    cells: FxHashMap<CellKey, CellSnapshot>,
    names: FxHashMap<String, FormulaValue>,
    now: Option<NaiveDateTime>,
    registry: FunctionRegistry,
}

impl Default for TestWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

/// `"B3"` on [`SHEET`].
pub fn key(a1: &str) -> CellKey {
    key_on(SHEET, a1)
}

pub fn key_on(sheet: &str, a1: &str) -> CellKey {
    let a = parse_a1(a1).expect("bad A1 reference in test");
    CellKey::new(sheet, a.row, a.col)
}

impl TestWorkbook {
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            names: FxHashMap::default(),
            now: None,
            registry: FunctionRegistry::with_builtins(),
        }
    }

    /* ─────────────── builders ─────────────── */

    pub fn with_cell(self, a1: &str, v: impl Into<FormulaValue>) -> Self {
        self.with_cell_on(SHEET, a1, v)
    }

    pub fn with_cell_on(mut self, sheet: &str, a1: &str, v: impl Into<FormulaValue>) -> Self {
        self.cells.insert(
            key_on(sheet, a1),
            CellSnapshot {
                value: v.into(),
                formula: None,
            },
        );
        self
    }

    /// Formula text with no computed value yet.
    pub fn with_formula(mut self, a1: &str, text: &str) -> Self {
        self.cells.insert(
            key(a1),
            CellSnapshot {
                value: FormulaValue::Null,
                formula: Some(text.to_string()),
            },
        );
        self
    }

    pub fn with_name(mut self, name: &str, v: impl Into<FormulaValue>) -> Self {
        self.names.insert(name.to_ascii_uppercase(), v.into());
        self
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /* ─────────────── evaluation ─────────────── */

    /// Evaluate `formula` on [`SHEET`] with no current cell.
    pub fn eval(&self, formula: &str) -> FormulaValue {
        let ast = parse_formula(formula, true).expect("formula should parse");
        Interpreter::new(self, &self.registry)
            .with_sheet(SHEET)
            .evaluate(&ast)
    }

    /// Evaluate `formula` as if entered in cell `a1`.
    pub fn eval_at(&self, a1: &str, formula: &str) -> FormulaValue {
        let at = key(a1);
        let ast = parse_formula(formula, true).expect("formula should parse");
        Interpreter::new(self, &self.registry)
            .with_sheet(SHEET)
            .with_cell(at.row, at.col)
            .evaluate(&ast)
    }

    /// Stored value of `a1` on [`SHEET`]; blank when absent.
    pub fn value(&self, a1: &str) -> FormulaValue {
        self.cells
            .get(&key(a1))
            .map_or(FormulaValue::Null, |c| c.value.clone())
    }

    pub fn formula_text(&self, a1: &str) -> Option<String> {
        self.cells.get(&key(a1)).and_then(|c| c.formula.clone())
    }
}

impl EvaluationContext for TestWorkbook {
    fn read_cell(&self, sheet: Option<&str>, row: u32, col: u32) -> FormulaValue {
        self.cells
            .get(&CellKey::new(sheet.unwrap_or(SHEET), row, col))
            .map_or(FormulaValue::Null, |c| c.value.clone())
    }

    fn resolve_name(&self, name: &str) -> Option<FormulaValue> {
        self.names.get(&name.to_ascii_uppercase()).cloned()
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.now
    }
}

impl CellStore for TestWorkbook {
    fn get_cell(&self, key: &CellKey) -> Option<CellSnapshot> {
        self.cells.get(key).cloned()
    }

    fn set_computed_value(&mut self, key: &CellKey, value: FormulaValue) {
        match self.cells.get_mut(key) {
            Some(cell) => cell.value = value,
            None => {
                self.cells.insert(
                    key.clone(),
                    CellSnapshot {
                        value,
                        formula: None,
                    },
                );
            }
        }
    }

    fn set_input(&mut self, key: &CellKey, value: FormulaValue) {
        self.cells.insert(
            key.clone(),
            CellSnapshot {
                value,
                formula: None,
            },
        );
    }

    fn set_formula_text(&mut self, key: &CellKey, text: &str) {
        self.cells
            .entry(key.clone())
            .or_insert(CellSnapshot {
                value: FormulaValue::Null,
                formula: None,
            })
            .formula = Some(text.to_string());
    }

    fn resolve_name(&self, name: &str) -> Option<FormulaValue> {
        EvaluationContext::resolve_name(self, name)
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.now
    }
}
