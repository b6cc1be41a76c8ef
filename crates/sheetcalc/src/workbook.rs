use sheetcalc_common::reference::parse_a1;
use sheetcalc_common::{CellKey, FormulaValue, ReferenceError};
use sheetcalc_eval::{Engine, EngineError, EvalConfig};

use crate::store::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("invalid cell address: {0}")]
    Address(#[from] ReferenceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// An [`Engine`] paired with a [`MemoryStore`], addressed by sheet name and
/// A1 text.
///
/// ```rust
/// # use sheetcalc::{Workbook, FormulaValue};
/// let mut wb = Workbook::new();
/// wb.set_value("Sheet1", "A1", 20.0)?;
/// wb.set_formula("Sheet1", "B1", "=A1*2")?;
/// assert_eq!(wb.value("Sheet1", "B1")?, FormulaValue::Number(40.0));
/// # Ok::<(), sheetcalc::WorkbookError>(())
/// ```
#[derive(Default)]
pub struct Workbook {
    engine: Engine,
    store: MemoryStore,
}

fn cell(sheet: &str, a1: &str) -> Result<CellKey, WorkbookError> {
    let at = parse_a1(a1)?;
    Ok(CellKey::new(sheet, at.row, at.col))
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            engine: Engine::new().with_config(config),
            store: MemoryStore::new(),
        }
    }

    /// Enter a constant. Returns the cells whose value changed.
    pub fn set_value(
        &mut self,
        sheet: &str,
        a1: &str,
        value: impl Into<FormulaValue>,
    ) -> Result<Vec<CellKey>, WorkbookError> {
        let key = cell(sheet, a1)?;
        Ok(self.engine.set_value(&mut self.store, &key, value.into()))
    }

    /// Enter a formula (leading `=` optional). Text that does not parse is
    /// rejected and the cell keeps what it held.
    pub fn set_formula(
        &mut self,
        sheet: &str,
        a1: &str,
        text: &str,
    ) -> Result<Vec<CellKey>, WorkbookError> {
        let key = cell(sheet, a1)?;
        Ok(self.engine.set_formula(&mut self.store, &key, text)?)
    }

    pub fn clear(&mut self, sheet: &str, a1: &str) -> Result<Vec<CellKey>, WorkbookError> {
        let key = cell(sheet, a1)?;
        Ok(self.engine.clear_cell(&mut self.store, &key))
    }

    pub fn value(&self, sheet: &str, a1: &str) -> Result<FormulaValue, WorkbookError> {
        Ok(self.store.value(&cell(sheet, a1)?))
    }

    pub fn formula(&self, sheet: &str, a1: &str) -> Result<Option<&str>, WorkbookError> {
        Ok(self.store.formula(&cell(sheet, a1)?))
    }

    /// Evaluate `text` as if entered on `sheet`, without storing it.
    pub fn evaluate(&self, sheet: &str, text: &str) -> Result<FormulaValue, WorkbookError> {
        Ok(self.engine.evaluate_formula(&self.store, sheet, text)?)
    }

    /// Bind a name and recalculate every formula, since any of them may
    /// refer to it.
    pub fn define_name(&mut self, name: &str, value: impl Into<FormulaValue>) -> Vec<CellKey> {
        self.store.define_name(name, value);
        self.engine.recalculate_all(&mut self.store)
    }

    pub fn recalculate_all(&mut self) -> Vec<CellKey> {
        self.engine.recalculate_all(&mut self.store)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }
}
