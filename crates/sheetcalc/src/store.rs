use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use sheetcalc_common::{CellKey, FormulaValue};
use sheetcalc_eval::{CellSnapshot, CellStore, system_now};

/// Hash-map backed [`CellStore`]. Absent cells read as blank.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    cells: FxHashMap<CellKey, CellSnapshot>,
    names: FxHashMap<String, FormulaValue>,
    clock: Option<NaiveDateTime>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a workbook-level name. Lookup is case-insensitive.
    pub fn define_name(&mut self, name: &str, value: impl Into<FormulaValue>) {
        self.names.insert(name.to_ascii_uppercase(), value.into());
    }

    /// Pin the time `TODAY()`/`NOW()` see. `None` falls back to the system clock.
    pub fn set_clock(&mut self, now: Option<NaiveDateTime>) {
        self.clock = now;
    }

    pub fn value(&self, key: &CellKey) -> FormulaValue {
        self.cells
            .get(key)
            .map_or(FormulaValue::Null, |c| c.value.clone())
    }

    pub fn formula(&self, key: &CellKey) -> Option<&str> {
        self.cells.get(key).and_then(|c| c.formula.as_deref())
    }

    /// Number of cells holding a value or a formula.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn slot(&mut self, key: &CellKey) -> &mut CellSnapshot {
        self.cells.entry(key.clone()).or_insert(CellSnapshot {
            value: FormulaValue::Null,
            formula: None,
        })
    }
}

impl CellStore for MemoryStore {
    fn get_cell(&self, key: &CellKey) -> Option<CellSnapshot> {
        self.cells.get(key).cloned()
    }

    fn set_computed_value(&mut self, key: &CellKey, value: FormulaValue) {
        self.slot(key).value = value;
    }

    fn set_input(&mut self, key: &CellKey, value: FormulaValue) {
        if value == FormulaValue::Null {
            self.cells.remove(key);
            return;
        }
        self.cells.insert(
            key.clone(),
            CellSnapshot {
                value,
                formula: None,
            },
        );
    }

    fn set_formula_text(&mut self, key: &CellKey, text: &str) {
        self.slot(key).formula = Some(text.to_string());
    }

    fn resolve_name(&self, name: &str) -> Option<FormulaValue> {
        self.names.get(&name.to_ascii_uppercase()).cloned()
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.clock.or_else(system_now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_frees_the_cell() {
        let mut store = MemoryStore::new();
        let key = CellKey::new("Sheet1", 0, 0);
        store.set_input(&key, 4.0.into());
        assert_eq!(store.len(), 1);
        store.set_input(&key, FormulaValue::Null);
        assert!(store.is_empty());
        assert_eq!(store.value(&key), FormulaValue::Null);
    }

    #[test]
    fn formula_text_keeps_the_value_slot() {
        let mut store = MemoryStore::new();
        let key = CellKey::new("Sheet1", 2, 1);
        store.set_formula_text(&key, "=1+1");
        assert_eq!(store.value(&key), FormulaValue::Null);
        store.set_computed_value(&key, 2.0.into());
        assert_eq!(store.formula(&key), Some("=1+1"));
        assert_eq!(store.value(&key), 2.0.into());
    }

    #[test]
    fn names_ignore_case() {
        let mut store = MemoryStore::new();
        store.define_name("Rate", 0.05);
        assert_eq!(store.resolve_name("RATE"), Some(0.05.into()));
        assert_eq!(store.resolve_name("other"), None);
    }
}
