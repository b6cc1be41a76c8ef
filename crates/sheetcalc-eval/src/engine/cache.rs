//! Parsed-formula storage.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetcalc_common::CellKey;
use sheetcalc_parse::{ASTNode, ParserError, parse_formula};

/// Distinct formula texts kept parsed before the text table is flushed.
const DEFAULT_TEXT_CAP: usize = 4096;

/// The AST of every formula cell, plus a text → AST table so identical
/// formulas are parsed once.
#[derive(Debug)]
pub struct FormulaCache {
    by_cell: FxHashMap<CellKey, Arc<ASTNode>>,
    by_text: FxHashMap<String, Arc<ASTNode>>,
    text_cap: usize,
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_CAP)
    }
}

impl FormulaCache {
    pub fn new(text_cap: usize) -> Self {
        Self {
            by_cell: FxHashMap::default(),
            by_text: FxHashMap::default(),
            text_cap,
        }
    }

    /// Parse `text` (one leading `=` allowed), reusing an earlier parse of
    /// the same text.
    pub fn parse(&mut self, text: &str) -> Result<Arc<ASTNode>, ParserError> {
        if let Some(ast) = self.by_text.get(text) {
            return Ok(Arc::clone(ast));
        }
        let ast = Arc::new(parse_formula(text, true)?);
        if self.by_text.len() >= self.text_cap {
            self.by_text.clear();
        }
        self.by_text.insert(text.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    pub fn insert(&mut self, key: CellKey, ast: Arc<ASTNode>) {
        self.by_cell.insert(key, ast);
    }

    pub fn get(&self, key: &CellKey) -> Option<Arc<ASTNode>> {
        self.by_cell.get(key).cloned()
    }

    pub fn remove(&mut self, key: &CellKey) -> Option<Arc<ASTNode>> {
        self.by_cell.remove(key)
    }

    pub fn len(&self) -> usize {
        self.by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_cell.clear();
        self.by_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_shares_one_parse() {
        let mut cache = FormulaCache::default();
        let a = cache.parse("=A1+1").unwrap();
        let b = cache.parse("=A1+1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.parse("=(").is_err());
    }

    #[test]
    fn text_table_is_bounded() {
        let mut cache = FormulaCache::new(2);
        let first = cache.parse("1").unwrap();
        cache.parse("2").unwrap();
        cache.parse("3").unwrap();
        let again = cache.parse("1").unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn per_cell_entries() {
        let mut cache = FormulaCache::default();
        let key = CellKey::new("Sheet1", 0, 0);
        let ast = cache.parse("=B1").unwrap();
        cache.insert(key.clone(), ast);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_some());
        assert!(cache.remove(&key).is_some());
        assert!(cache.is_empty());
    }
}
