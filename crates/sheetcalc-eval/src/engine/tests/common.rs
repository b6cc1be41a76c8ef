//! Common test helpers
use sheetcalc_common::CellKey;
use sheetcalc_parse::{ASTNode, parse_formula};

use crate::engine::DependencyGraph;

pub use crate::test_workbook::{key, key_on};

pub fn ast(text: &str) -> ASTNode {
    parse_formula(text, true).expect("formula should parse")
}

/// Enter formulas by A1 address on `Sheet1`.
pub fn graph_with(formulas: &[(&str, &str)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (a1, text) in formulas {
        graph.set_formula(&key(a1), &ast(text));
    }
    graph
}

pub fn keys(a1s: &[&str]) -> Vec<CellKey> {
    a1s.iter().map(|a| key(a)).collect()
}

pub fn position(order: &[CellKey], a1: &str) -> usize {
    let k = key(a1);
    order
        .iter()
        .position(|o| *o == k)
        .unwrap_or_else(|| panic!("{a1} missing from order"))
}
