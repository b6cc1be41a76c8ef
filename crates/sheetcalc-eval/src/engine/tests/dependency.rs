use sheetcalc_common::RangeKey;

use super::common::{ast, graph_with, key, key_on, keys, position};
use crate::engine::CellState;

#[test]
fn precedents_and_dependents() {
    let graph = graph_with(&[("B1", "=A1+A2"), ("C1", "=SUM(A1:A3)")]);
    assert_eq!(graph.precedents(&key("B1")), keys(&["A1", "A2"]));
    assert_eq!(
        graph.range_precedents(&key("C1")),
        &[RangeKey::new("Sheet1", 0, 0, 2, 0)]
    );
    assert_eq!(graph.dependents(&key("A2")), keys(&["B1", "C1"]));
    assert_eq!(graph.dependents(&key("A3")), keys(&["C1"]));
    assert!(graph.dependents(&key("A4")).is_empty());
}

#[test]
fn replacing_a_formula_rewires_edges() {
    let mut graph = graph_with(&[("B1", "=A1*2")]);
    graph.set_formula(&key("B1"), &ast("=A2*2"));
    assert!(graph.dependents(&key("A1")).is_empty());
    assert_eq!(graph.dependents(&key("A2")), keys(&["B1"]));
    assert_eq!(graph.precedents(&key("B1")), keys(&["A2"]));
}

#[test]
fn removing_a_formula_keeps_incoming_edges() {
    let mut graph = graph_with(&[("B1", "=A1"), ("C1", "=B1+SUM(D1:D3)")]);
    graph.remove_formula(&key("C1"));
    assert!(!graph.has_formula(&key("C1")));
    assert!(graph.dependents(&key("B1")).is_empty());
    assert!(graph.dependents(&key("D2")).is_empty());

    graph.remove_formula(&key("B1"));
    graph.set_formula(&key("C1"), &ast("=B1"));
    assert_eq!(graph.dependents(&key("B1")), keys(&["C1"]));
    assert_eq!(graph.formula_count(), 1);
}

#[test]
fn recalc_order_puts_precedents_first() {
    let graph = graph_with(&[
        ("D1", "=B1+C1"),
        ("C1", "=B1*2"),
        ("B1", "=A1+1"),
        ("E1", "=SUM(B1:D1)"),
        ("F1", "=Z9"),
    ]);
    let plan = graph.recalc_order(&key("A1"));
    assert!(plan.cycles.is_empty());
    assert_eq!(plan.order.len(), 5);
    assert_eq!(position(&plan.order, "A1"), 0);
    assert!(position(&plan.order, "B1") < position(&plan.order, "C1"));
    assert!(position(&plan.order, "C1") < position(&plan.order, "D1"));
    assert!(position(&plan.order, "D1") < position(&plan.order, "E1"));
    assert!(!plan.order.contains(&key("F1")));
}

#[test]
fn unreferenced_root_still_leads_the_order() {
    let graph = graph_with(&[("B1", "=SUM(A1:A9)")]);
    let plan = graph.recalc_order(&key("A5"));
    assert_eq!(plan.order, keys(&["A5", "B1"]));
    let plan = graph.recalc_order(&key("Q1"));
    assert_eq!(plan.order, keys(&["Q1"]));
}

#[test]
fn references_resolve_against_their_own_sheet() {
    let mut graph = graph_with(&[("A1", "=B1")]);
    graph.set_formula(&key_on("Other", "A1"), &ast("=B1+Sheet1!C1"));
    assert_eq!(graph.dependents(&key("B1")), keys(&["A1"]));
    assert_eq!(graph.dependents(&key_on("Other", "B1")), vec![key_on("Other", "A1")]);
    assert_eq!(graph.dependents(&key("C1")), vec![key_on("Other", "A1")]);
}

#[test]
fn states_follow_edits() {
    let mut graph = graph_with(&[("B1", "=A1")]);
    assert_eq!(graph.state(&key("B1")), CellState::Dirty);
    assert_eq!(graph.state(&key("Z99")), CellState::Clean);
    graph.set_state(&key("B1"), CellState::Clean);
    assert_eq!(graph.state(&key("B1")), CellState::Clean);
    graph.remove_formula(&key("B1"));
    assert_eq!(graph.state(&key("B1")), CellState::Clean);
}

#[test]
fn volatile_cells_are_tracked() {
    let mut graph = graph_with(&[("A1", "=RAND()"), ("B1", "=1")]);
    graph.set_volatile(&key("A1"), true);
    assert_eq!(graph.volatile_cells(), keys(&["A1"]));
    graph.remove_formula(&key("A1"));
    assert!(graph.volatile_cells().is_empty());
}
