//! Tests for cycle detection through the scheduler.
use super::common::{graph_with, key, keys};

#[test]
fn two_cell_cycle() {
    let graph = graph_with(&[("A1", "=B1"), ("B1", "=A1")]);
    let plan = graph.full_order();
    assert!(plan.order.is_empty());
    assert_eq!(plan.cycles, vec![keys(&["A1", "B1"])]);
    assert!(plan.is_cyclic(&key("B1")));
}

#[test]
fn self_reference_is_a_cycle() {
    let graph = graph_with(&[("A1", "=A1+1")]);
    assert_eq!(graph.full_order().cycles, vec![keys(&["A1"])]);
}

#[test]
fn range_covering_its_own_cell_is_a_cycle() {
    let graph = graph_with(&[("A5", "=SUM(A1:A10)"), ("B1", "=SUM(A1:A4)")]);
    let plan = graph.full_order();
    assert_eq!(plan.cycles, vec![keys(&["A5"])]);
    assert_eq!(plan.order, keys(&["B1"]));
}

#[test]
fn cycle_with_acyclic_branch() {
    let graph = graph_with(&[
        ("A1", "=B1"),
        ("B1", "=C1"),
        ("C1", "=A1"),
        ("D1", "=E1*2"),
    ]);
    let plan = graph.full_order();
    assert_eq!(plan.cycles.len(), 1);
    assert_eq!(plan.cycles[0], keys(&["A1", "B1", "C1"]));
    assert_eq!(plan.order, keys(&["D1"]));
}

#[test]
fn cells_downstream_of_a_cycle_stay_in_the_order() {
    let graph = graph_with(&[("A1", "=B1"), ("B1", "=A1"), ("C1", "=A1+1")]);
    let plan = graph.recalc_order(&key("A1"));
    assert_eq!(plan.cycles, vec![keys(&["A1", "B1"])]);
    assert_eq!(plan.order, keys(&["C1"]));
}

#[test]
fn two_separate_cycles() {
    let graph = graph_with(&[
        ("A1", "=B1"),
        ("B1", "=A1"),
        ("A2", "=B2"),
        ("B2", "=A2"),
    ]);
    let mut cycles = graph.full_order().cycles;
    cycles.sort();
    assert_eq!(cycles, vec![keys(&["A1", "B1"]), keys(&["A2", "B2"])]);
}

#[test]
fn long_chain_does_not_overflow() {
    let mut graph = graph_with(&[]);
    for row in 1..5000u32 {
        let here = format!("A{}", row + 1);
        let prev = format!("=A{row}+1");
        graph.set_formula(&key(&here), &super::common::ast(&prev));
    }
    let plan = graph.recalc_order(&key("A1"));
    assert!(plan.cycles.is_empty());
    assert_eq!(plan.order.len(), 5000);
    assert_eq!(plan.order[0], key("A1"));
    assert_eq!(plan.order[4999], key("A5000"));
}
