//! Lookup and reference functions.

mod lookups;
mod reference_info;

pub use lookups::{HLookupFn, MatchFn, VLookupFn};
pub use reference_info::{ChooseFn, ColumnFn, ColumnsFn, IndexFn, RowFn, RowsFn};

use std::cmp::Ordering;
use std::sync::Arc;

use sheetcalc_common::FormulaValue;

use super::criteria::wildcard_regex;
use crate::coercion::compare_text;
use crate::function_registry::FunctionRegistryBuilder;

/* ─────────────────────────── shared helpers ─────────────────────────── */

/// Ordering of a key against the needle when both are the same kind.
/// Blank keys and mixed kinds are incomparable and skipped by scans; a
/// blank needle looks for zero.
pub(crate) fn cmp_for_lookup(key: &FormulaValue, needle: &FormulaValue) -> Option<Ordering> {
    match (key, needle) {
        (FormulaValue::Number(a), FormulaValue::Number(b)) => a.partial_cmp(b),
        (FormulaValue::Number(a), FormulaValue::Null) => a.partial_cmp(&0.0),
        (FormulaValue::Text(a), FormulaValue::Text(b)) => Some(compare_text(a, b)),
        (FormulaValue::Boolean(a), FormulaValue::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Index of the first key equal to the needle; text needles may use
/// `*`/`?` wildcards.
pub(crate) fn exact_match(keys: &[&FormulaValue], needle: &FormulaValue) -> Option<usize> {
    if let FormulaValue::Text(p) = needle {
        if let Some(re) = wildcard_regex(p) {
            return keys
                .iter()
                .position(|k| matches!(k, FormulaValue::Text(t) if re.is_match(t)));
        }
    }
    keys.iter()
        .position(|k| cmp_for_lookup(k, needle) == Some(Ordering::Equal))
}

/// Linear approximate scan: the last key that is not past the needle,
/// stopping at the first key past it or the first step against
/// `direction`. `Less` scans ascending data, `Greater` descending.
pub(crate) fn approximate_match(
    keys: &[&FormulaValue],
    needle: &FormulaValue,
    direction: Ordering,
) -> Option<usize> {
    let mut best = None;
    let mut prev: Option<&FormulaValue> = None;
    for (i, key) in keys.iter().enumerate() {
        let Some(ord) = cmp_for_lookup(key, needle) else {
            continue;
        };
        if ord == direction.reverse() {
            break;
        }
        if let Some(p) = prev {
            if cmp_for_lookup(key, p) == Some(direction) {
                break;
            }
        }
        best = Some(i);
        prev = Some(key);
    }
    best
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register(Arc::new(VLookupFn));
    b.register(Arc::new(HLookupFn));
    b.register(Arc::new(MatchFn));
    b.register(Arc::new(IndexFn));
    b.register(Arc::new(ChooseFn));
    b.register(Arc::new(RowFn));
    b.register(Arc::new(ColumnFn));
    b.register(Arc::new(RowsFn));
    b.register(Arc::new(ColumnsFn));
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use sheetcalc_common::FormulaValue;

    use super::{approximate_match, exact_match};

    fn nums(ns: &[f64]) -> Vec<FormulaValue> {
        ns.iter().map(|n| FormulaValue::Number(*n)).collect()
    }

    #[test]
    fn approximate_scan_stops_at_first_descent() {
        let keys = nums(&[1.0, 3.0, 5.0, 2.0, 4.0]);
        let refs: Vec<&FormulaValue> = keys.iter().collect();
        assert_eq!(approximate_match(&refs, &4.0.into(), Ordering::Less), Some(1));
        // 2 after 5 is a descent, so the scan never reaches 4
        assert_eq!(approximate_match(&refs, &9.0.into(), Ordering::Less), Some(2));
        assert_eq!(approximate_match(&refs, &0.5.into(), Ordering::Less), None);
    }

    #[test]
    fn descending_scan_keeps_last_key_not_below() {
        let keys = nums(&[9.0, 7.0, 5.0, 3.0]);
        let refs: Vec<&FormulaValue> = keys.iter().collect();
        assert_eq!(approximate_match(&refs, &6.0.into(), Ordering::Greater), Some(1));
        assert_eq!(approximate_match(&refs, &10.0.into(), Ordering::Greater), None);
    }

    #[test]
    fn exact_is_case_insensitive_with_wildcards() {
        let keys: Vec<FormulaValue> = vec!["Apple".into(), 2.0.into(), "banana".into()];
        let refs: Vec<&FormulaValue> = keys.iter().collect();
        assert_eq!(exact_match(&refs, &"APPLE".into()), Some(0));
        assert_eq!(exact_match(&refs, &"ban*".into()), Some(2));
        assert_eq!(exact_match(&refs, &2.0.into()), Some(1));
        assert_eq!(exact_match(&refs, &"2".into()), None);
    }
}
