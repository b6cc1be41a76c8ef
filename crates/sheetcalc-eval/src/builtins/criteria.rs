//! Criteria strings as used by `COUNTIF`, `SUMIFS` and friends.
//!
//! A criterion is a value or text such as `">=10"`, `"<>apple"`, `"a*"`.
//! Text matching is case-insensitive; `*` and `?` are wildcards and `~`
//! escapes them.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use sheetcalc_common::{ErrorKind, FormulaValue};

use crate::coercion::{compare_text, parse_number_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn test(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord.is_eq(),
            CmpOp::Ne => ord.is_ne(),
            CmpOp::Lt => ord.is_lt(),
            CmpOp::Le => ord.is_le(),
            CmpOp::Gt => ord.is_gt(),
            CmpOp::Ge => ord.is_ge(),
        }
    }

    /// Split a leading comparison operator off a criterion string.
    fn split(s: &str) -> (CmpOp, &str) {
        for (prefix, op) in [
            (">=", CmpOp::Ge),
            ("<=", CmpOp::Le),
            ("<>", CmpOp::Ne),
            (">", CmpOp::Gt),
            ("<", CmpOp::Lt),
            ("=", CmpOp::Eq),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                return (op, rest);
            }
        }
        (CmpOp::Eq, s)
    }
}

#[derive(Debug, Clone)]
pub enum Criterion {
    Number(CmpOp, f64),
    Text(CmpOp, String),
    Pattern { regex: Regex, negate: bool },
    Boolean(CmpOp, bool),
    Error(CmpOp, ErrorKind),
    /// `"="` matches blanks, `"<>"` matches anything non-blank.
    Blank { negate: bool },
}

impl Criterion {
    pub fn parse(value: &FormulaValue) -> Criterion {
        match value.first() {
            FormulaValue::Number(n) => Criterion::Number(CmpOp::Eq, *n),
            FormulaValue::Boolean(b) => Criterion::Boolean(CmpOp::Eq, *b),
            FormulaValue::Error(e) => Criterion::Error(CmpOp::Eq, *e),
            FormulaValue::Null => Criterion::Blank { negate: false },
            FormulaValue::Text(s) => Self::parse_text(s),
            FormulaValue::Array(_) => Criterion::Blank { negate: false },
        }
    }

    fn parse_text(s: &str) -> Criterion {
        let (op, rest) = CmpOp::split(s);
        if rest.is_empty() {
            return match op {
                CmpOp::Eq => Criterion::Blank { negate: false },
                CmpOp::Ne => Criterion::Blank { negate: true },
                _ => Criterion::Text(op, String::new()),
            };
        }
        if let Some(n) = parse_number_text(rest) {
            return Criterion::Number(op, n);
        }
        if rest.eq_ignore_ascii_case("TRUE") {
            return Criterion::Boolean(op, true);
        }
        if rest.eq_ignore_ascii_case("FALSE") {
            return Criterion::Boolean(op, false);
        }
        if let Some(e) = ErrorKind::parse(rest) {
            return Criterion::Error(op, e);
        }
        if matches!(op, CmpOp::Eq | CmpOp::Ne) {
            if let Some(regex) = wildcard_regex(rest) {
                return Criterion::Pattern {
                    regex,
                    negate: op == CmpOp::Ne,
                };
            }
            return Criterion::Text(op, unescape(rest));
        }
        Criterion::Text(op, rest.to_string())
    }

    pub fn matches(&self, value: &FormulaValue) -> bool {
        match self {
            Criterion::Number(op, target) => match value {
                FormulaValue::Number(n) => n.partial_cmp(target).is_some_and(|o| op.test(o)),
                FormulaValue::Text(s) if matches!(op, CmpOp::Eq | CmpOp::Ne) => {
                    let equal = parse_number_text(s) == Some(*target);
                    (*op == CmpOp::Eq) == equal
                }
                _ => *op == CmpOp::Ne,
            },
            Criterion::Text(op, target) => match value {
                FormulaValue::Text(s) => op.test(compare_text(s, target)),
                FormulaValue::Null if target.is_empty() => op.test(Ordering::Equal),
                _ => *op == CmpOp::Ne,
            },
            Criterion::Pattern { regex, negate } => {
                let hit = matches!(value, FormulaValue::Text(s) if regex.is_match(s));
                hit != *negate
            }
            Criterion::Boolean(op, target) => match value {
                FormulaValue::Boolean(b) => op.test(b.cmp(target)),
                _ => *op == CmpOp::Ne,
            },
            Criterion::Error(op, target) => match value {
                FormulaValue::Error(e) => (*op == CmpOp::Eq) == (e == target),
                _ => *op == CmpOp::Ne,
            },
            Criterion::Blank { negate } => {
                let blank = match value {
                    FormulaValue::Null => true,
                    FormulaValue::Text(s) => s.is_empty(),
                    _ => false,
                };
                blank != *negate
            }
        }
    }
}

/// Case-insensitive anchored regex for a pattern containing unescaped
/// `*` or `?`. `None` when the pattern has no wildcards.
pub fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let mut out = String::from("^");
    let mut wild = false;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => match chars.next() {
                Some(next) => out.push_str(&regex::escape(&next.to_string())),
                None => out.push_str(&regex::escape("~")),
            },
            '*' => {
                wild = true;
                out.push_str(".*");
            }
            '?' => {
                wild = true;
                out.push('.');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    if !wild {
        return None;
    }
    RegexBuilder::new(&out)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()
}

/// Drop `~` escapes from a wildcard-free pattern.
fn unescape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(criterion: &str, value: FormulaValue) -> bool {
        Criterion::parse(&FormulaValue::text(criterion)).matches(&value)
    }

    #[test]
    fn numeric_prefixes() {
        assert!(hits(">5", 6.0.into()));
        assert!(!hits(">5", 5.0.into()));
        assert!(hits(">=5", 5.0.into()));
        assert!(hits("<>5", "x".into()));
        assert!(hits("5", "5".into()));
        assert!(!hits("<5", "1".into()), "ordering needs real numbers");
    }

    #[test]
    fn text_and_wildcards() {
        assert!(hits("apple", "APPLE".into()));
        assert!(hits("a*", "avocado".into()));
        assert!(hits("?at", "cat".into()));
        assert!(!hits("?at", "chat".into()));
        assert!(hits("what~?", "what?".into()));
        assert!(!hits("what~?", "whatx".into()));
        assert!(hits("<>b*", "apple".into()));
        assert!(!hits("<>b*", "banana".into()));
        assert!(hits("<m", "apple".into()));
    }

    #[test]
    fn blanks_booleans_errors() {
        assert!(hits("=", FormulaValue::Null));
        assert!(!hits("=", "x".into()));
        assert!(hits("<>", "x".into()));
        assert!(!hits("<>", FormulaValue::Null));
        assert!(hits("TRUE", true.into()));
        assert!(hits("#N/A", ErrorKind::Na.into()));
        assert!(Criterion::parse(&3.0.into()).matches(&3.0.into()));
    }
}
