use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::criteria::wildcard_regex;
use super::super::utils::{int, opt_int, text};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// `MID(text, start, n)`, 1-based.
pub fn mid(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let start = int(&args[1])?;
    let n = int(&args[2])?;
    if start < 1 || n < 0 {
        return Err(ErrorKind::Value);
    }
    Ok(FormulaValue::Text(
        s.chars().skip(start as usize - 1).take(n as usize).collect(),
    ))
}

/// 1-based char position of `needle` in `hay` at or after `start`.
fn locate(
    needle: &str,
    hay: &str,
    start: i64,
    matcher: impl Fn(&[char], &[char]) -> bool,
) -> FnResult {
    let hay: Vec<char> = hay.chars().collect();
    let needle: Vec<char> = needle.chars().collect();
    if start < 1 || start as usize > hay.len() + 1 {
        return Err(ErrorKind::Value);
    }
    let from = start as usize - 1;
    if needle.is_empty() {
        return Ok(FormulaValue::Number(start as f64));
    }
    (from..hay.len())
        .find(|&i| matcher(&hay[i..], &needle))
        .map(|i| FormulaValue::Number((i + 1) as f64))
        .ok_or(ErrorKind::Value)
}

/// Case-sensitive, no wildcards.
pub fn find(args: &[FormulaValue], _: Ctx) -> FnResult {
    let needle = text(&args[0])?;
    let hay = text(&args[1])?;
    locate(&needle, &hay, opt_int(args, 2, 1)?, |h, n| h.starts_with(n))
}

/// Case-insensitive, `*`/`?` wildcards.
pub fn search(args: &[FormulaValue], _: Ctx) -> FnResult {
    let needle = text(&args[0])?;
    let hay = text(&args[1])?;
    let start = opt_int(args, 2, 1)?;
    if needle.contains(['*', '?']) {
        if let Some(re) = wildcard_regex(&format!("{needle}*")) {
            return locate(&needle, &hay, start, |h, _| {
                re.is_match(&h.iter().collect::<String>())
            });
        }
    }
    let needle = needle.to_lowercase();
    let hay = hay.to_lowercase();
    locate(&needle, &hay, start, |h, n| h.starts_with(n))
}

/// `SUBSTITUTE(text, old, new, [instance])`: every occurrence, or only the
/// `instance`-th.
pub fn substitute(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let old = text(&args[1])?;
    let new = text(&args[2])?;
    if old.is_empty() {
        return Ok(FormulaValue::Text(s));
    }
    match args.get(3) {
        None => Ok(FormulaValue::Text(s.replace(&old, &new))),
        Some(v) => {
            let nth = int(v)?;
            if nth < 1 {
                return Err(ErrorKind::Value);
            }
            match s.match_indices(&old).nth(nth as usize - 1) {
                Some((at, _)) => Ok(FormulaValue::Text(format!(
                    "{}{}{}",
                    &s[..at],
                    new,
                    &s[at + old.len()..]
                ))),
                None => Ok(FormulaValue::Text(s)),
            }
        }
    }
}

/// `REPLACE(text, start, n, new)`, 1-based.
pub fn replace(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s: Vec<char> = text(&args[0])?.chars().collect();
    let start = int(&args[1])?;
    let n = int(&args[2])?;
    let new = text(&args[3])?;
    if start < 1 || n < 0 {
        return Err(ErrorKind::Value);
    }
    let from = (start as usize - 1).min(s.len());
    let to = (from + n as usize).min(s.len());
    let mut out: String = s[..from].iter().collect();
    out.push_str(&new);
    out.extend(&s[to..]);
    Ok(FormulaValue::Text(out))
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ErrorKind;

    use crate::test_workbook::TestWorkbook;

    #[test]
    fn mid_positions_are_one_based() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("MID(\"spreadsheet\",3,4)"), "read".into());
        assert_eq!(wb.eval("MID(\"abc\",5,2)"), "".into());
        assert_eq!(wb.eval("MID(\"abc\",0,2)"), ErrorKind::Value.into());
    }

    #[test]
    fn find_vs_search() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("FIND(\"b\",\"abcb\")"), 2.0.into());
        assert_eq!(wb.eval("FIND(\"b\",\"abcb\",3)"), 4.0.into());
        assert_eq!(wb.eval("FIND(\"B\",\"abc\")"), ErrorKind::Value.into());
        assert_eq!(wb.eval("SEARCH(\"B\",\"abc\")"), 2.0.into());
        assert_eq!(wb.eval("SEARCH(\"c?e\",\"abcde\")"), 3.0.into());
        assert_eq!(wb.eval("SEARCH(\"z\",\"abc\")"), ErrorKind::Value.into());
    }

    #[test]
    fn substitute_and_replace() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("SUBSTITUTE(\"a-b-c\",\"-\",\"+\")"), "a+b+c".into());
        assert_eq!(wb.eval("SUBSTITUTE(\"a-b-c\",\"-\",\"+\",2)"), "a-b+c".into());
        assert_eq!(wb.eval("SUBSTITUTE(\"abc\",\"\",\"x\")"), "abc".into());
        assert_eq!(wb.eval("REPLACE(\"abcdef\",2,3,\"XY\")"), "aXYef".into());
        assert_eq!(wb.eval("REPLACE(\"abc\",0,1,\"x\")"), ErrorKind::Value.into());
    }
}
