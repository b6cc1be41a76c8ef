use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{boolean, int, text};
use crate::coercion::to_text;
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// Longest string a text function may produce.
const MAX_TEXT_LEN: usize = 32_767;

/* ─────────────────────────── case ─────────────────────────── */

pub fn upper(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Text(text(&args[0])?.to_uppercase()))
}

pub fn lower(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Text(text(&args[0])?.to_lowercase()))
}

/// Capitalise the first letter of every run of letters.
pub fn proper(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut out = String::new();
    let mut prev_alpha = false;
    for c in text(&args[0])?.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    Ok(FormulaValue::Text(out))
}

/// Strip leading/trailing spaces and collapse inner runs to one space.
pub fn trim(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    Ok(FormulaValue::Text(
        s.split(' ').filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" "),
    ))
}

/* ─────────────────────────── joining ─────────────────────────── */

/// Arguments joined as scalars.
pub fn concatenate(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut out = String::new();
    for a in args {
        out.push_str(&text(a)?);
    }
    Ok(FormulaValue::Text(out))
}

/// Like `CONCATENATE` but ranges contribute every cell.
pub fn concat(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut out = String::new();
    for v in args.iter().flat_map(FormulaValue::flatten) {
        out.push_str(&to_text(v)?);
    }
    Ok(FormulaValue::Text(out))
}

/// `TEXTJOIN(delimiter, ignore_empty, text1, ...)`.
pub fn textjoin(args: &[FormulaValue], _: Ctx) -> FnResult {
    let delim = text(&args[0])?;
    let ignore_empty = boolean(&args[1])?;
    let mut parts = Vec::new();
    for v in args[2..].iter().flat_map(FormulaValue::flatten) {
        let s = to_text(v)?;
        if ignore_empty && s.is_empty() {
            continue;
        }
        parts.push(s);
    }
    let joined = parts.join(&delim);
    if joined.chars().count() > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    Ok(FormulaValue::Text(joined))
}

pub fn rept(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let n = int(&args[1])?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    if s.chars().count().saturating_mul(n as usize) > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    Ok(FormulaValue::Text(s.repeat(n as usize)))
}

/// Case-sensitive equality.
pub fn exact(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(text(&args[0])? == text(&args[1])?))
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ErrorKind;

    use crate::test_workbook::TestWorkbook;

    #[test]
    fn case_and_whitespace() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("UPPER(\"abc\")"), "ABC".into());
        assert_eq!(wb.eval("LOWER(\"ABC\")"), "abc".into());
        assert_eq!(wb.eval("PROPER(\"hello wORLD-x\")"), "Hello World-X".into());
        assert_eq!(wb.eval("TRIM(\"  a   b  \")"), "a b".into());
    }

    #[test]
    fn joining() {
        let wb = TestWorkbook::new()
            .with_cell("A1", "x")
            .with_cell("A3", "z");
        assert_eq!(wb.eval("CONCATENATE(\"a\",1,TRUE)"), "a1TRUE".into());
        assert_eq!(wb.eval("CONCAT(A1:A3,\"!\")"), "xz!".into());
        assert_eq!(wb.eval("TEXTJOIN(\"-\",TRUE,A1:A3)"), "x-z".into());
        assert_eq!(wb.eval("TEXTJOIN(\"-\",FALSE,A1:A3)"), "x--z".into());
        assert_eq!(wb.eval("CONCATENATE(\"a\",1/0)"), ErrorKind::Div.into());
    }

    #[test]
    fn rept_and_exact() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("REPT(\"ab\",3)"), "ababab".into());
        assert_eq!(wb.eval("REPT(\"ab\",-1)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("EXACT(\"a\",\"A\")"), false.into());
        assert_eq!(wb.eval("EXACT(\"a\",\"a\")"), true.into());
    }
}
