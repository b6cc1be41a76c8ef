//! Builtins composed with each other and with references.

use chrono::NaiveDate;
use sheetcalc_common::{ErrorKind, FormulaValue};

use crate::function_registry::FunctionRegistry;
use crate::test_workbook::TestWorkbook;

fn ledger() -> TestWorkbook {
    TestWorkbook::new()
        .with_cell("A1", "apple")
        .with_cell("A2", "pear")
        .with_cell("A3", "apple")
        .with_cell("A4", "fig")
        .with_cell("B1", 3.0)
        .with_cell("B2", 5.0)
        .with_cell("B3", 4.0)
        .with_cell("B4", 1.0)
}

#[test]
fn reference_scenarios() {
    let wb = TestWorkbook::new();
    assert_eq!(
        wb.eval("VLOOKUP(3,{1,\"a\";2,\"b\";3,\"c\"},2,FALSE)"),
        "c".into()
    );
    assert_eq!(wb.eval("SUMIF({1,2,3,4},\">2\")"), 7.0.into());
    assert_eq!(wb.eval("MEDIAN(1,2,3,4)"), 2.5.into());
    assert_eq!(wb.eval("LEFT(\"hello\",0)"), "".into());
    assert_eq!(wb.eval("SUM(1,\"#DIV/0!\")"), ErrorKind::Div.into());
    assert_eq!(wb.eval("INDEX(A1:B2,0,1)"), ErrorKind::Ref.into());
}

#[test]
fn lookups_feed_arithmetic() {
    let wb = ledger();
    assert_eq!(wb.eval("VLOOKUP(\"pear\",A1:B4,2,FALSE)*10"), 50.0.into());
    assert_eq!(wb.eval("INDEX(B1:B4,MATCH(\"fig\",A1:A4,0))"), 1.0.into());
    assert_eq!(
        wb.eval("IFERROR(VLOOKUP(\"kiwi\",A1:B4,2,FALSE),\"none\")"),
        "none".into()
    );
    assert_eq!(wb.eval("SUMIF(A1:A4,\"apple\",B1:B4)"), 7.0.into());
    assert_eq!(wb.eval("COUNTIF(A1:A4,\"?ear\")"), 1.0.into());
}

#[test]
fn conditionals_over_aggregates() {
    let wb = ledger();
    assert_eq!(wb.eval("IF(SUM(B1:B4)>10,\"big\",\"small\")"), "big".into());
    assert_eq!(wb.eval("IF(AVERAGE(B1:B4)>5,1/0,\"ok\")"), "ok".into());
    assert_eq!(wb.eval("ROUND(PMT(0.05/12,360,200000),2)"), (-1073.64).into());
}

#[test]
fn dates_render_through_text() {
    let wb = TestWorkbook::new().with_now(
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    );
    assert_eq!(wb.eval("TEXT(DATE(2024,1,1),\"yyyy-mm-dd\")"), "2024-01-01".into());
    assert_eq!(wb.eval("YEAR(TODAY())"), 2024.0.into());
    assert_eq!(wb.eval("TODAY()-DATE(2024,3,1)"), 14.0.into());
    assert_eq!(wb.eval("EOMONTH(TODAY(),0)-TODAY()"), 16.0.into());
}

#[test]
fn array_functions_compose() {
    let wb = ledger();
    assert_eq!(
        wb.eval("SORT(UNIQUE(A1:A4))"),
        FormulaValue::Array(vec![
            vec!["apple".into()],
            vec!["fig".into()],
            vec!["pear".into()]
        ])
    );
    assert_eq!(wb.eval("SUM(FILTER(B1:B4,A1:A4=\"apple\"))"), 7.0.into());
    assert_eq!(wb.eval("ROWS(TRANSPOSE(A1:B4))"), 2.0.into());
    assert_eq!(wb.eval("SUM(SEQUENCE(4))"), 10.0.into());
}

#[test]
fn registry_calls_outside_a_workbook() {
    let reg = FunctionRegistry::with_builtins();
    assert_eq!(reg.call("upper", &["abc".into()]), "ABC".into());
    assert_eq!(reg.call("MAX", &[1.0.into(), 9.0.into(), 4.0.into()]), 9.0.into());
    assert_eq!(reg.call("ISNA", &[ErrorKind::Na.into()]), true.into());
}
