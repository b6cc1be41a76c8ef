use chrono::NaiveDate;
use sheetcalc::{CellKey, EngineError, ErrorKind, FormulaValue, Workbook, WorkbookError};

const SHEET: &str = "Sheet1";

fn at(a1: &str) -> CellKey {
    let a = sheetcalc::common::reference::parse_a1(a1).unwrap();
    CellKey::new(SHEET, a.row, a.col)
}

fn value(wb: &Workbook, a1: &str) -> FormulaValue {
    wb.value(SHEET, a1).unwrap()
}

#[test]
fn totals_follow_their_inputs() {
    let mut wb = Workbook::new();
    for (a1, v) in [("A1", 10.0), ("A2", 20.0), ("A3", 30.0)] {
        wb.set_value(SHEET, a1, v).unwrap();
    }
    wb.set_formula(SHEET, "B1", "=SUM(A1:A3)").unwrap();
    assert_eq!(value(&wb, "B1"), 60.0.into());

    let changed = wb.set_value(SHEET, "A2", 25.0).unwrap();
    assert_eq!(changed, vec![at("A2"), at("B1")]);
    assert_eq!(value(&wb, "B1"), 65.0.into());
    assert_eq!(wb.formula(SHEET, "B1").unwrap(), Some("=SUM(A1:A3)"));
}

#[test]
fn cross_sheet_references() {
    let mut wb = Workbook::new();
    wb.set_value("Rates", "A1", 0.5).unwrap();
    wb.set_value("Tax Rates", "B2", 0.25).unwrap();
    wb.set_value(SHEET, "A1", 80.0).unwrap();
    wb.set_formula(SHEET, "B1", "=A1*Rates!A1").unwrap();
    wb.set_formula(SHEET, "C1", "=A1*'Tax Rates'!$B$2").unwrap();
    assert_eq!(value(&wb, "B1"), 40.0.into());
    assert_eq!(value(&wb, "C1"), 20.0.into());

    let changed = wb.set_value("Rates", "A1", 0.75).unwrap();
    assert!(changed.contains(&at("B1")));
    assert!(!changed.contains(&at("C1")));
    assert_eq!(value(&wb, "B1"), 60.0.into());
}

#[test]
fn two_cell_cycle_is_circular_not_partial() {
    let mut wb = Workbook::new();
    wb.set_formula(SHEET, "A1", "=B1").unwrap();
    wb.set_formula(SHEET, "B1", "=A1").unwrap();
    wb.set_formula(SHEET, "C1", "=A1+1").unwrap();
    assert_eq!(value(&wb, "A1"), ErrorKind::Circ.into());
    assert_eq!(value(&wb, "B1"), ErrorKind::Circ.into());
    assert_eq!(value(&wb, "C1"), ErrorKind::Circ.into());

    wb.set_value(SHEET, "B1", 4.0).unwrap();
    assert_eq!(value(&wb, "A1"), 4.0.into());
    assert_eq!(value(&wb, "C1"), 5.0.into());
}

#[test]
fn structural_errors_keep_the_previous_formula() {
    let mut wb = Workbook::new();
    wb.set_formula(SHEET, "A1", "=1+1").unwrap();
    let err = wb.set_formula(SHEET, "A1", "=1+").unwrap_err();
    assert!(matches!(err, WorkbookError::Engine(EngineError::Parse(_))));
    assert_eq!(wb.formula(SHEET, "A1").unwrap(), Some("=1+1"));
    assert_eq!(value(&wb, "A1"), 2.0.into());

    let err = wb.set_value(SHEET, "1A", 3.0).unwrap_err();
    assert!(matches!(err, WorkbookError::Address(_)));
}

#[test]
fn value_errors_are_still_tracked() {
    let mut wb = Workbook::new();
    wb.set_formula(SHEET, "A1", "=1/B1").unwrap();
    wb.set_formula(SHEET, "A2", "=IFERROR(A1,-1)").unwrap();
    assert_eq!(value(&wb, "A1"), ErrorKind::Div.into());
    assert_eq!(value(&wb, "A2"), (-1.0).into());

    wb.set_value(SHEET, "B1", 4.0).unwrap();
    assert_eq!(value(&wb, "A1"), 0.25.into());
    assert_eq!(value(&wb, "A2"), 0.25.into());
}

#[test]
fn names_resolve_after_definition() {
    let mut wb = Workbook::new();
    wb.set_formula(SHEET, "A1", "=Rate*100").unwrap();
    assert_eq!(value(&wb, "A1"), ErrorKind::Name.into());
    let changed = wb.define_name("rate", 0.5);
    assert_eq!(changed, vec![at("A1")]);
    assert_eq!(value(&wb, "A1"), 50.0.into());
}

#[test]
fn pinned_clock_drives_today() {
    let mut wb = Workbook::new();
    let now = NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap();
    wb.store_mut().set_clock(Some(now));
    assert_eq!(wb.evaluate(SHEET, "=YEAR(TODAY())").unwrap(), 2024.0.into());
    assert_eq!(wb.evaluate(SHEET, "=DAY(NOW())").unwrap(), 15.0.into());
}

#[test]
fn query_over_a_sheet_range() {
    let mut wb = Workbook::new();
    let rows: [(&str, FormulaValue, FormulaValue); 3] = [
        ("1", "Name".into(), "Score".into()),
        ("2", "x".into(), 5.0.into()),
        ("3", "y".into(), 20.0.into()),
    ];
    for (row, name, score) in rows {
        wb.set_value("Data", &format!("A{row}"), name).unwrap();
        wb.set_value("Data", &format!("B{row}"), score).unwrap();
    }
    let out = wb
        .evaluate("Data", "=QUERY(A1:B3,\"select A where B > 10\",1)")
        .unwrap();
    assert_eq!(
        out,
        FormulaValue::Array(vec![vec!["Name".into()], vec!["y".into()]])
    );
}

#[test]
fn ad_hoc_evaluation_does_not_store() {
    let mut wb = Workbook::new();
    wb.set_value(SHEET, "A1", 3.0).unwrap();
    assert_eq!(wb.evaluate(SHEET, "=A1^2").unwrap(), 9.0.into());
    assert_eq!(wb.store().len(), 1);
    assert_eq!(wb.engine().graph().formula_count(), 0);
}

#[test]
fn eval_scalar_helper() {
    let v = sheetcalc::doc_examples::eval_scalar("=CONCAT(\"a\",\"b\")").unwrap();
    assert_eq!(v, "ab".into());
}
