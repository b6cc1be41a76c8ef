use super::shape;
use crate::ast::{ASTNodeType, BinaryOperator, Reference};
use crate::parser::MAX_NESTING;
use crate::{parse, parse_formula};
use sheetcalc_common::ErrorKind;

fn shape_of(text: &str) -> String {
    shape(&parse(text).unwrap())
}

#[test]
fn test_precedence_shapes() {
    assert_eq!(shape_of("2+3*4"), "+(2,*(3,4))");
    assert_eq!(shape_of("2*3^2"), "*(2,^(3,2))");
    assert_eq!(shape_of("(2+3)*4"), "*(+(2,3),4)");
    assert_eq!(shape_of("1&2+3"), "&(1,+(2,3))");
    assert_eq!(shape_of("1+2=3&\"\""), "=(+(1,2),&(3,\"\"))");
}

#[test]
fn test_power_is_left_associative() {
    assert_eq!(shape_of("2^3^2"), "^(^(2,3),2)");
}

#[test]
fn test_unary_binds_looser_than_power() {
    assert_eq!(shape_of("-2^2"), "-(^(2,2))");
    assert_eq!(shape_of("-2*3"), "*(-(2),3)");
    assert_eq!(shape_of("--A1"), "-(-(A1))");
    assert_eq!(shape_of("2^-1"), "^(2,-(1))");
}

#[test]
fn test_percent_rewrites_to_division() {
    assert_eq!(shape_of("50%"), "/(50,100)");
    assert_eq!(shape_of("A1*10%"), "*(A1,/(10,100))");
}

#[test]
fn test_left_associative_subtraction() {
    assert_eq!(shape_of("10-4-3"), "-(-(10,4),3)");
    assert_eq!(shape_of("8/4/2"), "/(/(8,4),2)");
}

#[test]
fn test_absolute_reference_decoding() {
    let ast = parse("$A$1").unwrap();
    match ast.node_type {
        ASTNodeType::CellReference(c) => {
            assert_eq!((c.col, c.row, c.abs_col, c.abs_row), (0, 0, true, true));
            assert_eq!(c.sheet, None);
        }
        other => panic!("expected cell reference, got {other:?}"),
    }

    let ast = parse("AA1").unwrap();
    match ast.node_type {
        ASTNodeType::CellReference(c) => {
            assert_eq!((c.col, c.row, c.abs_col, c.abs_row), (26, 0, false, false))
        }
        other => panic!("expected cell reference, got {other:?}"),
    }
}

#[test]
fn test_range_end_inherits_sheet() {
    let ast = parse("'Q1 Data'!A1:B5").unwrap();
    match ast.node_type {
        ASTNodeType::RangeReference(r) => {
            assert_eq!(r.start.sheet.as_deref(), Some("Q1 Data"));
            assert_eq!(r.end.sheet.as_deref(), Some("Q1 Data"));
            assert_eq!((r.end.row, r.end.col), (4, 1));
            assert_eq!(r.start.raw, "'Q1 Data'!A1");
        }
        other => panic!("expected range, got {other:?}"),
    }

    assert!(parse("Sheet1!A1:Sheet1!B2").is_ok());
    let err = parse("Sheet1!A1:Sheet2!B2").unwrap_err();
    assert!(err.message.contains("same sheet"));
}

#[test]
fn test_function_calls() {
    assert_eq!(shape_of("sum(1, A1:B2, max(2,3))"), "SUM[1,A1:B2,MAX[2,3]]");
    assert_eq!(shape_of("NOW()"), "NOW[]");
    assert_eq!(shape_of("IF(A1,,0)"), "IF[A1,,0]");
}

#[test]
fn test_unknown_identifier_is_a_name() {
    let ast = parse("rate*2").unwrap();
    match ast.node_type {
        ASTNodeType::BinaryOp { left, .. } => {
            assert_eq!(left.node_type, ASTNodeType::Name("rate".to_string()))
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_literals() {
    assert_eq!(parse("TRUE").unwrap().node_type, ASTNodeType::Boolean(true));
    assert_eq!(parse("1.5e3").unwrap().node_type, ASTNodeType::Number(1500.0));
    assert_eq!(
        parse("#N/A").unwrap().node_type,
        ASTNodeType::Error(ErrorKind::Na)
    );
    assert_eq!(
        parse("\"a\\\"b\"").unwrap().node_type,
        ASTNodeType::Text("a\"b".to_string())
    );
}

#[test]
fn test_array_literal() {
    let ast = parse("{1,2;3,4}").unwrap();
    match ast.node_type {
        ASTNodeType::Array(rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1][0].node_type, ASTNodeType::Number(3.0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(parse("{1,2;3}").is_err());
}

#[test]
fn test_structural_errors_carry_positions() {
    let cases = [
        ("(1+2", 4),
        ("1+2)", 3),
        ("1+", 2),
        ("SUM(1,2", 0),
        ("1 2", 2),
        ("", 0),
        ("A1:", 3),
        ("Sheet1!", 7),
    ];
    for (text, position) in cases {
        let err = parse(text).unwrap_err();
        assert_eq!(err.position, position, "formula {text:?}: {err}");
    }
}

#[test]
fn test_tokenizer_errors_surface_through_parse() {
    let err = parse("1 + ~").unwrap_err();
    assert_eq!(err.position, 4);
}

#[test]
fn test_parse_formula_strips_equals() {
    let a = parse_formula("=1+A1", true).unwrap();
    let b = parse_formula("1+A1", false).unwrap();
    assert_eq!(a, b);
    assert!(parse_formula("=1", false).is_err());
}

#[test]
fn test_references_are_extracted_in_order() {
    let ast = parse("SUM(A1:B2)+Sheet2!C3*$D$4").unwrap();
    let refs = ast.references();
    assert_eq!(refs.len(), 3);
    assert!(matches!(&refs[0], Reference::Range(r) if r.bounds() == (0, 0, 1, 1)));
    assert!(matches!(&refs[1], Reference::Cell(c) if c.sheet.as_deref() == Some("Sheet2")));
    assert!(matches!(&refs[2], Reference::Cell(c) if c.abs_row && c.abs_col));
}

#[test]
fn test_comparison_operator_kinds() {
    let ast = parse("A1<>B1").unwrap();
    match ast.node_type {
        ASTNodeType::BinaryOp { op, .. } => {
            assert_eq!(op, BinaryOperator::NotEqual);
            assert!(op.is_comparison());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_nesting_is_bounded() {
    let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
    let err = parse(&deep).unwrap_err();
    assert!(err.message.contains("nests deeper"), "{err}");
    assert_eq!(err.position, MAX_NESTING);

    let signs = format!("{}1", "-".repeat(5_000));
    assert!(parse(&signs).is_err());
    let calls = format!("{}1{}", "SUM(".repeat(5_000), ")".repeat(5_000));
    assert!(parse(&calls).is_err());

    let ok = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert_eq!(parse(&ok).unwrap().node_type, ASTNodeType::Number(1.0));
}
