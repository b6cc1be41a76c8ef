use sheetcalc_common::ErrorKind;
use sheetcalc_common::reference::{A1, MAX_COLS, MAX_ROWS};

use crate::ast::{ASTNode, ASTNodeType, CellReference, RangeReference};

/// Rewrites references when a formula is copied or filled to another cell.
///
/// Relative axes move by the offset, absolute (`$`) axes stay put. A
/// reference pushed off the grid becomes a `#REF!` literal.
pub struct RelativeReferenceAdjuster {
    row_offset: i64,
    col_offset: i64,
}

impl RelativeReferenceAdjuster {
    pub fn new(row_offset: i64, col_offset: i64) -> Self {
        Self {
            row_offset,
            col_offset,
        }
    }

    pub fn adjust_formula(&self, ast: &ASTNode) -> ASTNode {
        let node_type = match &ast.node_type {
            ASTNodeType::CellReference(cell) => match self.adjust_cell(cell) {
                Some(c) => ASTNodeType::CellReference(c),
                None => ASTNodeType::Error(ErrorKind::Ref),
            },
            ASTNodeType::RangeReference(range) => {
                match (self.adjust_cell(&range.start), self.adjust_cell(&range.end)) {
                    (Some(start), Some(end)) => {
                        ASTNodeType::RangeReference(RangeReference { start, end })
                    }
                    _ => ASTNodeType::Error(ErrorKind::Ref),
                }
            }
            ASTNodeType::UnaryOp { op, operand } => ASTNodeType::UnaryOp {
                op: *op,
                operand: Box::new(self.adjust_formula(operand)),
            },
            ASTNodeType::BinaryOp { op, left, right } => ASTNodeType::BinaryOp {
                op: *op,
                left: Box::new(self.adjust_formula(left)),
                right: Box::new(self.adjust_formula(right)),
            },
            ASTNodeType::FunctionCall { name, args } => ASTNodeType::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|a| self.adjust_formula(a)).collect(),
            },
            ASTNodeType::Array(rows) => ASTNodeType::Array(
                rows.iter()
                    .map(|row| row.iter().map(|a| self.adjust_formula(a)).collect())
                    .collect(),
            ),
            other => other.clone(),
        };
        ASTNode::new(node_type, ast.position)
    }

    fn adjust_cell(&self, cell: &CellReference) -> Option<CellReference> {
        let row = shift(cell.row, cell.abs_row, self.row_offset, MAX_ROWS)?;
        let col = shift(cell.col, cell.abs_col, self.col_offset, MAX_COLS)?;
        Some(CellReference::new(
            cell.sheet.clone(),
            A1 {
                row,
                col,
                abs_row: cell.abs_row,
                abs_col: cell.abs_col,
            },
        ))
    }
}

impl ASTNode {
    /// Copy of this formula as if it were moved by `(d_row, d_col)`.
    pub fn offset_references(&self, d_row: i64, d_col: i64) -> ASTNode {
        RelativeReferenceAdjuster::new(d_row, d_col).adjust_formula(self)
    }
}

fn shift(index: u32, absolute: bool, offset: i64, limit: u32) -> Option<u32> {
    if absolute {
        return Some(index);
    }
    let moved = i64::from(index) + offset;
    (0..i64::from(limit)).contains(&moved).then_some(moved as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_relative_reference_copy() {
        let adjuster = RelativeReferenceAdjuster::new(2, 3);
        let adjusted = adjuster.adjust_formula(&parse("A1+B2").unwrap());
        assert_eq!(adjusted.to_formula(), "D3+E4");
    }

    #[test]
    fn test_absolute_axes_are_preserved() {
        let adjuster = RelativeReferenceAdjuster::new(1, 1);
        let adjusted = adjuster.adjust_formula(&parse("$A$1*A$1+$A1").unwrap());
        assert_eq!(adjusted.to_formula(), "$A$1*B$1+$A2");
    }

    #[test]
    fn test_ranges_and_sheets_shift_together() {
        let adjuster = RelativeReferenceAdjuster::new(0, 1);
        let adjusted = adjuster.adjust_formula(&parse("SUM(Data!A1:$B$4)").unwrap());
        assert_eq!(adjusted.to_formula(), "SUM(Data!B1:$B$4)");
    }

    #[test]
    fn test_offset_references_shorthand() {
        let moved = parse("A1*$B2").unwrap().offset_references(3, 0);
        assert_eq!(moved.to_formula(), "A4*$B5");
    }

    #[test]
    fn test_reference_off_grid_becomes_ref_error() {
        let adjuster = RelativeReferenceAdjuster::new(-1, 0);
        let adjusted = adjuster.adjust_formula(&parse("A1+1").unwrap());
        assert_eq!(adjusted.to_formula(), "#REF!+1");
        match adjusted.node_type {
            ASTNodeType::BinaryOp { left, .. } => {
                assert_eq!(left.node_type, ASTNodeType::Error(ErrorKind::Ref))
            }
            other => panic!("unexpected node {other:?}"),
        }
    }
}
