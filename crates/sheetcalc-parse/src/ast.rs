use std::fmt::{self, Display};

use sheetcalc_common::ErrorKind;
use sheetcalc_common::reference::{A1, quote_sheet_name};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single-cell reference as written in a formula.
///
/// `row`/`col` are 0-based. `raw` is the canonical text of the reference,
/// sheet qualifier included, so `parse(&r.raw)` yields the same node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellReference {
    pub sheet: Option<String>,
    pub row: u32,
    pub col: u32,
    pub abs_row: bool,
    pub abs_col: bool,
    pub raw: String,
}

impl CellReference {
    pub fn new(sheet: Option<String>, a1: A1) -> Self {
        let raw = match &sheet {
            Some(s) => format!("{}!{a1}", quote_sheet_name(s)),
            None => a1.to_string(),
        };
        CellReference {
            sheet,
            row: a1.row,
            col: a1.col,
            abs_row: a1.abs_row,
            abs_col: a1.abs_col,
            raw,
        }
    }

    pub fn a1(&self) -> A1 {
        A1 {
            row: self.row,
            col: self.col,
            abs_row: self.abs_row,
            abs_col: self.abs_col,
        }
    }
}

/// A rectangular block. Both endpoints always carry the same `sheet`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

impl RangeReference {
    pub fn sheet(&self) -> Option<&str> {
        self.start.sheet.as_deref()
    }

    /// `(top, left, bottom, right)`, normalised.
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (
            self.start.row.min(self.end.row),
            self.start.col.min(self.end.col),
            self.start.row.max(self.end.row),
            self.start.col.max(self.end.col),
        )
    }
}

impl Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.raw, self.end.a1())
    }
}

/// A reference found in a formula, as returned by [`ASTNode::references`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Cell(CellReference),
    Range(RangeReference),
}

impl Reference {
    pub fn sheet(&self) -> Option<&str> {
        match self {
            Reference::Cell(c) => c.sheet.as_deref(),
            Reference::Range(r) => r.sheet(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn from_symbol(s: &str) -> Option<Self> {
        Some(match s {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "^" => BinaryOperator::Power,
            "&" => BinaryOperator::Concat,
            "=" => BinaryOperator::Equal,
            "<>" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::Less,
            ">" => BinaryOperator::Greater,
            "<=" => BinaryOperator::LessEqual,
            ">=" => BinaryOperator::GreaterEqual,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == PREC_COMPARISON
    }

    pub(crate) fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => PREC_COMPARISON,
            BinaryOperator::Concat => PREC_CONCAT,
            BinaryOperator::Add | BinaryOperator::Subtract => PREC_ADD,
            BinaryOperator::Multiply | BinaryOperator::Divide => PREC_MUL,
            BinaryOperator::Power => PREC_POWER,
        }
    }
}

pub(crate) const PREC_COMPARISON: u8 = 1;
pub(crate) const PREC_CONCAT: u8 = 2;
pub(crate) const PREC_ADD: u8 = 3;
pub(crate) const PREC_MUL: u8 = 4;
pub(crate) const PREC_UNARY: u8 = 5;
pub(crate) const PREC_POWER: u8 = 6;
pub(crate) const PREC_ATOM: u8 = 8;

/// The type of an AST node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorKind),
    /// An omitted function argument, as in `IF(A1,,0)`.
    Empty,
    CellReference(CellReference),
    RangeReference(RangeReference),
    /// A bare identifier; evaluates through named values or to `#NAME?`.
    Name(String),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    FunctionCall {
        name: String,
        args: Vec<ASTNode>,
    },
    Array(Vec<Vec<ASTNode>>),
}

/// An AST node. `position` is the byte offset of the token that produced it
/// and is ignored by equality.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
    pub position: usize,
}

impl PartialEq for ASTNode {
    fn eq(&self, other: &Self) -> bool {
        self.node_type == other.node_type
    }
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType, position: usize) -> Self {
        ASTNode {
            node_type,
            position,
        }
    }

    /// Every cell and range reference in the tree, in source order.
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<Reference>) {
        match &self.node_type {
            ASTNodeType::CellReference(c) => out.push(Reference::Cell(c.clone())),
            ASTNodeType::RangeReference(r) => out.push(Reference::Range(r.clone())),
            ASTNodeType::UnaryOp { operand, .. } => operand.collect_references(out),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            ASTNodeType::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_references(out);
                }
            }
            ASTNodeType::Array(rows) => {
                for node in rows.iter().flatten() {
                    node.collect_references(out);
                }
            }
            ASTNodeType::Number(_)
            | ASTNodeType::Text(_)
            | ASTNodeType::Boolean(_)
            | ASTNodeType::Error(_)
            | ASTNodeType::Empty
            | ASTNodeType::Name(_) => {}
        }
    }

    /// Upper-cased names of every function called anywhere in the tree.
    pub fn function_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let ASTNodeType::FunctionCall { name, .. } = &node.node_type {
                out.push(name.as_str());
            }
        });
        out
    }

    /// Pre-order walk.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a ASTNode)) {
        f(self);
        match &self.node_type {
            ASTNodeType::UnaryOp { operand, .. } => operand.visit(f),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            ASTNodeType::FunctionCall { args, .. } => args.iter().for_each(|a| a.visit(f)),
            ASTNodeType::Array(rows) => rows.iter().flatten().for_each(|a| a.visit(f)),
            _ => {}
        }
    }

    /// Canonical formula text without the leading `=`.
    pub fn to_formula(&self) -> String {
        self.to_string()
    }

    fn precedence(&self) -> u8 {
        match &self.node_type {
            ASTNodeType::BinaryOp { op, .. } => op.precedence(),
            ASTNodeType::UnaryOp { .. } => PREC_UNARY,
            _ => PREC_ATOM,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_type {
            ASTNodeType::Number(n) => write!(f, "{n}"),
            ASTNodeType::Text(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            ASTNodeType::Boolean(true) => f.write_str("TRUE"),
            ASTNodeType::Boolean(false) => f.write_str("FALSE"),
            ASTNodeType::Error(e) => write!(f, "{e}"),
            ASTNodeType::Empty => Ok(()),
            ASTNodeType::CellReference(c) => f.write_str(&c.raw),
            ASTNodeType::RangeReference(r) => write!(f, "{r}"),
            ASTNodeType::Name(n) => f.write_str(n),
            ASTNodeType::UnaryOp { op, operand } => {
                f.write_str(op.as_str())?;
                operand.fmt_child(f, operand.precedence() < PREC_UNARY)
            }
            ASTNodeType::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                left.fmt_child(f, left.precedence() < prec)?;
                f.write_str(op.as_str())?;
                // `^` takes a signed operand directly: 2^-1
                let signed_atom = *op == BinaryOperator::Power
                    && matches!(&right.node_type, ASTNodeType::UnaryOp { operand, .. }
                        if operand.precedence() == PREC_ATOM);
                right.fmt_child(f, !signed_atom && right.precedence() <= prec)
            }
            ASTNodeType::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ASTNodeType::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, item) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{item}")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}
