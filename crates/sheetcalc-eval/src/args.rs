use sheetcalc_common::FormulaValue;
use sheetcalc_parse::{ASTNode, ASTNodeType, Reference};

use crate::interpreter::Interpreter;

enum Source<'a, 'b> {
    Node {
        node: &'a ASTNode,
        interp: &'a Interpreter<'b>,
    },
    Value(&'a FormulaValue),
}

/// One argument of a function call, evaluated on demand.
///
/// Lazy builtins (`IF`, `CHOOSE`, ...) only evaluate the handles they need;
/// eager builtins receive every handle's [`value`](Self::value).
pub struct ArgumentHandle<'a, 'b> {
    source: Source<'a, 'b>,
}

impl<'a, 'b> ArgumentHandle<'a, 'b> {
    pub(crate) fn new(node: &'a ASTNode, interp: &'a Interpreter<'b>) -> Self {
        Self {
            source: Source::Node { node, interp },
        }
    }

    /// A handle over an already computed value, for host-side calls.
    pub fn from_value(value: &'a FormulaValue) -> Self {
        Self {
            source: Source::Value(value),
        }
    }

    /// Evaluate the argument.
    ///
    /// A bare cell reference yields a 1×1 array rather than a scalar, so
    /// aggregates can tell a referenced cell (text ignored) from a typed
    /// literal (text coerced). Scalar consumers see through it via
    /// [`FormulaValue::first`] or [`FormulaValue::into_scalar`].
    pub fn value(&self) -> FormulaValue {
        match &self.source {
            Source::Value(v) => (*v).clone(),
            Source::Node { node, interp } => match &node.node_type {
                ASTNodeType::CellReference(_) => {
                    FormulaValue::Array(vec![vec![interp.evaluate_node(node)]])
                }
                _ => interp.evaluate_node(node),
            },
        }
    }

    /// Evaluate and degrade to a single value.
    pub fn scalar(&self) -> FormulaValue {
        self.value().into_scalar()
    }

    /// The reference this argument was written as, if any.
    pub fn reference(&self) -> Option<Reference> {
        match &self.source {
            Source::Node { node, .. } => match &node.node_type {
                ASTNodeType::CellReference(c) => Some(Reference::Cell(c.clone())),
                ASTNodeType::RangeReference(r) => Some(Reference::Range(r.clone())),
                _ => None,
            },
            Source::Value(_) => None,
        }
    }

    pub fn ast(&self) -> Option<&'a ASTNode> {
        match &self.source {
            Source::Node { node, .. } => Some(node),
            Source::Value(_) => None,
        }
    }

    /// `true` for an omitted argument such as the middle of `IF(A1,,0)`.
    pub fn is_omitted(&self) -> bool {
        matches!(
            &self.source,
            Source::Node { node, .. } if matches!(node.node_type, ASTNodeType::Empty)
        )
    }
}
