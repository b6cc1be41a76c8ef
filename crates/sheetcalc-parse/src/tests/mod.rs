mod parser;

use crate::ast::{ASTNode, ASTNodeType};

/// Prefix rendering used to assert tree shape: `+(2,*(3,4))`.
pub(crate) fn shape(node: &ASTNode) -> String {
    match &node.node_type {
        ASTNodeType::BinaryOp { op, left, right } => {
            format!("{}({},{})", op.as_str(), shape(left), shape(right))
        }
        ASTNodeType::UnaryOp { op, operand } => format!("{}({})", op.as_str(), shape(operand)),
        ASTNodeType::FunctionCall { name, args } => format!(
            "{name}[{}]",
            args.iter().map(shape).collect::<Vec<_>>().join(",")
        ),
        _ => node.to_formula(),
    }
}
