pub mod adjust;
pub mod ast;
pub mod parser;
#[cfg(test)]
mod tests;
pub mod tokenizer;

pub use adjust::RelativeReferenceAdjuster;
pub use ast::{
    ASTNode, ASTNodeType, BinaryOperator, CellReference, RangeReference, Reference, UnaryOperator,
};
pub use parser::{MAX_NESTING, Parser, ParserError, parse, parse_formula};
pub use tokenizer::{Token, TokenKind, Tokenizer, TokenizerError, tokenize};
