use std::error::Error;
use std::fmt::{self, Display};

use sheetcalc_common::ErrorKind;
use sheetcalc_common::reference::parse_a1;

use crate::ast::{
    ASTNode, ASTNodeType, BinaryOperator, CellReference, PREC_MUL, RangeReference, UnaryOperator,
};
use crate::tokenizer::{Token, TokenKind, TokenizerError, tokenize};

/// A structural failure: the formula cannot be entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub message: String,
    pub position: usize,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParserError at position {}: {}", self.position, self.message)
    }
}

impl Error for ParserError {}

impl From<TokenizerError> for ParserError {
    fn from(e: TokenizerError) -> Self {
        ParserError {
            message: e.message,
            position: e.position,
        }
    }
}

/// Deepest nesting of parentheses, calls, arrays and signs accepted.
pub const MAX_NESTING: usize = 256;

/// Recursive-descent parser over a token list.
///
/// Precedence, lowest to highest: comparison, `&`, `+ -`, `* /`, unary
/// sign, `^`, postfix `%`. Every binary level is left-associative,
/// including `^` (`2^3^2` is `(2^3)^2`).
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.end);
            tokens.push(Token::new(TokenKind::Eof, "", end, end));
        }
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<ASTNode, ParserError> {
        if self.peek().kind == TokenKind::Eof {
            return Err(self.error_here("Empty formula"));
        }
        let ast = self.parse_expression()?;
        let next = self.peek();
        match next.kind {
            TokenKind::Eof => Ok(ast),
            TokenKind::ParenClose => Err(self.error_here("Unbalanced closing parenthesis")),
            _ => Err(self.error_here(format!("Unexpected token '{}'", next.text))),
        }
    }

    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> ParserError {
        ParserError {
            message: message.into(),
            position: self.peek().position(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParserError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else if self.peek_kind() == TokenKind::Eof {
            Err(self.error_here(format!("Expected {what} but reached end of formula")))
        } else {
            Err(self.error_here(format!("Expected {what}, found '{}'", self.peek().text)))
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParserError>,
    ) -> Result<T, ParserError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "Formula nests deeper than {MAX_NESTING} levels"
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_expression(&mut self) -> Result<ASTNode, ParserError> {
        self.nested(|p| p.parse_binary_op(0))
    }

    fn binary_operator(&self) -> Option<BinaryOperator> {
        let token = self.peek();
        if token.kind != TokenKind::Operator {
            return None;
        }
        BinaryOperator::from_symbol(&token.text).filter(|op| *op != BinaryOperator::Power)
    }

    /// Comparison through multiplication. Operands are unary expressions.
    fn parse_binary_op(&mut self, min_precedence: u8) -> Result<ASTNode, ParserError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.binary_operator() {
            let precedence = op.precedence();
            if precedence < min_precedence || precedence > PREC_MUL {
                break;
            }
            let op_token = self.advance();
            let right = self.parse_binary_op(precedence + 1)?;
            left = ASTNode::new(
                ASTNodeType::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                op_token.position(),
            );
        }

        Ok(left)
    }

    fn unary_operator(&self) -> Option<UnaryOperator> {
        let token = self.peek();
        if token.is_operator("-") {
            Some(UnaryOperator::Negate)
        } else if token.is_operator("+") {
            Some(UnaryOperator::Plus)
        } else {
            None
        }
    }

    fn parse_unary(&mut self) -> Result<ASTNode, ParserError> {
        if let Some(op) = self.unary_operator() {
            let token = self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(ASTNode::new(
                ASTNodeType::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                token.position(),
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<ASTNode, ParserError> {
        let mut left = self.parse_postfix()?;
        while self.peek().is_operator("^") {
            let op_token = self.advance();
            let right = self.parse_power_operand()?;
            left = ASTNode::new(
                ASTNodeType::BinaryOp {
                    op: BinaryOperator::Power,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                op_token.position(),
            );
        }
        Ok(left)
    }

    /// Right side of `^`: a postfix expression, optionally signed.
    fn parse_power_operand(&mut self) -> Result<ASTNode, ParserError> {
        if let Some(op) = self.unary_operator() {
            let token = self.advance();
            let operand = self.nested(Self::parse_power_operand)?;
            return Ok(ASTNode::new(
                ASTNodeType::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                token.position(),
            ));
        }
        self.parse_postfix()
    }

    /// `x%` becomes `x / 100`.
    fn parse_postfix(&mut self) -> Result<ASTNode, ParserError> {
        let mut node = self.parse_primary()?;
        while self.peek().is_operator("%") {
            let token = self.advance();
            node = ASTNode::new(
                ASTNodeType::BinaryOp {
                    op: BinaryOperator::Divide,
                    left: Box::new(node),
                    right: Box::new(ASTNode::new(ASTNodeType::Number(100.0), token.position())),
                },
                token.position(),
            );
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<ASTNode, ParserError> {
        let token = self.peek().clone();
        let pos = token.position();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| self.error_at(format!("Invalid number '{}'", token.text), pos))?;
                Ok(ASTNode::new(ASTNodeType::Number(value), pos))
            }
            TokenKind::String => {
                self.advance();
                Ok(ASTNode::new(ASTNodeType::Text(token.text), pos))
            }
            TokenKind::Boolean => {
                self.advance();
                let value = token.text.eq_ignore_ascii_case("TRUE");
                Ok(ASTNode::new(ASTNodeType::Boolean(value), pos))
            }
            TokenKind::Error => {
                self.advance();
                let kind = ErrorKind::parse(&token.text)
                    .ok_or_else(|| self.error_at("Invalid error code", pos))?;
                Ok(ASTNode::new(ASTNodeType::Error(kind), pos))
            }
            TokenKind::CellRef | TokenKind::SheetName => self.parse_reference(),
            TokenKind::FunctionName => {
                self.advance();
                if self.peek_kind() == TokenKind::ParenOpen {
                    self.parse_function(token)
                } else {
                    Ok(ASTNode::new(ASTNodeType::Name(token.text), pos))
                }
            }
            TokenKind::ParenOpen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::ParenClose, "closing parenthesis")?;
                Ok(expr)
            }
            TokenKind::BraceOpen => self.parse_array(),
            TokenKind::Eof => Err(self.error_here("Unexpected end of formula")),
            _ => Err(self.error_here(format!("Unexpected token '{}'", token.text))),
        }
    }

    fn error_at(&self, message: impl Into<String>, position: usize) -> ParserError {
        ParserError {
            message: message.into(),
            position,
        }
    }

    /// `[sheet!]cell` optionally followed by `:[sheet!]cell`.
    fn parse_reference(&mut self) -> Result<ASTNode, ParserError> {
        let position = self.peek().position();
        let start = self.parse_cell_reference(None)?;

        if self.peek_kind() != TokenKind::Colon {
            return Ok(ASTNode::new(ASTNodeType::CellReference(start), position));
        }
        self.advance();

        let end = self.parse_cell_reference(start.sheet.as_deref())?;
        Ok(ASTNode::new(
            ASTNodeType::RangeReference(RangeReference { start, end }),
            position,
        ))
    }

    /// Parse one endpoint. For the second endpoint of a range, `inherit`
    /// is the first endpoint's sheet; an explicit, different sheet is an error.
    fn parse_cell_reference(&mut self, inherit: Option<&str>) -> Result<CellReference, ParserError> {
        let mut sheet = None;
        if self.peek_kind() == TokenKind::SheetName {
            let sheet_token = self.advance();
            self.expect(TokenKind::Exclamation, "'!' after sheet name")?;
            if self.peek_kind() != TokenKind::CellRef {
                return Err(self.error_here("Expected cell reference after sheet name"));
            }
            sheet = Some(sheet_token.text);
        }

        let token = self.expect(TokenKind::CellRef, "cell reference")?;
        let a1 = parse_a1(&token.text).map_err(|e| self.error_at(e.to_string(), token.position()))?;

        let sheet = match (inherit, sheet) {
            (None, s) => s,
            (Some(first), None) => Some(first.to_string()),
            (Some(first), Some(second)) if first.eq_ignore_ascii_case(&second) => {
                Some(first.to_string())
            }
            (Some(_), Some(_)) => {
                return Err(self.error_at(
                    "Range endpoints must be on the same sheet",
                    token.position(),
                ));
            }
        };
        Ok(CellReference::new(sheet, a1))
    }

    fn parse_function(&mut self, name_token: Token) -> Result<ASTNode, ParserError> {
        let name = name_token.text.to_ascii_uppercase();
        self.expect(TokenKind::ParenOpen, "'('")?;
        let mut args = Vec::new();

        if self.peek_kind() == TokenKind::ParenClose {
            self.advance();
            return Ok(ASTNode::new(
                ASTNodeType::FunctionCall { name, args },
                name_token.position(),
            ));
        }

        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::ParenClose => {
                    args.push(ASTNode::new(ASTNodeType::Empty, self.peek().position()));
                }
                _ => args.push(self.parse_expression()?),
            }

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::ParenClose => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(self.error_at(
                        format!("Unclosed call to {name}"),
                        name_token.position(),
                    ));
                }
                _ => {
                    return Err(self.error_here(format!(
                        "Expected ',' or ')' in call to {name}, found '{}'",
                        self.peek().text
                    )));
                }
            }
        }

        Ok(ASTNode::new(
            ASTNodeType::FunctionCall { name, args },
            name_token.position(),
        ))
    }

    /// `{a,b;c,d}`, rows separated by `;`.
    fn parse_array(&mut self) -> Result<ASTNode, ParserError> {
        let open = self.expect(TokenKind::BraceOpen, "'{'")?;
        let mut rows: Vec<Vec<ASTNode>> = vec![Vec::new()];

        loop {
            let item = self.parse_expression()?;
            if let Some(row) = rows.last_mut() {
                row.push(item);
            }
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    rows.push(Vec::new());
                }
                TokenKind::BraceClose => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(self.error_at("Unclosed array literal", open.position()));
                }
                _ => {
                    return Err(self.error_here(format!(
                        "Unexpected token '{}' in array literal",
                        self.peek().text
                    )));
                }
            }
        }

        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(self.error_at("Array literal rows must have equal length", open.position()));
        }
        Ok(ASTNode::new(ASTNodeType::Array(rows), open.position()))
    }
}

/// Parse a formula body (no leading `=`).
pub fn parse(text: &str) -> Result<ASTNode, ParserError> {
    let tokens = tokenize(text)?;
    Parser::new(tokens).parse()
}

/// Parse formula text, optionally stripping one leading `=` first.
pub fn parse_formula(text: &str, strip_leading_equals: bool) -> Result<ASTNode, ParserError> {
    let body = if strip_leading_equals {
        text.strip_prefix('=').unwrap_or(text)
    } else {
        text
    };
    parse(body)
}
