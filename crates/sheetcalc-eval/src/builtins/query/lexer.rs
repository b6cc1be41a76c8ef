//! Tokens of the QUERY language.
//!
//! Keywords are plain identifiers matched case-insensitively by the parser.
//! Strings take single or double quotes; a backquoted name is an identifier
//! that may contain spaces.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
    pub position: usize,
}

impl QueryError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryError at {}: {}", self.position, self.message)
    }
}

impl Error for QueryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// A backquoted identifier; never a keyword.
    Quoted(String),
    Str(String),
    Number(f64),
    Cmp(CmpOp),
    Star,
    /// Only meaningful as the sign of a number literal.
    Minus,
    Comma,
    ParenOpen,
    ParenClose,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
}

impl Token {
    /// `true` when this is the unquoted keyword `kw`.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(kw))
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, QueryError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    start,
                });
                return Ok(tokens);
            };
            let kind = match c {
                '*' => self.single(TokenKind::Star),
                ',' => self.single(TokenKind::Comma),
                '-' => self.single(TokenKind::Minus),
                '(' => self.single(TokenKind::ParenOpen),
                ')' => self.single(TokenKind::ParenClose),
                '=' => self.single(TokenKind::Cmp(CmpOp::Eq)),
                '!' | '<' | '>' => self.comparison(c)?,
                '\'' | '"' => TokenKind::Str(self.delimited(c)?),
                '`' => TokenKind::Quoted(self.delimited('`')?),
                c if c.is_ascii_digit() || c == '.' => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.ident(),
                other => {
                    return Err(QueryError::new(
                        format!("unexpected character '{other}'"),
                        start,
                    ));
                }
            };
            tokens.push(Token { kind, start });
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn comparison(&mut self, first: char) -> Result<TokenKind, QueryError> {
        let start = self.pos;
        self.bump();
        let op = match (first, self.peek()) {
            ('<', Some('=')) => CmpOp::Le,
            ('>', Some('=')) => CmpOp::Ge,
            ('<', Some('>')) | ('!', Some('=')) => CmpOp::Ne,
            ('<', _) => return Ok(TokenKind::Cmp(CmpOp::Lt)),
            ('>', _) => return Ok(TokenKind::Cmp(CmpOp::Gt)),
            _ => return Err(QueryError::new("expected '!='", start)),
        };
        self.bump();
        Ok(TokenKind::Cmp(op))
    }

    /// Body of a quoted run; the closing delimiter is consumed.
    fn delimited(&mut self, quote: char) -> Result<String, QueryError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(QueryError::new("unterminated quote", start)),
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind, QueryError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.bump();
        }
        self.src[start..self.pos]
            .parse()
            .map(TokenKind::Number)
            .map_err(|_| QueryError::new("invalid number", start))
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }
}
