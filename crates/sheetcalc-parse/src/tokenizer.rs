use std::error::Error;
use std::fmt::{self, Display};

use once_cell::sync::Lazy;
use sheetcalc_common::ErrorKind;
use sheetcalc_common::reference::MAX_COLUMN_LETTERS;

/// Error literals, longest first so `#NAME?` never loses to a shorter prefix.
static ERROR_LITERALS: Lazy<Vec<(&'static str, ErrorKind)>> = Lazy::new(|| {
    let mut codes: Vec<_> = ErrorKind::ALL.iter().map(|k| (k.as_str(), *k)).collect();
    codes.sort_by_key(|(s, _)| std::cmp::Reverse(s.len()));
    codes
});

/// A custom error type for the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError at {}: {}", self.position, self.message)
    }
}

impl Error for TokenizerError {}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Boolean,
    /// `#DIV/0!` and friends written literally in a formula.
    Error,
    CellRef,
    /// Sheet qualifier; always followed by an `Exclamation` token.
    SheetName,
    Colon,
    Operator,
    FunctionName,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    Comma,
    Semicolon,
    Exclamation,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a formula.
///
/// `text` is the decoded lexeme: strings without their quotes and escapes,
/// sheet names without their quotes. `start`/`end` are byte offsets into the
/// source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            start,
            end,
        }
    }

    /// Source position used in diagnostics.
    pub fn position(&self) -> usize {
        self.start
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {:?} @{}>", self.kind, self.text, self.start)
    }
}

#[inline(always)]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline(always)]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Single-pass lexer over a formula body (no leading `=`).
pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    offset: usize,
    items: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            source,
            bytes: source.as_bytes(),
            offset: 0,
            items: Vec::with_capacity(source.len() / 2 + 1),
        }
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    #[inline]
    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn error(&self, message: impl Into<String>, position: usize) -> TokenizerError {
        TokenizerError {
            message: message.into(),
            position,
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.items
            .push(Token::new(kind, &self.source[start..end], start, end));
    }

    /// Consume the source and return the token list, terminated by `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizerError> {
        while let Some(b) = self.current_byte() {
            let start = self.offset;
            match b {
                b if b.is_ascii_whitespace() => self.offset += 1,
                b'"' => self.lex_string()?,
                b'\'' => self.lex_quoted_sheet()?,
                b'#' => self.lex_error_literal()?,
                b'0'..=b'9' => self.lex_number()?,
                b'.' if self.peek_byte(1).is_some_and(|n| n.is_ascii_digit()) => {
                    self.lex_number()?
                }
                b'$' => self.lex_identifier()?,
                b if is_ident_start(b) => self.lex_identifier()?,
                b'<' | b'>' => {
                    let len = match (b, self.peek_byte(1)) {
                        (b'<', Some(b'>')) | (b'<', Some(b'=')) | (b'>', Some(b'=')) => 2,
                        _ => 1,
                    };
                    self.offset += len;
                    self.push(TokenKind::Operator, start, self.offset);
                }
                b'+' | b'-' | b'*' | b'/' | b'^' | b'&' | b'=' | b'%' => {
                    self.offset += 1;
                    self.push(TokenKind::Operator, start, self.offset);
                }
                _ => {
                    let kind = match b {
                        b':' => TokenKind::Colon,
                        b',' => TokenKind::Comma,
                        b';' => TokenKind::Semicolon,
                        b'!' => TokenKind::Exclamation,
                        b'(' => TokenKind::ParenOpen,
                        b')' => TokenKind::ParenClose,
                        b'{' => TokenKind::BraceOpen,
                        b'}' => TokenKind::BraceClose,
                        _ => {
                            let ch = self.source[start..].chars().next().unwrap_or('?');
                            return Err(self.error(format!("Unexpected character '{ch}'"), start));
                        }
                    };
                    self.offset += 1;
                    self.push(kind, start, self.offset);
                }
            }
        }

        let end = self.source.len();
        self.items.push(Token::new(TokenKind::Eof, "", end, end));
        Ok(self.items)
    }

    /// `"..."` with `\x` escapes and doubled `""` quotes.
    fn lex_string(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        self.offset += 1;
        let mut value = String::new();
        let mut chunk_start = self.offset;

        loop {
            match self.current_byte() {
                None => return Err(self.error("Reached end of formula while parsing string", start)),
                Some(b'\\') => {
                    value.push_str(&self.source[chunk_start..self.offset]);
                    let escaped = self.source[self.offset + 1..].chars().next().ok_or_else(|| {
                        self.error("Reached end of formula while parsing string", start)
                    })?;
                    value.push(escaped);
                    self.offset += 1 + escaped.len_utf8();
                    chunk_start = self.offset;
                }
                Some(b'"') if self.peek_byte(1) == Some(b'"') => {
                    value.push_str(&self.source[chunk_start..self.offset]);
                    value.push('"');
                    self.offset += 2;
                    chunk_start = self.offset;
                }
                Some(b'"') => {
                    value.push_str(&self.source[chunk_start..self.offset]);
                    self.offset += 1;
                    self.items
                        .push(Token::new(TokenKind::String, value, start, self.offset));
                    return Ok(());
                }
                Some(_) => self.offset += 1,
            }
        }
    }

    /// `'Sheet Name'` which must be followed by `!`.
    fn lex_quoted_sheet(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        self.offset += 1;
        let mut name = String::new();
        let mut chunk_start = self.offset;

        loop {
            match self.current_byte() {
                None => return Err(self.error("Unterminated sheet name", start)),
                Some(b'\'') if self.peek_byte(1) == Some(b'\'') => {
                    name.push_str(&self.source[chunk_start..self.offset]);
                    name.push('\'');
                    self.offset += 2;
                    chunk_start = self.offset;
                }
                Some(b'\'') => {
                    name.push_str(&self.source[chunk_start..self.offset]);
                    self.offset += 1;
                    break;
                }
                Some(_) => self.offset += 1,
            }
        }

        if name.is_empty() {
            return Err(self.error("Empty sheet name", start));
        }
        if self.current_byte() != Some(b'!') {
            return Err(self.error("Quoted sheet name must be followed by '!'", self.offset));
        }
        self.items
            .push(Token::new(TokenKind::SheetName, name, start, self.offset));
        Ok(())
    }

    fn lex_error_literal(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let rest = &self.source[start..];
        for (code, _) in ERROR_LITERALS.iter() {
            if rest.len() >= code.len()
                && rest.is_char_boundary(code.len())
                && rest[..code.len()].eq_ignore_ascii_case(code)
            {
                self.offset += code.len();
                self.push(TokenKind::Error, start, self.offset);
                return Ok(());
            }
        }
        Err(self.error("Invalid error code", start))
    }

    /// digits [ '.' digits ] [ ('e'|'E') ['+'|'-'] digits ]
    fn lex_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.offset += 1;
        }
        if self.current_byte() == Some(b'.') {
            self.offset += 1;
            while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.offset += 1;
            }
        }
        if matches!(self.current_byte(), Some(b'e' | b'E')) {
            let exp_pos = self.offset;
            self.offset += 1;
            if matches!(self.current_byte(), Some(b'+' | b'-')) {
                self.offset += 1;
            }
            let digits_start = self.offset;
            while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.offset += 1;
            }
            if self.offset == digits_start {
                return Err(self.error("Exponent requires at least one digit", exp_pos));
            }
        }
        self.push(TokenKind::Number, start, self.offset);
        Ok(())
    }

    /// Length of a `[$]letters[$]digits` cell reference at the cursor, if any.
    fn cell_ref_len(&self) -> Option<usize> {
        let bytes = &self.bytes[self.offset..];
        let mut i = 0;
        if bytes.first() == Some(&b'$') {
            i += 1;
        }
        let letters_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let letters = i - letters_start;
        if letters == 0 || letters > MAX_COLUMN_LETTERS {
            return None;
        }
        if bytes.get(i) == Some(&b'$') {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return None;
        }
        match bytes.get(i) {
            Some(&b) if is_ident_continue(b) || b == b'(' => None,
            _ => Some(i),
        }
    }

    fn lex_identifier(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;

        if let Some(len) = self.cell_ref_len() {
            self.offset += len;
            let kind = if self.current_byte() == Some(b'!') && !self.source[start..].starts_with('$')
            {
                TokenKind::SheetName
            } else {
                TokenKind::CellRef
            };
            self.push(kind, start, self.offset);
            return Ok(());
        }

        if self.current_byte() == Some(b'$') {
            return Err(self.error("Unexpected character '$'", start));
        }

        while self.current_byte().is_some_and(is_ident_continue) {
            self.offset += 1;
        }
        let text = &self.source[start..self.offset];

        let kind = match self.current_byte() {
            Some(b'(') => TokenKind::FunctionName,
            Some(b'!') => TokenKind::SheetName,
            _ if text.eq_ignore_ascii_case("TRUE") || text.eq_ignore_ascii_case("FALSE") => {
                TokenKind::Boolean
            }
            // Unknown bare words resolve to #NAME? at evaluation time.
            _ => TokenKind::FunctionName,
        };
        self.push(kind, start, self.offset);
        Ok(())
    }
}

/// Tokenize a formula body. The caller strips any leading `=`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TokenizerError> {
    Tokenizer::new(text).tokenize()
}
