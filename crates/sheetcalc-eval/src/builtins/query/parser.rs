//! Recursive-descent parser for the QUERY language.
//!
//! ```text
//! query     := [SELECT selection] [WHERE condition] [GROUP BY columns]
//!              [ORDER BY key [ASC|DESC], ...] [LIMIT n]
//! selection := '*' | item, ...
//! item      := column | aggregate '(' column ')'
//! condition := conj (OR conj)*
//! conj      := neg (AND neg)*
//! neg       := NOT neg | '(' condition ')' | predicate
//! predicate := operand ( cmp operand | CONTAINS operand | LIKE operand
//!              | STARTS WITH operand | ENDS WITH operand | IS [NOT] NULL )
//! ```

use sheetcalc_common::FormulaValue;

use super::lexer::{CmpOp, Lexer, QueryError, Token, TokenKind};

const RESERVED: &[&str] = &[
    "select", "where", "group", "order", "by", "limit", "and", "or", "not", "asc", "desc",
    "contains", "like", "starts", "ends", "with", "is", "null", "true", "false",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregate {
    fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub aggregate: Option<Aggregate>,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(FormulaValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Contains,
    Like,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    Text {
        left: Operand,
        op: TextOp,
        right: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub item: SelectItem,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub selection: Selection,
    pub filter: Option<Condition>,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<usize>,
}

impl Query {
    /// `true` when the output is one row per group rather than per row.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
            || matches!(&self.selection, Selection::Items(items)
                if items.iter().any(|i| i.aggregate.is_some()))
    }
}

pub fn parse_query(src: &str) -> Result<Query, QueryError> {
    let tokens = Lexer::new(src).tokenize()?;
    QueryParser { tokens, pos: 0 }.parse()
}

struct QueryParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl QueryParser {
    fn parse(mut self) -> Result<Query, QueryError> {
        let selection = if self.eat_keyword("select") {
            self.selection()?
        } else {
            Selection::All
        };
        let filter = if self.eat_keyword("where") {
            Some(self.condition()?)
        } else {
            None
        };
        let mut group_by = Vec::new();
        if self.eat_keyword("group") {
            self.expect_keyword("by")?;
            loop {
                group_by.push(self.column()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let mut order_by = Vec::new();
        if self.eat_keyword("order") {
            self.expect_keyword("by")?;
            loop {
                let item = self.item()?;
                let descending = if self.eat_keyword("desc") {
                    true
                } else {
                    self.eat_keyword("asc");
                    false
                };
                order_by.push(OrderKey { item, descending });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let limit = if self.eat_keyword("limit") {
            match self.advance().kind {
                TokenKind::Number(n) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
                _ => return Err(self.error_at_previous("LIMIT expects a whole number")),
            }
        } else {
            None
        };
        if self.peek().kind != TokenKind::Eof {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(Query {
            selection,
            filter,
            group_by,
            order_by,
            limit,
        })
    }

    /* ─── token plumbing ─── */

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), QueryError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", kw.to_ascii_uppercase())))
        }
    }

    fn error(&self, message: &str) -> QueryError {
        QueryError::new(message, self.peek().start)
    }

    fn error_at_previous(&self, message: &str) -> QueryError {
        QueryError::new(message, self.tokens[self.pos.saturating_sub(1)].start)
    }

    /* ─── clauses ─── */

    fn selection(&mut self) -> Result<Selection, QueryError> {
        if self.eat(&TokenKind::Star) {
            return Ok(Selection::All);
        }
        let mut items = vec![self.item()?];
        while self.eat(&TokenKind::Comma) {
            items.push(self.item()?);
        }
        Ok(Selection::Items(items))
    }

    fn item(&mut self) -> Result<SelectItem, QueryError> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            if let Some(aggregate) = Aggregate::parse(name) {
                if self.peek_at(1).kind == TokenKind::ParenOpen {
                    self.advance();
                    self.advance();
                    let column = self.column()?;
                    if !self.eat(&TokenKind::ParenClose) {
                        return Err(self.error("expected ')'"));
                    }
                    return Ok(SelectItem {
                        aggregate: Some(aggregate),
                        column,
                    });
                }
            }
        }
        Ok(SelectItem {
            aggregate: None,
            column: self.column()?,
        })
    }

    fn column(&mut self) -> Result<String, QueryError> {
        match &self.peek().kind {
            TokenKind::Quoted(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Ident(name)
                if !RESERVED.iter().any(|kw| name.eq_ignore_ascii_case(kw)) =>
            {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected a column")),
        }
    }

    /* ─── conditions ─── */

    fn condition(&mut self) -> Result<Condition, QueryError> {
        let mut left = self.conjunction()?;
        while self.eat_keyword("or") {
            let right = self.conjunction()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Condition, QueryError> {
        let mut left = self.negation()?;
        while self.eat_keyword("and") {
            let right = self.negation()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn negation(&mut self) -> Result<Condition, QueryError> {
        if self.eat_keyword("not") {
            return Ok(Condition::Not(Box::new(self.negation()?)));
        }
        if self.eat(&TokenKind::ParenOpen) {
            let inner = self.condition()?;
            if !self.eat(&TokenKind::ParenClose) {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }
        self.predicate()
    }

    fn predicate(&mut self) -> Result<Condition, QueryError> {
        let left = self.operand()?;
        if let TokenKind::Cmp(op) = self.peek().kind {
            self.advance();
            let right = self.operand()?;
            return Ok(Condition::Compare { left, op, right });
        }
        let text_op = if self.eat_keyword("contains") {
            Some(TextOp::Contains)
        } else if self.eat_keyword("like") {
            Some(TextOp::Like)
        } else if self.eat_keyword("starts") {
            self.expect_keyword("with")?;
            Some(TextOp::StartsWith)
        } else if self.eat_keyword("ends") {
            self.expect_keyword("with")?;
            Some(TextOp::EndsWith)
        } else {
            None
        };
        if let Some(op) = text_op {
            let right = self.operand()?;
            return Ok(Condition::Text { left, op, right });
        }
        if self.eat_keyword("is") {
            let negated = self.eat_keyword("not");
            self.expect_keyword("null")?;
            return Ok(Condition::IsNull {
                operand: left,
                negated,
            });
        }
        Err(self.error("expected a comparison"))
    }

    fn operand(&mut self) -> Result<Operand, QueryError> {
        if self.peek().kind == TokenKind::Minus {
            self.advance();
            return match self.advance().kind {
                TokenKind::Number(n) => Ok(Operand::Literal(FormulaValue::Number(-n))),
                _ => Err(self.error_at_previous("expected a number after '-'")),
            };
        }
        let literal = match &self.peek().kind {
            TokenKind::Number(n) => Some(FormulaValue::Number(*n)),
            TokenKind::Str(s) => Some(FormulaValue::Text(s.clone())),
            _ if self.peek().is_keyword("true") => Some(FormulaValue::Boolean(true)),
            _ if self.peek().is_keyword("false") => Some(FormulaValue::Boolean(false)),
            _ => None,
        };
        match literal {
            Some(v) => {
                self.advance();
                Ok(Operand::Literal(v))
            }
            None => self.column().map(Operand::Column),
        }
    }
}
