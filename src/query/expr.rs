//! Record-expression parser
//!
//! Parses the query surface Eventide exposes: a record of named output
//! fields, each a column reference optionally piped through an aggregate.
//!
//! # Syntax
//!
//! ```text
//! {
//!   time: purchases.purchase_time,
//!   entity: purchases.customer_id,
//!   max_amount: purchases.amount | max(),
//!   min_amount: purchases.amount | min(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Unexpected end of input
    UnexpectedEnd,
    /// Invalid syntax
    InvalidSyntax(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseError::UnexpectedEnd => write!(f, "unexpected end of input"),
            ParseError::InvalidSyntax(msg) => write!(f, "invalid syntax: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Result type for parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// A parsed record expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordExpr {
    /// Output fields, in declaration order
    pub fields: Vec<RecordField>,
}

/// One named output field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    /// Output field name
    pub name: String,
    /// The expression producing the field
    pub value: FieldExpr,
}

/// A column reference, optionally piped through an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExpr {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
    /// Aggregate function name, if piped
    pub aggregate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,
    Dot,
    Pipe,
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            Token::Pipe => write!(f, "'|'"),
            Token::Ident(s) => write!(f, "'{s}'"),
        }
    }
}

fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '{' => {
                chars.next();
                tokens.push(Token::LBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::RBrace);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(ParseError::InvalidSyntax(format!(
                    "unexpected character '{other}'"
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> ParseResult<Token> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let found = self.next()?;
        if found == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            })
        }
    }

    fn ident(&mut self) -> ParseResult<String> {
        match self.next()? {
            Token::Ident(name) => Ok(name),
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn record(&mut self) -> ParseResult<RecordExpr> {
        self.expect(Token::LBrace)?;

        let mut fields = Vec::new();
        loop {
            if self.peek() == Some(&Token::RBrace) {
                self.pos += 1;
                break;
            }

            let name = self.ident()?;
            self.expect(Token::Colon)?;
            let value = self.field_expr()?;
            fields.push(RecordField { name, value });

            // trailing comma before '}' is allowed
            match self.peek() {
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::RBrace) => {}
                Some(other) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "',' or '}'".to_string(),
                        found: other.to_string(),
                    })
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }

        if fields.is_empty() {
            return Err(ParseError::InvalidSyntax(
                "record expression has no fields".to_string(),
            ));
        }

        Ok(RecordExpr { fields })
    }

    fn field_expr(&mut self) -> ParseResult<FieldExpr> {
        let table = self.ident()?;
        self.expect(Token::Dot)?;
        let column = self.ident()?;

        let aggregate = if self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let name = self.ident()?;
            self.expect(Token::LParen)?;
            self.expect(Token::RParen)?;
            Some(name)
        } else {
            None
        };

        Ok(FieldExpr {
            table,
            column,
            aggregate,
        })
    }
}

/// Parse a record expression.
pub fn parse(input: &str) -> ParseResult<RecordExpr> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let record = parser.record()?;

    if let Some(extra) = parser.peek() {
        return Err(ParseError::InvalidSyntax(format!(
            "trailing input after record: {extra}"
        )));
    }
    Ok(record)
}
