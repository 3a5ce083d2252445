//! Evaluator for the subset of the ClassAd expression language used in query constraints.
//!
//! Covers literals (integer, real, string, `true`, `false`, `undefined`, `error`),
//! case-insensitive attribute references, unary `!` and `-`, arithmetic,
//! relational, equality and meta-equality (`=?=`, `=!=`) operators and the
//! logical `&&` / `||`, all with ClassAd three-valued logic.

use serde_json::Value;
use thiserror::Error;

use crate::domain::classad::ClassAd;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedCharacter(char, usize),

    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Result of evaluating an expression against an ad.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Undefined,
    Error,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl EvalValue {
    fn from_json(value: &Value) -> EvalValue {
        match value {
            Value::Null => EvalValue::Undefined,
            Value::Bool(b) => EvalValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => EvalValue::Int(i),
                None => n.as_f64().map(EvalValue::Real).unwrap_or(EvalValue::Error),
            },
            Value::String(s) => EvalValue::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => EvalValue::Error,
        }
    }

    fn as_real(&self) -> Option<f64> {
        match self {
            EvalValue::Int(i) => Some(*i as f64),
            EvalValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    MetaEq,
    MetaNe,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        match symbol {
            "||" => Some(BinaryOp::Or),
            "&&" => Some(BinaryOp::And),
            "==" => Some(BinaryOp::Eq),
            "!=" => Some(BinaryOp::Ne),
            "=?=" => Some(BinaryOp::MetaEq),
            "=!=" => Some(BinaryOp::MetaNe),
            "<" => Some(BinaryOp::Lt),
            "<=" => Some(BinaryOp::Le),
            ">" => Some(BinaryOp::Gt),
            ">=" => Some(BinaryOp::Ge),
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::MetaEq | BinaryOp::MetaNe => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(EvalValue),
    Attribute(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Real(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(i) => i.to_string(),
            Token::Real(r) => r.to_string(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Ident(name) => format!("'{}'", name),
            Token::Op(op) => format!("'{}'", op),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

// Longest symbols first.
const OPERATORS: [&str; 15] = ["=?=", "=!=", "&&", "||", "==", "!=", "<=", ">=", "<", ">", "!", "+", "-", "*", "/"];

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == '"' {
            let start = i;
            let mut literal = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(ExpressionError::UnterminatedString(start)),
                    Some('"') => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        match chars.get(i + 1) {
                            Some('n') => literal.push('\n'),
                            Some('t') => literal.push('\t'),
                            Some(other) => literal.push(*other),
                            None => return Err(ExpressionError::UnterminatedString(start)),
                        }
                        i += 2;
                    }
                    Some(other) => {
                        literal.push(*other);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(literal));
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            if let Ok(int) = text.parse::<i64>() {
                tokens.push(Token::Int(int));
            } else if let Ok(real) = text.parse::<f64>() {
                tokens.push(Token::Real(real));
            } else {
                return Err(ExpressionError::InvalidNumber(text));
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
            match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                Some(op) => {
                    tokens.push(Token::Op(*op));
                    i += op.len();
                }
                None => return Err(ExpressionError::UnexpectedCharacter(c, i)),
            }
        }
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses, unary operators and operator chains an expression may have.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

// Parsed subtree and its height; evaluation recurses once per level.
type Node = (Expr, usize);

fn leaf(expr: Expr) -> Result<Node, ExpressionError> {
    Ok((expr, 1))
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Node, ExpressionError> {
        let (mut lhs, mut height) = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op(symbol)) => match BinaryOp::from_symbol(symbol) {
                    Some(op) => op,
                    None => break,
                },
                _ => break,
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.pos += 1;
            let (rhs, rhs_height) = self.parse_binary(op.precedence() + 1)?;
            height = height.max(rhs_height) + 1;
            if height > MAX_DEPTH {
                return Err(ExpressionError::TooDeep(MAX_DEPTH));
            }
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok((lhs, height))
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        let op = match self.peek() {
            Some(Token::Op("!")) => Some(UnaryOp::Not),
            Some(Token::Op("-")) => Some(UnaryOp::Neg),
            Some(Token::Op("+")) => None,
            _ => return self.parse_primary(),
        };
        self.pos += 1;

        self.descend()?;
        let (operand, height) = self.parse_unary()?;
        self.ascend();

        Ok(match op {
            Some(op) => (Expr::Unary(op, Box::new(operand)), height + 1),
            None => (operand, height),
        })
    }

    fn parse_primary(&mut self) -> Result<Node, ExpressionError> {
        match self.next() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some(Token::Int(i)) => leaf(Expr::Literal(EvalValue::Int(i))),
            Some(Token::Real(r)) => leaf(Expr::Literal(EvalValue::Real(r))),
            Some(Token::Str(s)) => leaf(Expr::Literal(EvalValue::Str(s))),
            Some(Token::Ident(name)) => leaf(match name.to_ascii_lowercase().as_str() {
                "true" => Expr::Literal(EvalValue::Bool(true)),
                "false" => Expr::Literal(EvalValue::Bool(false)),
                "undefined" => Expr::Literal(EvalValue::Undefined),
                "error" => Expr::Literal(EvalValue::Error),
                lower => Expr::Attribute(lower.strip_prefix("my.").unwrap_or(lower).to_string()),
            }),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_binary(1)?;
                self.ascend();
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
        }
    }
}

/// Parses a constraint expression.
///
/// Expressions nested deeper than [`MAX_DEPTH`] are rejected, so parsing and
/// evaluation stay within a bounded amount of stack.
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    let mut parser = Parser { tokens: tokenize(input)?, pos: 0, depth: 0 };
    let (expr, _) = parser.parse_binary(1)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::UnexpectedToken(token.describe())),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Truth {
    True,
    False,
    Undefined,
    Error,
}

fn truth(value: &EvalValue) -> Truth {
    match value {
        EvalValue::Bool(true) => Truth::True,
        EvalValue::Bool(false) => Truth::False,
        EvalValue::Int(i) => if *i != 0 { Truth::True } else { Truth::False },
        EvalValue::Real(r) => if *r != 0.0 { Truth::True } else { Truth::False },
        EvalValue::Undefined => Truth::Undefined,
        EvalValue::Str(_) | EvalValue::Error => Truth::Error,
    }
}

fn from_truth(truth: Truth) -> EvalValue {
    match truth {
        Truth::True => EvalValue::Bool(true),
        Truth::False => EvalValue::Bool(false),
        Truth::Undefined => EvalValue::Undefined,
        Truth::Error => EvalValue::Error,
    }
}

impl Expr {
    pub fn evaluate(&self, ad: &ClassAd) -> EvalValue {
        match self {
            Expr::Literal(value) => value.clone(),
            Expr::Attribute(name) => ad.get(name).map(EvalValue::from_json).unwrap_or(EvalValue::Undefined),
            Expr::Unary(UnaryOp::Not, operand) => match truth(&operand.evaluate(ad)) {
                Truth::True => EvalValue::Bool(false),
                Truth::False => EvalValue::Bool(true),
                other => from_truth(other),
            },
            Expr::Unary(UnaryOp::Neg, operand) => match operand.evaluate(ad) {
                EvalValue::Int(i) => i.checked_neg().map(EvalValue::Int).unwrap_or(EvalValue::Error),
                EvalValue::Real(r) => EvalValue::Real(-r),
                EvalValue::Undefined => EvalValue::Undefined,
                _ => EvalValue::Error,
            },
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let left = truth(&lhs.evaluate(ad));
                if left == Truth::False || left == Truth::Error {
                    return from_truth(left);
                }
                match (left, truth(&rhs.evaluate(ad))) {
                    (_, Truth::False) => EvalValue::Bool(false),
                    (_, Truth::Error) => EvalValue::Error,
                    (Truth::True, Truth::True) => EvalValue::Bool(true),
                    _ => EvalValue::Undefined,
                }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let left = truth(&lhs.evaluate(ad));
                if left == Truth::True || left == Truth::Error {
                    return from_truth(left);
                }
                match (left, truth(&rhs.evaluate(ad))) {
                    (_, Truth::True) => EvalValue::Bool(true),
                    (_, Truth::Error) => EvalValue::Error,
                    (Truth::False, Truth::False) => EvalValue::Bool(false),
                    _ => EvalValue::Undefined,
                }
            }
            Expr::Binary(BinaryOp::MetaEq, lhs, rhs) => EvalValue::Bool(identical(&lhs.evaluate(ad), &rhs.evaluate(ad))),
            Expr::Binary(BinaryOp::MetaNe, lhs, rhs) => EvalValue::Bool(!identical(&lhs.evaluate(ad), &rhs.evaluate(ad))),
            Expr::Binary(op, lhs, rhs) => {
                let (left, right) = (lhs.evaluate(ad), rhs.evaluate(ad));
                match op {
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arithmetic(*op, &left, &right),
                    _ => compare(*op, &left, &right),
                }
            }
        }
    }

    /// True only when the expression evaluates to boolean `true` for `ad`.
    pub fn matches(&self, ad: &ClassAd) -> bool {
        self.evaluate(ad) == EvalValue::Bool(true)
    }
}

fn identical(left: &EvalValue, right: &EvalValue) -> bool {
    match (left, right) {
        (EvalValue::Undefined, EvalValue::Undefined) | (EvalValue::Error, EvalValue::Error) => true,
        (EvalValue::Bool(a), EvalValue::Bool(b)) => a == b,
        (EvalValue::Int(a), EvalValue::Int(b)) => a == b,
        (EvalValue::Real(a), EvalValue::Real(b)) => a == b,
        (EvalValue::Str(a), EvalValue::Str(b)) => a == b,
        _ => false,
    }
}

fn compare(op: BinaryOp, left: &EvalValue, right: &EvalValue) -> EvalValue {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (EvalValue::Error, _) | (_, EvalValue::Error) => return EvalValue::Error,
        (EvalValue::Undefined, _) | (_, EvalValue::Undefined) => return EvalValue::Undefined,
        // String comparison ignores case, as the scheduler does.
        (EvalValue::Str(a), EvalValue::Str(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (EvalValue::Bool(a), EvalValue::Bool(b)) => a.cmp(b),
        (EvalValue::Int(a), EvalValue::Int(b)) => a.cmp(b),
        _ => match (left.as_real(), right.as_real()) {
            (Some(a), Some(b)) => match a.partial_cmp(&b) {
                Some(ordering) => ordering,
                None => return EvalValue::Error,
            },
            _ => return EvalValue::Error,
        },
    };

    EvalValue::Bool(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return EvalValue::Error,
    })
}

fn arithmetic(op: BinaryOp, left: &EvalValue, right: &EvalValue) -> EvalValue {
    match (left, right) {
        (EvalValue::Error, _) | (_, EvalValue::Error) => EvalValue::Error,
        (EvalValue::Undefined, _) | (_, EvalValue::Undefined) => EvalValue::Undefined,
        (EvalValue::Int(a), EvalValue::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Div => a.checked_div(*b),
                _ => None,
            };
            result.map(EvalValue::Int).unwrap_or(EvalValue::Error)
        }
        _ => match (left.as_real(), right.as_real()) {
            (Some(a), Some(b)) => match op {
                BinaryOp::Add => EvalValue::Real(a + b),
                BinaryOp::Sub => EvalValue::Real(a - b),
                BinaryOp::Mul => EvalValue::Real(a * b),
                BinaryOp::Div if b != 0.0 => EvalValue::Real(a / b),
                _ => EvalValue::Error,
            },
            _ => EvalValue::Error,
        },
    }
}
