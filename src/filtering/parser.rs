//! Recursive-descent parser and type checker for filter expressions
//!
//! ```text
//! expr     := and ( "||" and )*
//! and      := unary ( "&&" unary )*
//! unary    := "!" unary | relation
//! relation := member ( relop member | "in" member )?
//! member   := primary ( "." IDENT [ "(" expr ")" ] | "[" expr "]" )*
//! primary  := literal | IDENT "(" expr ")" | IDENT | "(" expr ")"
//! ```
//!
//! `&&` and `||` chains parse into flat operand lists. Every other construct
//! nests, and nesting is capped at [`MAX_FILTER_DEPTH`] so that parsing,
//! checking and evaluation recurse a bounded number of times.

use super::lexer::Token;
use crate::constants::MAX_FILTER_DEPTH;
use super::{Field, FieldType, Value};
use chrono::{DateTime, Utc};
use regex::Regex;

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// String predicates called as methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringFn {
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Literal(Value),
    Field(String),
    Select(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Has(Box<Expr>, String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    In(Box<Expr>, Box<Expr>),
    Call(StringFn, Box<Expr>, Box<Expr>),
    Split(Box<Expr>, Box<Expr>),
    Matches(Box<Expr>, Regex),
}

/// Static type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Type {
    String,
    Int,
    Timestamp,
    StringMap,
    StringList,
    Bool,
}

impl From<FieldType> for Type {
    fn from(kind: FieldType) -> Self {
        match kind {
            FieldType::String => Type::String,
            FieldType::Int => Type::Int,
            FieldType::Timestamp => Type::Timestamp,
            FieldType::StringMap => Type::StringMap,
        }
    }
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream as one expression
    pub(crate) fn parse(mut self) -> Result<Expr, String> {
        let expr = self.or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected {token:?} after expression")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {:?}", self.peek()))
        }
    }

    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_FILTER_DEPTH {
            return Err(format!("expression is nested deeper than {MAX_FILTER_DEPTH} levels"));
        }
        Ok(())
    }

    /// Parse a nested sub-expression one level down
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut operands = vec![self.and()?];
        while self.eat(&Token::Or) {
            operands.push(self.and()?);
        }
        Ok(flatten(operands, Expr::Or))
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut operands = vec![self.unary()?];
        while self.eat(&Token::And) {
            operands.push(self.unary()?);
        }
        Ok(flatten(operands, Expr::And))
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Not) {
            let inner = self.nested(Self::unary)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.relation()
    }

    fn relation(&mut self) -> Result<Expr, String> {
        let lhs = self.member()?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            Some(Token::Ident(word)) if word == "in" => {
                self.pos += 1;
                let rhs = self.member()?;
                return Ok(Expr::In(Box::new(lhs), Box::new(rhs)));
            }
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.member()?;
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn member(&mut self) -> Result<Expr, String> {
        let depth = self.depth;
        let expr = self.member_chain();
        self.depth = depth;
        expr
    }

    /// Each selector wraps the expression before it, so each one counts as a level
    fn member_chain(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                self.descend()?;
                let Some(Token::Ident(name)) = self.next() else {
                    return Err("expected identifier after '.'".to_string());
                };
                if self.eat(&Token::LParen) {
                    let arg = self.nested(Self::or)?;
                    self.expect(&Token::RParen)?;
                    expr = method(expr, &name, arg)?;
                } else {
                    expr = Expr::Select(Box::new(expr), name);
                }
            } else if self.eat(&Token::LBracket) {
                self.descend()?;
                let key = self.nested(Self::or)?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(key));
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::LParen) => {
                let expr = self.nested(Self::or)?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                _ if self.eat(&Token::LParen) => {
                    let arg = self.nested(Self::or)?;
                    self.expect(&Token::RParen)?;
                    function(&word, arg)
                }
                _ => Ok(Expr::Field(word)),
            },
            Some(token) => Err(format!("unexpected {token:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// A single operand stands for itself; longer chains become one n-ary node
fn flatten(mut operands: Vec<Expr>, node: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        node(operands)
    }
}

fn function(name: &str, arg: Expr) -> Result<Expr, String> {
    match (name, arg) {
        ("has", Expr::Select(target, key)) => Ok(Expr::Has(target, key)),
        ("has", _) => Err("has() requires a field selection such as has(labels.key)".to_string()),
        ("timestamp", Expr::Literal(Value::String(text))) => {
            let parsed = DateTime::parse_from_rfc3339(&text)
                .map_err(|e| format!("invalid timestamp {text:?}: {e}"))?;
            Ok(Expr::Literal(Value::Timestamp(parsed.with_timezone(&Utc))))
        }
        ("timestamp", _) => Err("timestamp() requires a string literal".to_string()),
        (other, _) => Err(format!("unknown function {other:?}")),
    }
}

fn method(target: Expr, name: &str, arg: Expr) -> Result<Expr, String> {
    let string_fn = match name {
        "contains" => Some(StringFn::Contains),
        "startsWith" => Some(StringFn::StartsWith),
        "endsWith" => Some(StringFn::EndsWith),
        _ => None,
    };
    if let Some(f) = string_fn {
        return Ok(Expr::Call(f, Box::new(target), Box::new(arg)));
    }
    match name {
        "split" => Ok(Expr::Split(Box::new(target), Box::new(arg))),
        "matches" => match &arg {
            Expr::Literal(Value::String(pattern)) => {
                let re = Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern:?}: {e}"))?;
                Ok(Expr::Matches(Box::new(target), re))
            }
            _ => Err("matches() requires a string literal".to_string()),
        },
        other => Err(format!("unknown method {other:?}")),
    }
}

/// Infer the type of `expr`, resolving field names only from `fields`
pub(crate) fn check(expr: &Expr, fields: &[Field]) -> Result<Type, String> {
    match expr {
        Expr::Literal(value) => match value {
            Value::String(_) => Ok(Type::String),
            Value::Int(_) => Ok(Type::Int),
            Value::Timestamp(_) => Ok(Type::Timestamp),
            Value::StringMap(_) => Ok(Type::StringMap),
            Value::StringList(_) => Ok(Type::StringList),
            Value::Bool(_) => Ok(Type::Bool),
            Value::Null => Err("null literals are not supported".to_string()),
        },
        Expr::Field(name) => fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| Type::from(f.kind))
            .ok_or_else(|| format!("unknown field {name:?}")),
        Expr::Select(target, key) => {
            expect_type(check(target, fields)?, Type::StringMap, &format!(".{key}"))?;
            Ok(Type::String)
        }
        Expr::Index(target, key) => {
            expect_type(check(target, fields)?, Type::StringMap, "[]")?;
            expect_type(check(key, fields)?, Type::String, "map key")?;
            Ok(Type::String)
        }
        Expr::Has(target, key) => {
            expect_type(check(target, fields)?, Type::StringMap, &format!("has(.{key})"))?;
            Ok(Type::Bool)
        }
        Expr::Not(inner) => {
            expect_type(check(inner, fields)?, Type::Bool, "!")?;
            Ok(Type::Bool)
        }
        Expr::And(operands) | Expr::Or(operands) => {
            for operand in operands {
                expect_type(check(operand, fields)?, Type::Bool, "logical operand")?;
            }
            Ok(Type::Bool)
        }
        Expr::Compare(op, lhs, rhs) => {
            let left = check(lhs, fields)?;
            let right = check(rhs, fields)?;
            if left != right {
                return Err(format!("cannot compare {left:?} with {right:?}"));
            }
            let ordered = matches!(left, Type::String | Type::Int | Type::Timestamp);
            let equality = matches!(op, CompareOp::Eq | CompareOp::Ne);
            if ordered || (equality && left == Type::Bool) {
                Ok(Type::Bool)
            } else {
                Err(format!("operator {op:?} is not defined for {left:?}"))
            }
        }
        Expr::In(lhs, rhs) => {
            expect_type(check(lhs, fields)?, Type::String, "in")?;
            expect_container(check(rhs, fields)?)?;
            Ok(Type::Bool)
        }
        Expr::Split(target, separator) => {
            expect_type(check(target, fields)?, Type::String, "split")?;
            expect_type(check(separator, fields)?, Type::String, "split separator")?;
            Ok(Type::StringList)
        }
        Expr::Call(f, target, arg) => {
            expect_type(check(target, fields)?, Type::String, &format!("{f:?}"))?;
            expect_type(check(arg, fields)?, Type::String, &format!("{f:?} argument"))?;
            Ok(Type::Bool)
        }
        Expr::Matches(target, _) => {
            expect_type(check(target, fields)?, Type::String, "matches")?;
            Ok(Type::Bool)
        }
    }
}

/// `in` tests map keys or list items
fn expect_container(container: Type) -> Result<(), String> {
    match container {
        Type::StringMap | Type::StringList => Ok(()),
        other => Err(format!("in expects a map or a list, found {other:?}")),
    }
}

fn expect_type(actual: Type, expected: Type, context: &str) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{context} expects {expected:?}, found {actual:?}"))
    }
}
