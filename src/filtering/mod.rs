//! # Filtering
//!
//! List filters are compiled once per list call against the field schema of
//! the kind being listed, then evaluated against one [`FieldMap`] per candidate
//! row.
//!
//! Supported syntax:
//!
//! - comparisons `==`, `!=`, `<`, `<=`, `>`, `>=` on strings, integers and
//!   timestamps (`create_time > timestamp("2021-01-01T00:00:00Z")`)
//! - logical `&&`, `||`, `!` and parentheses
//! - string methods `.contains()`, `.startsWith()`, `.endsWith()`, `.matches()`
//! - map access `labels.k`, `labels["k"]`, `has(labels.k)` and `"k" in labels`
//! - `.split()` on strings, with list membership `"x" in labels.k.split("_")`
//!
//! Filters longer than [`MAX_FILTER_LENGTH`] bytes or nested deeper than
//! [`MAX_FILTER_DEPTH`](crate::constants::MAX_FILTER_DEPTH) levels are rejected.
//!
//! Field names resolve only from the declared schema; unknown fields and type
//! mismatches are rejected at compile time with `InvalidArgument`.

mod eval;
mod lexer;
mod parser;

use crate::constants::MAX_FILTER_LENGTH;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use parser::{Expr, Parser, Type};
use std::collections::{BTreeMap, HashMap};

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Timestamp,
    StringMap,
}

/// One field of a kind's filter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name used in filter and order_by expressions
    pub name: &'static str,
    pub kind: FieldType,
    /// Storage column for ordering, or `None` if the field cannot be ordered by
    pub column: Option<&'static str>,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldType, column: Option<&'static str>) -> Self {
        Self { name, kind, column }
    }
}

/// Runtime value of a field or expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
    StringMap(BTreeMap<String, String>),
    /// Result of `split()`
    StringList(Vec<String>),
    Bool(bool),
    /// Result of looking up a key that is not present in a map
    Null,
}

/// Field values of one candidate row
pub type FieldMap = HashMap<&'static str, Value>;

/// A compiled filter expression
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: Option<Expr>,
}

impl Filter {
    /// Compile `source` against `fields`; an empty filter matches everything
    pub fn new(source: &str, fields: &[Field]) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self {
                source: source.to_string(),
                expr: None,
            });
        }

        if source.len() > MAX_FILTER_LENGTH {
            return Err(RegistryError::invalid_argument(format!(
                "filter is {} bytes long, the limit is {MAX_FILTER_LENGTH}",
                source.len()
            )));
        }
        let invalid = |reason: String| {
            RegistryError::invalid_argument(format!("invalid filter {source:?}: {reason}"))
        };
        let tokens = lexer::tokenize(source).map_err(invalid)?;
        let expr = Parser::new(tokens).parse().map_err(invalid)?;
        match parser::check(&expr, fields).map_err(invalid)? {
            Type::Bool => Ok(Self {
                source: source.to_string(),
                expr: Some(expr),
            }),
            other => Err(invalid(format!(
                "expression must evaluate to a boolean, found {other:?}"
            ))),
        }
    }

    /// The filter text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Evaluate the filter against one row
    pub fn matches(&self, fields: &FieldMap) -> Result<bool> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => match eval::evaluate(expr, fields)? {
                Value::Bool(matched) => Ok(matched),
                Value::Null => Ok(false),
                other => Err(RegistryError::internal(format!(
                    "filter {:?} produced a non-boolean value {other:?}",
                    self.source
                ))),
            },
        }
    }
}

/// Convert a JSON object column into a string map for filtering
pub fn string_map(value: &serde_json::Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
