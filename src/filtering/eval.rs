//! Evaluation of type-checked filter expressions

use super::parser::{CompareOp, Expr, StringFn};
use super::{FieldMap, Value};
use crate::error::{RegistryError, Result};
use std::cmp::Ordering;

pub(crate) fn evaluate(expr: &Expr, fields: &FieldMap) -> Result<Value> {
    Ok(match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Field(name) => fields.get(name.as_str()).cloned().ok_or_else(|| {
            RegistryError::internal(format!("field {name:?} is missing from the row"))
        })?,
        Expr::Select(target, key) => lookup(&evaluate(target, fields)?, key),
        Expr::Index(target, key) => match evaluate(key, fields)? {
            Value::String(key) => lookup(&evaluate(target, fields)?, &key),
            _ => Value::Null,
        },
        Expr::Has(target, key) => match evaluate(target, fields)? {
            Value::StringMap(map) => Value::Bool(map.contains_key(key)),
            _ => Value::Bool(false),
        },
        Expr::Not(inner) => match evaluate(inner, fields)? {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Null,
        },
        Expr::And(operands) => {
            for operand in operands {
                if !truthy(&evaluate(operand, fields)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Value::Bool(true)
        }
        Expr::Or(operands) => {
            for operand in operands {
                if truthy(&evaluate(operand, fields)?) {
                    return Ok(Value::Bool(true));
                }
            }
            Value::Bool(false)
        }
        Expr::Compare(op, lhs, rhs) => {
            let left = evaluate(lhs, fields)?;
            let right = evaluate(rhs, fields)?;
            match ordering(&left, &right) {
                None => Value::Null,
                Some(ord) => Value::Bool(match op {
                    CompareOp::Eq => ord == Ordering::Equal,
                    CompareOp::Ne => ord != Ordering::Equal,
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Le => ord != Ordering::Greater,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Ge => ord != Ordering::Less,
                }),
            }
        }
        Expr::In(lhs, rhs) => match (evaluate(lhs, fields)?, evaluate(rhs, fields)?) {
            (Value::String(key), Value::StringMap(map)) => Value::Bool(map.contains_key(&key)),
            (Value::String(item), Value::StringList(items)) => Value::Bool(items.contains(&item)),
            _ => Value::Bool(false),
        },
        Expr::Split(target, separator) => match (evaluate(target, fields)?, evaluate(separator, fields)?) {
            (Value::String(s), Value::String(sep)) => {
                Value::StringList(s.split(sep.as_str()).map(str::to_string).collect())
            }
            _ => Value::Null,
        },
        Expr::Call(f, target, arg) => match (evaluate(target, fields)?, evaluate(arg, fields)?) {
            (Value::String(s), Value::String(needle)) => Value::Bool(match f {
                StringFn::Contains => s.contains(needle.as_str()),
                StringFn::StartsWith => s.starts_with(needle.as_str()),
                StringFn::EndsWith => s.ends_with(needle.as_str()),
            }),
            _ => Value::Null,
        },
        Expr::Matches(target, re) => match evaluate(target, fields)? {
            Value::String(s) => Value::Bool(re.is_match(&s)),
            _ => Value::Null,
        },
    })
}

fn lookup(target: &Value, key: &str) -> Value {
    match target {
        Value::StringMap(map) => map
            .get(key)
            .map_or(Value::Null, |v| Value::String(v.clone())),
        _ => Value::Null,
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// Comparisons involving a missing map entry are undefined
fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
