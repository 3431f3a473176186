//! The predicate evaluator: a small expression tree over record attributes,
//! evaluated against a single record at a time by the scan engine.

use crate::error::{Result, StorageError};
use crate::record::{self, Record};
use crate::schema::Schema;
use crate::types::Value;

/// A comparison operator usable inside [`Expr::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A predicate or value expression evaluated against one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Const(Value),
    /// The value of attribute `attr_num` on the record under evaluation.
    Attr(i32),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// Evaluates `expr` against `record` under `schema`.
///
/// # Errors
///
/// Propagates [`StorageError::BadAttrNum`]/[`StorageError::UnknownDatatype`]
/// from attribute lookups, or returns [`StorageError::UnknownDatatype`] if a
/// comparison is attempted between incompatible operand types, or if `And`/
/// `Or`/`Not`/`Compare` is applied to a non-boolean operand.
pub fn eval_expr(record: &Record, schema: &Schema, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Const(v) => Ok(v.clone()),
        Expr::Attr(attr_num) => record::get_attr(record, schema, *attr_num),
        Expr::Compare(lhs, op, rhs) => {
            let l = eval_expr(record, schema, lhs)?;
            let r = eval_expr(record, schema, rhs)?;
            Ok(Value::Bool(compare(&l, &r, *op)?))
        }
        Expr::And(lhs, rhs) => {
            let l = as_bool(eval_expr(record, schema, lhs)?)?;
            let r = as_bool(eval_expr(record, schema, rhs)?)?;
            Ok(Value::Bool(l && r))
        }
        Expr::Or(lhs, rhs) => {
            let l = as_bool(eval_expr(record, schema, lhs)?)?;
            let r = as_bool(eval_expr(record, schema, rhs)?)?;
            Ok(Value::Bool(l || r))
        }
        Expr::Not(inner) => {
            let v = as_bool(eval_expr(record, schema, inner)?)?;
            Ok(Value::Bool(!v))
        }
    }
}

/// Compares two values under `op`. `Int`/`Float` operands are promoted to
/// `f64` for cross-type comparison; all other type pairs must match exactly.
///
/// # Errors
///
/// Returns [`StorageError::UnknownDatatype`] if the operand types cannot be
/// compared.
pub fn compare(lhs: &Value, rhs: &Value, op: CompareOp) -> Result<bool> {
    use std::cmp::Ordering;

    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(b).ok_or_else(|| unordered_float(*a, *b))?
        }
        (Value::Int(a), Value::Float(b)) => promote_for_comparison(f64::from(*a), f64::from(*b))?,
        (Value::Float(a), Value::Int(b)) => promote_for_comparison(f64::from(*a), f64::from(*b))?,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(StorageError::UnknownDatatype(format!(
                "cannot compare {lhs:?} and {rhs:?}"
            )))
        }
    };

    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

fn promote_for_comparison(a: f64, b: f64) -> Result<std::cmp::Ordering> {
    a.partial_cmp(&b)
        .ok_or_else(|| unordered_float(a as f32, b as f32))
}

fn unordered_float(a: f32, b: f32) -> StorageError {
    StorageError::UnknownDatatype(format!("cannot compare NaN operands ({a}, {b})"))
}

fn as_bool(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(StorageError::UnknownDatatype(format!(
            "expected a boolean predicate result, got {other:?}"
        ))),
    }
}
