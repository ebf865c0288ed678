//! Row-wise evaluation of a compiled predicate. L7's value calculators
//! use this to turn a `CompiledFilter` into a per-row `bool` without a
//! round trip through the columnar engine, since the single-row
//! evaluation sits inside an already-materialized join (see `join`).

use crate::filter::expr::{Expr, Literal};

/// A column's runtime value, resolved by the caller's row accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Num(Option<f64>),
    Str(Option<String>),
}

fn literal_value(lit: &Literal) -> ColumnValue {
    match lit {
        Literal::Number(n) => ColumnValue::Num(Some(*n)),
        Literal::Text(s) => ColumnValue::Str(Some(s.clone())),
    }
}

fn is_null(v: &ColumnValue) -> bool {
    matches!(v, ColumnValue::Num(None) | ColumnValue::Str(None))
}

fn resolve(expr: &Expr, lookup: &dyn Fn(&str) -> ColumnValue) -> ColumnValue {
    match expr {
        Expr::Column(name) => lookup(name),
        Expr::Literal(lit) => literal_value(lit),
        other => panic!("{other:?} is not a scalar operand"),
    }
}

fn eq(a: &ColumnValue, b: &ColumnValue) -> Option<bool> {
    match (a, b) {
        (ColumnValue::Num(Some(x)), ColumnValue::Num(Some(y))) => Some(x == y),
        (ColumnValue::Str(Some(x)), ColumnValue::Str(Some(y))) => Some(x == y),
        _ if is_null(a) || is_null(b) => None,
        _ => None,
    }
}

fn numeric_cmp(a: &ColumnValue, b: &ColumnValue, op: impl Fn(f64, f64) -> bool) -> Option<bool> {
    match (a, b) {
        (ColumnValue::Num(Some(x)), ColumnValue::Num(Some(y))) => Some(op(*x, *y)),
        _ => None,
    }
}

/// Evaluates `expr` against a single row, using `lookup` to resolve
/// column identifiers. A `None` anywhere a comparison needs a value
/// yields `None` ("unknown"); `and`/`or` use three-valued logic.
pub fn eval_bool(expr: &Expr, lookup: &dyn Fn(&str) -> ColumnValue) -> Option<bool> {
    match expr {
        Expr::Eq(l, r) => eq(&resolve(l, lookup), &resolve(r, lookup)),
        Expr::Ne(l, r) => eq(&resolve(l, lookup), &resolve(r, lookup)).map(|b| !b),
        Expr::Lt(l, r) => numeric_cmp(&resolve(l, lookup), &resolve(r, lookup), |x, y| x < y),
        Expr::Le(l, r) => numeric_cmp(&resolve(l, lookup), &resolve(r, lookup), |x, y| x <= y),
        Expr::Gt(l, r) => numeric_cmp(&resolve(l, lookup), &resolve(r, lookup), |x, y| x > y),
        Expr::Ge(l, r) => numeric_cmp(&resolve(l, lookup), &resolve(r, lookup), |x, y| x >= y),
        Expr::In(e, literals) => {
            let value = resolve(e, lookup);
            if is_null(&value) {
                return None;
            }
            Some(literals.iter().any(|l| eq(&value, &literal_value(l)) == Some(true)))
        }
        Expr::IsNull(e) => Some(is_null(&resolve(e, lookup))),
        Expr::IsNotNull(e) => Some(!is_null(&resolve(e, lookup))),
        Expr::And(l, r) => match (eval_bool(l, lookup), eval_bool(r, lookup)) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        Expr::Or(l, r) => match (eval_bool(l, lookup), eval_bool(r, lookup)) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        Expr::Not(e) => eval_bool(e, lookup).map(|b| !b),
        Expr::Column(_) | Expr::Literal(_) => None,
    }
}
