//! Logical functions
//!
//! `SI`/`IF` is not here: its branches must not be evaluated before the test,
//! so the evaluator handles it directly.

use super::arg;
use crate::error::FormulaResult;
use crate::value::Value;

/// Truthiness of a raw range member: logical words, then numeric truthiness
fn member_truthy(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("VRAI") || trimmed.eq_ignore_ascii_case("TRUE") {
        return true;
    }
    if trimmed.eq_ignore_ascii_case("FAUX") || trimmed.eq_ignore_ascii_case("FALSE") {
        return false;
    }
    let n = tableur_core::to_number(raw);
    n != 0.0 && !n.is_nan()
}

/// Truthiness of every value an argument stands for, in order
fn truth_values(args: &[Value]) -> impl Iterator<Item = bool> + '_ {
    args.iter().flat_map(|arg| -> Box<dyn Iterator<Item = bool> + '_> {
        match arg {
            Value::Range(values) => Box::new(values.iter().map(|v| member_truthy(v))),
            scalar => Box::new(std::iter::once(scalar.is_truthy())),
        }
    })
}

/// AND(logical1, [logical2], ...)
pub fn fn_and(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(truth_values(args).all(|b| b)))
}

/// OR(logical1, [logical2], ...)
pub fn fn_or(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(truth_values(args).any(|b| b)))
}

/// NOT(logical)
pub fn fn_not(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(!arg(args, 0, "NOT")?.is_truthy()))
}

/// IFERROR(value, value_if_error)
///
/// Values carry no error state, so a value that reached this call is always
/// returned as is.
pub fn fn_iferror(args: &[Value]) -> FormulaResult<Value> {
    Ok(arg(args, 0, "IFERROR")?.clone())
}
