//! Math functions

use super::{collect_numbers, number_arg};
use crate::error::FormulaResult;
use crate::value::Value;

/// SUM(number1, [number2], ...)
pub fn fn_sum(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Number(collect_numbers(args).iter().sum()))
}

/// AVERAGE(number1, [number2], ...), 0 when nothing is numeric
pub fn fn_average(args: &[Value]) -> FormulaResult<Value> {
    let nums = collect_numbers(args);
    if nums.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
}

/// MIN(number1, [number2], ...), 0 when nothing is numeric
pub fn fn_min(args: &[Value]) -> FormulaResult<Value> {
    let min = collect_numbers(args).into_iter().reduce(f64::min);
    Ok(Value::Number(min.unwrap_or(0.0)))
}

/// MAX(number1, [number2], ...), 0 when nothing is numeric
pub fn fn_max(args: &[Value]) -> FormulaResult<Value> {
    let max = collect_numbers(args).into_iter().reduce(f64::max);
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// ABS(number)
pub fn fn_abs(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0, "ABS")?.abs()))
}

/// Power of ten for a digit count; non-numeric counts mean 0
fn scale(args: &[Value], function: &str) -> FormulaResult<f64> {
    let digits = match args.get(1) {
        Some(_) => number_arg(args, 1, function)?,
        None => 0.0,
    };
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    Ok(10f64.powf(digits))
}

/// ROUND(number, [num_digits]), half away from zero
pub fn fn_round(args: &[Value]) -> FormulaResult<Value> {
    let n = number_arg(args, 0, "ROUND")?;
    let factor = scale(args, "ROUND")?;
    Ok(Value::Number((n * factor).round() / factor))
}

/// TRUNC(number, [num_digits]), toward zero
pub fn fn_trunc(args: &[Value]) -> FormulaResult<Value> {
    let n = number_arg(args, 0, "TRUNC")?;
    let factor = scale(args, "TRUNC")?;
    Ok(Value::Number((n * factor).trunc() / factor))
}

/// INT(number), rounds down
pub fn fn_int(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0, "INT")?.floor()))
}

/// MOD(number, divisor). The remainder has the sign of the dividend.
pub fn fn_mod(args: &[Value]) -> FormulaResult<Value> {
    let n = number_arg(args, 0, "MOD")?;
    let d = number_arg(args, 1, "MOD")?;
    Ok(Value::Number(n % d))
}

/// SQRT(number)
pub fn fn_sqrt(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0, "SQRT")?.sqrt()))
}

/// POWER(number, power)
pub fn fn_power(args: &[Value]) -> FormulaResult<Value> {
    let base = number_arg(args, 0, "POWER")?;
    let exponent = number_arg(args, 1, "POWER")?;
    Ok(Value::Number(base.powf(exponent)))
}
