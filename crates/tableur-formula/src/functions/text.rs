//! Text functions

use super::{number_arg, text_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use lazy_regex::regex_replace_all;

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    s.chars().skip(start_1based - 1).take(n).collect()
}

/// Character count argument: truncated, negative counts rejected
fn count_arg(args: &[Value], index: usize, default: usize, function: &str) -> FormulaResult<usize> {
    if args.get(index).is_none() {
        return Ok(default);
    }
    let n = number_arg(args, index, function)?;
    if n.is_nan() || n < 0.0 {
        return Err(FormulaError::Argument(format!(
            "{}: the number of characters must be a positive number",
            function
        )));
    }
    Ok(n.trunc() as usize)
}

/// CONCATENATE(text1, [text2], ...). Ranges are joined without separator.
pub fn fn_concatenate(args: &[Value]) -> FormulaResult<Value> {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::Range(values) => values.iter().for_each(|v| result.push_str(v)),
            scalar => result.push_str(&scalar.to_text()?),
        }
    }
    Ok(Value::Text(result))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "LEFT")?;
    let n = count_arg(args, 1, 1, "LEFT")?;
    Ok(Value::Text(take_left(&text, n)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "RIGHT")?;
    let n = count_arg(args, 1, 1, "RIGHT")?;
    Ok(Value::Text(take_right(&text, n)))
}

/// MID(text, start_num, num_chars), `start_num` counted from 1
pub fn fn_mid(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "MID")?;
    let start = number_arg(args, 1, "MID")?;
    if start.is_nan() || start < 1.0 {
        return Err(FormulaError::Argument(
            "MID: the start position must be at least 1".into(),
        ));
    }
    let n = count_arg(args, 2, 0, "MID")?;
    Ok(Value::Text(take_mid(&text, start.trunc() as usize, n)))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Text(text_arg(args, 0, "UPPER")?.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Text(text_arg(args, 0, "LOWER")?.to_lowercase()))
}

/// PROPER(text) - first letter of each word uppercase, the rest lowercase
pub fn fn_proper(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "PROPER")?;
    let proper = regex_replace_all!(r"\w\S*", &text, |word: &str| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.as_str().to_lowercase().chars())
                .collect::<String>(),
            None => String::new(),
        }
    });
    Ok(Value::Text(proper.into_owned()))
}

/// LEN(text) - number of characters
pub fn fn_len(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "LEN")?;
    Ok(Value::Number(text.chars().count() as f64))
}

/// TRIM(text) - strips the ends and collapses inner whitespace runs
pub fn fn_trim(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "TRIM")?;
    let trimmed = regex_replace_all!(r"\s+", text.trim(), " ");
    Ok(Value::Text(trimmed.into_owned()))
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
///
/// Without an instance every match is replaced. With one, only the Nth match
/// (counted from 1, left to right) is.
pub fn fn_substitute(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0, "SUBSTITUTE")?;
    let old = text_arg(args, 1, "SUBSTITUTE")?;
    let new = text_arg(args, 2, "SUBSTITUTE")?;

    if old.is_empty() {
        return Ok(Value::Text(text));
    }

    if args.get(3).is_none() {
        return Ok(Value::Text(text.replace(&old, &new)));
    }

    let instance = number_arg(args, 3, "SUBSTITUTE")?;
    if instance.is_nan() || instance < 1.0 {
        return Ok(Value::Text(text));
    }
    let instance = instance.trunc() as usize;

    match text.match_indices(&old).nth(instance - 1) {
        Some((idx, _)) => {
            let mut result = String::with_capacity(text.len());
            result.push_str(&text[..idx]);
            result.push_str(&new);
            result.push_str(&text[idx + old.len()..]);
            Ok(Value::Text(result))
        }
        None => Ok(Value::Text(text)),
    }
}

/// TEXT(value, [format_text])
///
/// Format codes are not interpreted: the value is converted to text as is.
pub fn fn_text(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Text(text_arg(args, 0, "TEXT")?))
}
