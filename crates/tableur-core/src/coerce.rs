//! Numeric coercion of raw cell text
//!
//! Every arithmetic operator, aggregate and criteria comparison goes through
//! [`to_number`]. Text that is not a plain decimal number becomes NaN, which
//! callers treat as "not numeric".

/// Convert raw text to a number.
///
/// - empty text is NaN
/// - all whitespace is removed, so `"1 250"` is 1250 and whitespace-only
///   text is 0
/// - the first `,` is read as the decimal mark, so `"3,5"` is 3.5
/// - anything else that is not a decimal literal is NaN
///
/// ```
/// use tableur_core::to_number;
///
/// assert_eq!(to_number("42"), 42.0);
/// assert_eq!(to_number(" 3,5 "), 3.5);
/// assert!(to_number("abc").is_nan());
/// assert!(to_number("").is_nan());
/// assert_eq!(to_number("  "), 0.0);
/// ```
pub fn to_number(raw: &str) -> f64 {
    if raw.is_empty() {
        return f64::NAN;
    }
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return 0.0;
    }
    let normalized = compact.replacen(',', ".", 1);
    if !is_decimal_literal(&normalized) {
        return f64::NAN;
    }
    normalized.parse().unwrap_or(f64::NAN)
}

/// Whether a number can be read from the text
pub fn is_numeric(raw: &str) -> bool {
    !to_number(raw).is_nan()
}

/// `[+-]digits[.digits][e[+-]digits]`, with at least one mantissa digit
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let mut mantissa_digits = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
        mantissa_digits += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
            pos += 1;
        }
        let exp_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == exp_start {
            return false;
        }
    }

    pos == bytes.len()
}
