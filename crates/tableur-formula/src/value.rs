//! Runtime values and result formatting

use crate::error::{FormulaError, FormulaResult};
use std::fmt;
use tableur_core::to_number;

/// Display text for a non-finite numeric result
pub const DIV_ZERO: &str = "#DIV/0!";

/// Marker produced by an untaken `SI` branch whose evaluation failed
pub const NOT_AVAILABLE: &str = "#N/A";

/// A value flowing through the evaluator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum Value {
    /// Numeric value (may be NaN or infinite)
    Number(f64),
    /// Text value
    Text(String),
    /// Logical value
    Boolean(bool),
    /// Raw cell texts of a range, row-major
    Range(Vec<String>),
}

impl Value {
    /// Value of a raw cell or named constant: a number when the text coerces,
    /// the text itself otherwise
    pub fn from_raw(raw: &str) -> Self {
        let n = to_number(raw);
        if n.is_nan() {
            Value::Text(raw.to_string())
        } else {
            Value::Number(n)
        }
    }

    /// Numeric coercion. Booleans are 0/1, ranges are NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => to_number(s),
            Value::Range(_) => f64::NAN,
        }
    }

    /// Text coercion of a scalar. Booleans read `VRAI`/`FAUX`.
    pub fn to_text(&self) -> FormulaResult<String> {
        match self {
            Value::Number(n) => Ok(number_to_text(*n)),
            Value::Text(s) => Ok(s.clone()),
            Value::Boolean(b) => Ok(bool_to_text(*b, BooleanStyle::French).to_string()),
            Value::Range(_) => Err(FormulaError::ArrayInScalar("a text context".into())),
        }
    }

    /// Truthiness used by `SI`, `ET`, `OU` and `NON`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Range(_) => true,
        }
    }

    /// Whether this is a range value
    pub fn is_range(&self) -> bool {
        matches!(self, Value::Range(_))
    }

    /// Whether this is the empty text
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Short name of the variant, used in messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Range(_) => "range",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Range(values) => write!(f, "{{{}}}", values.join("; ")),
            other => match other.to_text() {
                Ok(text) => write!(f, "{}", text),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// Language of the displayed logical values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BooleanStyle {
    /// `VRAI` / `FAUX`
    #[default]
    French,
    /// `TRUE` / `FALSE`
    English,
}

/// Options controlling how a result is turned into display text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatOptions {
    /// Decimal digits kept when rounding numeric results
    pub decimals: u32,
    /// Language of logical values
    pub boolean_style: BooleanStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimals: 10,
            boolean_style: BooleanStyle::French,
        }
    }
}

impl FormatOptions {
    /// Create default options (10 decimals, French logical values)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of decimals kept
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Set the logical value language
    pub fn with_boolean_style(mut self, style: BooleanStyle) -> Self {
        self.boolean_style = style;
        self
    }
}

/// Format a top-level result for display.
///
/// Ranges are rejected: a formula must reduce to a single value.
pub fn format_value(value: &Value, options: &FormatOptions) -> FormulaResult<String> {
    match value {
        Value::Boolean(b) => Ok(bool_to_text(*b, options.boolean_style).to_string()),
        Value::Number(n) => Ok(format_number(*n, options.decimals)),
        Value::Text(s) => Ok(s.clone()),
        Value::Range(_) => Err(FormulaError::ArrayInScalar("the formula result".into())),
    }
}

/// Round to `decimals` digits and print without trailing zeros.
/// Non-finite numbers print as `#DIV/0!`.
pub fn format_number(n: f64, decimals: u32) -> String {
    if !n.is_finite() {
        return DIV_ZERO.to_string();
    }
    let factor = 10f64.powi(decimals.min(300) as i32);
    let scaled = n * factor;
    let rounded = if scaled.is_finite() {
        scaled.round() / factor
    } else {
        n
    };
    number_to_text(rounded)
}

pub(crate) fn bool_to_text(b: bool, style: BooleanStyle) -> &'static str {
    match (style, b) {
        (BooleanStyle::French, true) => "VRAI",
        (BooleanStyle::French, false) => "FAUX",
        (BooleanStyle::English, true) => "TRUE",
        (BooleanStyle::English, false) => "FALSE",
    }
}

fn number_to_text(n: f64) -> String {
    if !n.is_finite() {
        return DIV_ZERO.to_string();
    }
    if n == 0.0 {
        // also covers -0
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        // 1e+21, 1.5e-7
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    format!("{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_raw() {
        assert_eq!(Value::from_raw("15"), Value::Number(15.0));
        assert_eq!(Value::from_raw("3,5"), Value::Number(3.5));
        assert_eq!(Value::from_raw("Paris"), Value::Text("Paris".into()));
        assert_eq!(Value::from_raw(""), Value::Text(String::new()));
        assert_eq!(Value::from_raw("  "), Value::Number(0.0));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Boolean(false).to_number(), 0.0);
        assert!(Value::Text("abc".into()).to_number().is_nan());
        assert!(Value::Range(vec!["1".into()]).to_number().is_nan());

        assert_eq!(Value::Boolean(true).to_text().unwrap(), "VRAI");
        assert_eq!(Value::Number(2.5).to_text().unwrap(), "2.5");
        assert_eq!(Value::Number(50.0).to_text().unwrap(), "50");
        assert!(Value::Range(vec![]).to_text().is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(2.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Text("x".into()).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Range(vec![]).is_truthy());
    }

    #[test]
    fn test_format_value() {
        let options = FormatOptions::default();
        assert_eq!(format_value(&Value::Number(50.0), &options).unwrap(), "50");
        assert_eq!(
            format_value(&Value::Number(0.1 + 0.2), &options).unwrap(),
            "0.3"
        );
        assert_eq!(format_value(&Value::Number(-0.0), &options).unwrap(), "0");
        assert_eq!(
            format_value(&Value::Number(f64::INFINITY), &options).unwrap(),
            "#DIV/0!"
        );
        assert_eq!(
            format_value(&Value::Number(f64::NAN), &options).unwrap(),
            "#DIV/0!"
        );
        assert_eq!(format_value(&Value::Boolean(false), &options).unwrap(), "FAUX");
        assert!(format_value(&Value::Range(vec!["1".into()]), &options).is_err());
    }

    #[test]
    fn test_format_options() {
        let english = FormatOptions::new().with_boolean_style(BooleanStyle::English);
        assert_eq!(format_value(&Value::Boolean(true), &english).unwrap(), "TRUE");

        let two = FormatOptions::new().with_decimals(2);
        assert_eq!(format_value(&Value::Number(2.0 / 3.0), &two).unwrap(), "0.67");
        assert_eq!(format_number(1.0 / 3.0, 10), "0.3333333333");
    }

    #[test]
    fn test_exponent_notation() {
        assert_eq!(format_number(1e21, 0), "1e+21");
        assert_eq!(format_number(-2.5e22, 0), "-2.5e+22");
        assert_eq!(format_number(1.5e-7, 10), "1.5e-7");
        assert_eq!(format_number(1e20, 0), "100000000000000000000");
        assert_eq!(format_number(0.000001, 10), "0.000001");
        assert_eq!(Value::Number(1e300).to_text().unwrap(), "1e+300");
    }
}
