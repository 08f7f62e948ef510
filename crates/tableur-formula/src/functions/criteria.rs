//! Criteria matching for NB.SI, SOMME.SI, MOYENNE.SI and their multi-criteria
//! forms
//!
//! A criteria is a text such as `">10"`, `"<>Paris"` or `"42"`:
//! - An optional leading operator (`>=`, `<=`, `<>`, `>`, `<`, `=`) followed by
//!   a non-empty operand
//! - Without an operator, the whole text is an equality operand
//!
//! Numbers are compared numerically only when both the operand and the cell
//! coerce to numbers. Otherwise ordering operators never match and equality
//! is case-insensitive text equality.

use lazy_regex::regex_captures;
use tableur_core::to_number;

/// Compiled criteria, applied to raw cell texts
#[derive(Debug, Clone)]
pub struct CriteriaMatcher {
    op: Option<ComparisonOp>,
    operand: String,
    number: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl CriteriaMatcher {
    /// Compile a criteria text
    pub fn new(criteria: &str) -> Self {
        match Self::try_parse_comparison(criteria) {
            Some((op, operand)) => Self {
                op: Some(op),
                number: as_number(to_number(operand)),
                operand: operand.to_lowercase(),
            },
            None => Self {
                op: None,
                number: as_number(to_number(criteria)),
                operand: criteria.to_lowercase(),
            },
        }
    }

    fn try_parse_comparison(s: &str) -> Option<(ComparisonOp, &str)> {
        let (_, op, operand) = regex_captures!(r"^(>=|<=|<>|>|<|=)\s*(.+)$"s, s)?;
        let op = match op {
            ">=" => ComparisonOp::GreaterEqual,
            "<=" => ComparisonOp::LessEqual,
            "<>" => ComparisonOp::NotEqual,
            ">" => ComparisonOp::GreaterThan,
            "<" => ComparisonOp::LessThan,
            _ => ComparisonOp::Equal,
        };
        Some((op, operand))
    }

    /// Whether a raw cell text satisfies the criteria
    pub fn matches(&self, cell: &str) -> bool {
        let cell_num = as_number(to_number(cell));
        let numbers = match (self.number, cell_num) {
            (Some(operand), Some(value)) => Some((value, operand)),
            _ => None,
        };

        match self.op {
            None => match self.number {
                Some(operand) => cell_num == Some(operand),
                None => cell.to_lowercase() == self.operand,
            },
            Some(op) => match (op, numbers) {
                (ComparisonOp::GreaterThan, Some((v, o))) => v > o,
                (ComparisonOp::GreaterEqual, Some((v, o))) => v >= o,
                (ComparisonOp::LessThan, Some((v, o))) => v < o,
                (ComparisonOp::LessEqual, Some((v, o))) => v <= o,
                (ComparisonOp::Equal, Some((v, o))) => v == o,
                (ComparisonOp::NotEqual, Some((v, o))) => v != o,
                (ComparisonOp::Equal, None) => cell.to_lowercase() == self.operand,
                (ComparisonOp::NotEqual, None) => cell.to_lowercase() != self.operand,
                _ => false,
            },
        }
    }
}

/// `None` for text that does not coerce to a number. Overflowing literals
/// stay infinite and compare as such.
fn as_number(n: f64) -> Option<f64> {
    if n.is_nan() {
        None
    } else {
        Some(n)
    }
}
