//! # tableur-formula
//!
//! Formula interpreter for the tableur grid.
//!
//! This crate provides:
//! - Tokenization of formula text, French and English conventions alike
//!   (`;` or `,` separators, decimal comma, `VRAI`/`FAUX`)
//! - Single-pass evaluation with a lazy `SI`/`IF`
//! - Built-in functions under their French and English names
//! - An optional evaluation trace for visualization
//! - A function catalog and a static linter
//!
//! ## Example
//!
//! ```rust
//! use tableur_core::{Grid, NamedConstants};
//! use tableur_formula::try_evaluate;
//!
//! let grid = Grid::from(vec![vec!["15"], vec!["8"], vec!["22"], vec!["5"]]);
//! let names = NamedConstants::new();
//!
//! assert_eq!(try_evaluate("=SOMME(A1:A4)", &grid, &names).as_deref(), Some("50"));
//! assert_eq!(
//!     try_evaluate("=SI(A1>10;\"Grand\";\"Petit\")", &grid, &names).as_deref(),
//!     Some("Grand")
//! );
//! assert_eq!(try_evaluate("=RECHERCHEV(1;A1:A4;1)", &grid, &names), None);
//! ```

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod lint;
pub mod trace;
pub mod value;

pub use catalog::{ArgType, Category, FunctionDescriptor};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::Evaluator;
pub use functions::{registry, FunctionRegistry};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use lint::{lint_formula, Diagnostic, Severity};
pub use trace::{TraceKind, TraceNode, TraceTree};
pub use value::{format_value, BooleanStyle, FormatOptions, Value};

use tableur_core::{Grid, NamedConstants};
use tracing::debug;

/// Result of a traced evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TracedEvaluation {
    /// Display text, `None` when the formula is not evaluable
    pub result: Option<String>,
    /// What was recorded before evaluation ended
    pub trace: TraceTree,
    /// Why evaluation failed
    pub error: Option<String>,
}

impl TracedEvaluation {
    fn plain(result: Option<String>) -> Self {
        Self {
            result,
            trace: TraceTree::default(),
            error: None,
        }
    }

    /// Whether a result was produced
    pub fn is_evaluable(&self) -> bool {
        self.result.is_some()
    }
}

/// Evaluate a formula to a value. The leading `=` is optional.
pub fn evaluate_formula(formula: &str, grid: &Grid, names: &NamedConstants) -> FormulaResult<Value> {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let tokens = tokenize(body, names);
    Evaluator::new(&tokens, grid, names).evaluate()
}

/// Evaluate a formula to display text with default formatting.
///
/// Text not starting with `=` is a plain value and comes back unchanged.
/// `None` means the formula is empty or could not be evaluated.
pub fn try_evaluate(formula: &str, grid: &Grid, names: &NamedConstants) -> Option<String> {
    try_evaluate_with(formula, grid, names, &FormatOptions::default())
}

/// [`try_evaluate`] with explicit formatting options
pub fn try_evaluate_with(
    formula: &str,
    grid: &Grid,
    names: &NamedConstants,
    options: &FormatOptions,
) -> Option<String> {
    let Some(body) = formula.strip_prefix('=') else {
        return Some(formula.to_string());
    };
    if body.trim().is_empty() {
        return None;
    }

    match evaluate_formula(body, grid, names).and_then(|value| format_value(&value, options)) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(formula, error = %err, "formula not evaluable");
            None
        }
    }
}

/// Evaluate a formula and record how it was computed
pub fn trace_evaluate(formula: &str, grid: &Grid, names: &NamedConstants) -> TracedEvaluation {
    trace_evaluate_with(formula, grid, names, &FormatOptions::default())
}

/// [`trace_evaluate`] with explicit formatting options. On failure the trace
/// holds what was computed up to the error.
pub fn trace_evaluate_with(
    formula: &str,
    grid: &Grid,
    names: &NamedConstants,
    options: &FormatOptions,
) -> TracedEvaluation {
    let Some(body) = formula.strip_prefix('=') else {
        return TracedEvaluation::plain(Some(formula.to_string()));
    };
    if body.trim().is_empty() {
        return TracedEvaluation::plain(None);
    }

    let tokens = tokenize(body, names);
    let mut evaluator = Evaluator::new(&tokens, grid, names).with_trace();
    let outcome = evaluator
        .evaluate()
        .and_then(|value| format_value(&value, options));
    let trace = evaluator.into_trace().unwrap_or_default();

    match outcome {
        Ok(result) => TracedEvaluation {
            result: Some(result),
            trace,
            error: None,
        },
        Err(err) => {
            debug!(formula, error = %err, "traced formula not evaluable");
            TracedEvaluation {
                result: None,
                trace,
                error: Some(err.to_string()),
            }
        }
    }
}

/// Uppercase names of the functions called in `formula` that the local
/// evaluator does not compute, in order of first appearance
pub fn unsupported_functions(formula: &str) -> Vec<String> {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let tokens = tokenize(body, &NamedConstants::new());

    let mut found: Vec<String> = Vec::new();
    for pair in tokens.windows(2) {
        if let (TokenKind::Func(name), TokenKind::LParen) = (&pair[0].kind, &pair[1].kind) {
            if !registry().is_supported(name) && !found.contains(name) {
                found.push(name.clone());
            }
        }
    }
    found
}

/// Every function name the local evaluator computes, sorted
pub fn supported_functions() -> Vec<&'static str> {
    registry().supported_names()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid() -> Grid {
        Grid::from(vec![
            vec!["15", "0"],
            vec!["8", "2"],
            vec!["22", ""],
            vec!["5", "x"],
        ])
    }

    #[test]
    fn test_try_evaluate() {
        let names = NamedConstants::new();
        let g = grid();
        assert_eq!(try_evaluate("=SOMME(A1;A2;A3;A4)", &g, &names), Some("50".into()));
        assert_eq!(try_evaluate("=A1>10", &g, &names), Some("VRAI".into()));
        assert_eq!(try_evaluate("=1/3", &g, &names), Some("0.3333333333".into()));
        assert_eq!(try_evaluate("=A1/B1", &g, &names), Some("#DIV/0!".into()));
        assert_eq!(try_evaluate("=0,1+0,2", &g, &names), Some("0.3".into()));
    }

    #[test]
    fn test_plain_values_and_empty_formulas() {
        let names = NamedConstants::new();
        let g = grid();
        assert_eq!(try_evaluate("Bonjour", &g, &names), Some("Bonjour".into()));
        assert_eq!(try_evaluate("", &g, &names), Some(String::new()));
        assert_eq!(try_evaluate("=", &g, &names), None);
        assert_eq!(try_evaluate("=   ", &g, &names), None);
    }

    #[test]
    fn test_not_evaluable() {
        let names = NamedConstants::new();
        let g = grid();
        assert_eq!(try_evaluate("=RECHERCHEV(A1;A1:B4;2)", &g, &names), None);
        assert_eq!(try_evaluate("=VLOOKUP(A1,A1:B4,2)", &g, &names), None);
        assert_eq!(try_evaluate("=SOMME(1;", &g, &names), None);
        assert_eq!(try_evaluate("=A1:A4", &g, &names), None);
    }

    #[test]
    fn test_format_options() {
        let names = NamedConstants::new();
        let g = grid();
        let english = FormatOptions::new().with_boolean_style(BooleanStyle::English);
        assert_eq!(
            try_evaluate_with("=ET(VRAI;1)", &g, &names, &english),
            Some("TRUE".into())
        );
        let two = FormatOptions::new().with_decimals(2);
        assert_eq!(try_evaluate_with("=2/3", &g, &names, &two), Some("0.67".into()));
    }

    #[test]
    fn test_trace_evaluate() {
        let names = NamedConstants::new();
        let g = grid();
        let traced = trace_evaluate("=SOMME(A1;2)", &g, &names);
        assert_eq!(traced.result.as_deref(), Some("17"));
        assert_eq!(traced.error, None);
        assert_eq!(traced.trace.leaf_count(), 2);

        let failed = trace_evaluate("=SOMME(A1;NOPE(1))", &g, &names);
        assert!(!failed.is_evaluable());
        assert_eq!(failed.error.as_deref(), Some("Unknown function: NOPE"));
        // A1 was recorded before the failure
        assert!(failed.trace.leaf_count() >= 1);

        let plain = trace_evaluate("texte", &g, &names);
        assert_eq!(plain.result.as_deref(), Some("texte"));
        assert!(plain.trace.is_empty());
    }

    #[test]
    fn test_unsupported_functions() {
        assert_eq!(
            unsupported_functions("=SI(A1>0;RECHERCHEV(A1;B1:C4;2);AUJOURDHUI())+recherchev(1;B1:C2;2)"),
            vec!["RECHERCHEV".to_string(), "AUJOURDHUI".to_string()]
        );
        assert_eq!(unsupported_functions("=SOMME(A1:A4)"), Vec::<String>::new());
    }

    #[test]
    fn test_supported_functions() {
        let names = supported_functions();
        assert!(names.contains(&"SOMME"));
        assert!(names.contains(&"SI"));
        assert!(!names.contains(&"RECHERCHEV"));
    }
}
