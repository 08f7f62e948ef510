//! # tableur
//!
//! A spreadsheet formula interpreter for teaching.
//!
//! Tableur evaluates Excel-style formulas written with French or English
//! conventions against a small grid of raw cell texts, explains how a result
//! was computed and points out likely mistakes.
//!
//! ## Features
//!
//! - French and English function names (`SOMME`/`SUM`, `NB.SI`/`COUNTIF`, ...)
//! - `;` or `,` argument separators and decimal commas
//! - Lazy `SI`/`IF`: evaluation errors in the untaken branch cannot fail the
//!   formula
//! - Evaluation traces, one node per call, argument and branch
//! - A linter backed by a catalog of about a hundred functions
//!
//! ## Example
//!
//! ```rust
//! use tableur::prelude::*;
//!
//! let mut sheet = Sheet::default();
//! sheet.set("A1", "15").unwrap();
//! sheet.set("A2", "8").unwrap();
//! sheet.define("Seuil", "10").unwrap();
//!
//! assert_eq!(sheet.try_evaluate("=NB.SI(A1:A2;\">\"&Seuil)").as_deref(), Some("1"));
//! assert_eq!(
//!     sheet.try_evaluate("=SI(A1>Seuil;\"Grand\";\"Petit\")").as_deref(),
//!     Some("Grand")
//! );
//! assert!(sheet.lint("=SI(A1>Seuil;\"Grand\")")[0].severity == Severity::Error);
//! ```

pub mod prelude;
pub mod sheet;

pub use sheet::{Sheet, Status, DEFAULT_COLS, DEFAULT_ROWS};

// Re-export core types
pub use tableur_core::{
    is_numeric, to_number, CellAddress, CellRange, Error, Grid, NamedConstant, NamedConstants,
    Result, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use tableur_formula::{
    catalog, evaluate_formula, format_value, lexer, lint_formula, supported_functions, trace,
    trace_evaluate, trace_evaluate_with, try_evaluate, try_evaluate_with, unsupported_functions,
    BooleanStyle, Diagnostic, FormatOptions, FormulaError, FormulaResult, FunctionDescriptor,
    Severity, TracedEvaluation, TraceTree, Value,
};
