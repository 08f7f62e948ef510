//! A grid and its named constants, evaluated together

use tableur_core::{Grid, NamedConstants, Result};
use tableur_formula::{
    evaluate_formula, lint_formula, trace_evaluate_with, try_evaluate_with, unsupported_functions,
    Diagnostic, FormatOptions, FormulaResult, TracedEvaluation, Value,
};

/// Rows of a default sheet
pub const DEFAULT_ROWS: usize = 12;

/// Columns of a default sheet
pub const DEFAULT_COLS: usize = 10;

/// How a formula fares against the local evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Computed locally; the display text
    Exact(String),
    /// Calls functions the local evaluator does not compute
    Unsupported(Vec<String>),
    /// Empty, malformed, or failed during evaluation
    Invalid,
}

/// The state a formula is evaluated against: cell texts, named constants and
/// display options
#[derive(Debug, Clone)]
pub struct Sheet {
    grid: Grid,
    names: NamedConstants,
    format: FormatOptions,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Sheet {
    /// Create an empty sheet of `rows` x `cols` cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_grid(Grid::new(rows, cols))
    }

    /// Wrap an existing grid
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            names: NamedConstants::new(),
            format: FormatOptions::default(),
        }
    }

    /// Use these display options for results
    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    /// Use these named constants
    pub fn with_names(mut self, names: NamedConstants) -> Self {
        self.names = names;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn names(&self) -> &NamedConstants {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NamedConstants {
        &mut self.names
    }

    pub fn format(&self) -> &FormatOptions {
        &self.format
    }

    /// Set a cell by its `A1` reference
    pub fn set(&mut self, reference: &str, value: impl Into<String>) -> Result<()> {
        self.grid.set_a1(reference, value)
    }

    /// Define or replace a named constant
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.names.define(name, value)
    }

    /// Evaluate to a value
    pub fn evaluate(&self, formula: &str) -> FormulaResult<Value> {
        evaluate_formula(formula, &self.grid, &self.names)
    }

    /// Evaluate to display text, `None` when not evaluable
    pub fn try_evaluate(&self, formula: &str) -> Option<String> {
        try_evaluate_with(formula, &self.grid, &self.names, &self.format)
    }

    /// Evaluate and record a trace
    pub fn trace(&self, formula: &str) -> TracedEvaluation {
        trace_evaluate_with(formula, &self.grid, &self.names, &self.format)
    }

    /// Static checks
    pub fn lint(&self, formula: &str) -> Vec<Diagnostic> {
        lint_formula(formula, &self.names)
    }

    /// Evaluate and classify the outcome
    pub fn status(&self, formula: &str) -> Status {
        if let Some(text) = self.try_evaluate(formula) {
            return Status::Exact(text);
        }
        let unsupported = unsupported_functions(formula);
        if unsupported.is_empty() {
            Status::Invalid
        } else {
            Status::Unsupported(unsupported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tableur_formula::BooleanStyle;

    #[test]
    fn test_default_size() {
        let sheet = Sheet::default();
        assert_eq!(sheet.grid().row_count(), DEFAULT_ROWS);
        assert_eq!(sheet.grid().col_count(), DEFAULT_COLS);
    }

    #[test]
    fn test_set_and_define() {
        let mut sheet = Sheet::new(2, 2);
        sheet.set("B2", "4").unwrap();
        sheet.define("Coef", "1,5").unwrap();
        assert_eq!(sheet.try_evaluate("=B2*coef"), Some("6".into()));
        assert!(sheet.set("C1", "x").is_err());
        assert!(sheet.define("  ", "x").is_err());
    }

    #[test]
    fn test_status() {
        let mut sheet = Sheet::default();
        sheet.set("A1", "3").unwrap();
        assert_eq!(sheet.status("=A1*2"), Status::Exact("6".into()));
        assert_eq!(
            sheet.status("=RECHERCHEV(A1;A1:B2;2)"),
            Status::Unsupported(vec!["RECHERCHEV".into()])
        );
        assert_eq!(sheet.status("=SOMME(1;"), Status::Invalid);
    }

    #[test]
    fn test_format_options_apply() {
        let sheet = Sheet::default()
            .with_format(FormatOptions::new().with_boolean_style(BooleanStyle::English));
        assert_eq!(sheet.try_evaluate("=1<2"), Some("TRUE".into()));
        assert_eq!(sheet.trace("=1<2").result.as_deref(), Some("TRUE"));
    }
}
