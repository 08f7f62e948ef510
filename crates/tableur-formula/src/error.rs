//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Generic syntax error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A token of the wrong kind where another one was required
    #[error("Expected {expected}, found '{found}' at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    /// The token stream ended in the middle of an expression
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// Tokens left over after the top-level expression
    #[error("Unexpected '{token}' at offset {offset} after the end of the expression")]
    TrailingTokens { token: String, offset: usize },

    /// Function name not known to the evaluator
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Function known to the catalog but not evaluated locally
    #[error("Function not supported by the local evaluator: {0}")]
    Unsupported(String),

    /// Named constant that is not defined
    #[error("Undefined name: {0}")]
    UndefinedName(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A range used where a single value is required
    #[error("A range cannot be used as a single value in {0}")]
    ArrayInScalar(String),

    /// Addressing error from the core crate
    #[error(transparent)]
    Core(#[from] tableur_core::Error),
}

impl FormulaError {
    /// True for errors raised while reading the formula's structure, as
    /// opposed to errors raised while computing a value
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            FormulaError::Parse(_)
                | FormulaError::UnexpectedToken { .. }
                | FormulaError::UnexpectedEnd
                | FormulaError::TrailingTokens { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_syntax() {
        assert!(FormulaError::UnexpectedEnd.is_syntax());
        assert!(FormulaError::Parse("x".into()).is_syntax());
        assert!(!FormulaError::UnknownFunction("NOPE".into()).is_syntax());
        assert!(!FormulaError::UndefinedName("TVA".into()).is_syntax());
    }
}
