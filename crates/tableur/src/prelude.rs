//! Prelude module - common imports for tableur users
//!
//! ```rust
//! use tableur::prelude::*;
//! ```

pub use crate::{
    BooleanStyle,
    // Grid types
    CellAddress,
    CellRange,
    // Lint types
    Diagnostic,
    // Error types
    Error,
    FormatOptions,
    FormulaError,
    FormulaResult,
    Grid,
    NamedConstants,
    Result,
    Severity,
    // Main types
    Sheet,
    Status,
    TraceTree,
    TracedEvaluation,
    Value,
};
