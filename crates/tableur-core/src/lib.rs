//! # tableur-core
//!
//! Core data structures for the tableur formula interpreter.
//!
//! This crate provides the inputs a formula is evaluated against:
//! - [`Grid`] - A fixed-size table of raw cell texts
//! - [`CellAddress`] and [`CellRange`] - `A1` / `A1:B4` addressing
//! - [`NamedConstants`] - Case-insensitive named values
//! - [`to_number`] - The numeric coercion shared by every consumer
//!
//! ## Example
//!
//! ```rust
//! use tableur_core::{Grid, NamedConstants};
//!
//! let mut grid = Grid::new(12, 10);
//! grid.set_a1("A1", "15").unwrap();
//! assert_eq!(grid.resolve_cell("$A$1"), Some("15"));
//!
//! let mut names = NamedConstants::new();
//! names.define("TVA", "0,2").unwrap();
//! assert_eq!(names.get("tva"), Some("0,2"));
//! ```

pub mod cell;
pub mod coerce;
pub mod error;
pub mod grid;
pub mod named;

pub use cell::{CellAddress, CellRange, CellRangeIterator};
pub use coerce::{is_numeric, to_number};
pub use error::{Error, Result};
pub use grid::Grid;
pub use named::{NamedConstant, NamedConstants};

/// Number of addressable rows (rows are written with one or two digits)
pub const MAX_ROWS: u32 = 99;

/// Number of addressable columns (single letters A-Z)
pub const MAX_COLS: u16 = 26;
