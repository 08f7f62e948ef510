//! In-memory grid of raw cell texts
//!
//! The grid is owned by the caller (typically a UI table or a CLI) and is only
//! read during an evaluation. References that fall outside its extent read as
//! empty text rather than failing.

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// A fixed-size table of raw cell contents, stored row by row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create a grid of `rows` x `cols` empty cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![String::new(); cols]; rows],
        }
    }

    /// Wrap existing rows. Rows may have different lengths; missing cells read
    /// as empty.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Borrow the rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Raw text at an address, or `""` when the address lies outside the grid
    pub fn get(&self, addr: CellAddress) -> &str {
        self.rows
            .get(addr.row as usize)
            .and_then(|row| row.get(addr.col as usize))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replace the text of a cell inside the grid extent
    pub fn set(&mut self, addr: CellAddress, value: impl Into<String>) -> Result<()> {
        let row_count = self.rows.len();
        let row = self
            .rows
            .get_mut(addr.row as usize)
            .ok_or_else(|| Error::RowOutOfBounds(addr.row, row_count.saturating_sub(1) as u32))?;
        let col_count = row.len();
        let cell = row.get_mut(addr.col as usize).ok_or_else(|| {
            Error::ColumnOutOfBounds(addr.col, col_count.saturating_sub(1) as u16)
        })?;
        *cell = value.into();
        Ok(())
    }

    /// Replace the text of a cell addressed in A1 notation
    pub fn set_a1(&mut self, reference: &str, value: impl Into<String>) -> Result<()> {
        let addr = CellAddress::parse(reference)?;
        self.set(addr, value)
    }

    /// Resolve an A1 reference (anchors allowed) to its raw text.
    ///
    /// Returns `None` when the text is not a cell reference at all, and
    /// `Some("")` for a well-formed reference outside the grid.
    pub fn resolve_cell(&self, reference: &str) -> Option<&str> {
        CellAddress::parse(reference).ok().map(|addr| self.get(addr))
    }

    /// Expand an `A1:B4` range into its raw texts, row-major from the
    /// top-left corner. Returns `None` when the text is not a range.
    ///
    /// The corners are normalized first, so `B2:A1` yields exactly the same
    /// sequence as `A1:B2`.
    pub fn expand_range(&self, range: &str) -> Option<Vec<String>> {
        CellRange::parse(range)
            .ok()
            .map(|range| self.range_values(range))
    }

    /// Raw texts of a parsed range, row-major
    pub fn range_values(&self, range: CellRange) -> Vec<String> {
        range.cells().map(|addr| self.get(addr).to_string()).collect()
    }
}

impl From<Vec<Vec<String>>> for Grid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::from_rows(rows)
    }
}

impl From<Vec<Vec<&str>>> for Grid {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        )
    }
}
