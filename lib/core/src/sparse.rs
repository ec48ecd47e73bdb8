//! List-of-lists sparse boolean matrix
//!
//! Each row keeps a strictly ascending list of set columns; the stored value
//! is implied `true`. Writes during a transform pass mostly arrive in
//! increasing column order per row, so [`SparseBoolMatrix::insert`] appends
//! without searching when the column is past the row's last entry.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sparse boolean matrix in row-major list-of-lists layout
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SparseBoolMatrix {
    n_cols: usize,
    rows: Vec<Vec<usize>>,
}

impl SparseBoolMatrix {
    /// Create an all-false matrix
    #[inline]
    #[must_use]
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![Vec::new(); n_rows],
        }
    }

    /// Build a matrix from per-row column lists (sorted and deduplicated)
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<usize>>) -> Result<Self> {
        let mut matrix = Self::new(rows.len(), n_cols);
        for (i, cols) in rows.iter().enumerate() {
            for &col in cols {
                matrix.insert(i, col)?;
            }
        }
        Ok(matrix)
    }

    /// `(rows, columns)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.n_cols)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of set cells
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Set columns of a row, ascending
    #[inline]
    pub fn row(&self, row: usize) -> Option<&[usize]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// All rows
    #[inline]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Whether cell `(row, col)` is set
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .map(|cols| cols.binary_search(&col).is_ok())
            .unwrap_or(false)
    }

    /// Set cell `(row, col)`; inserting an already set cell is a no-op
    pub fn insert(&mut self, row: usize, col: usize) -> Result<()> {
        if col >= self.n_cols {
            return Err(Error::StructuralMismatch(format!(
                "column {} out of range for {} columns",
                col, self.n_cols
            )));
        }
        let n_rows = self.rows.len();
        let cols = self.rows.get_mut(row).ok_or_else(|| {
            Error::StructuralMismatch(format!("row {} out of range for {} rows", row, n_rows))
        })?;

        match cols.last() {
            None => cols.push(col),
            Some(&last) if col > last => cols.push(col),
            Some(_) => {
                if let Err(pos) = cols.binary_search(&col) {
                    cols.insert(pos, col);
                }
            }
        }
        Ok(())
    }

    /// Set a fixed column for every listed row
    pub fn insert_column_for_rows(&mut self, rows: &[usize], col: usize) -> Result<()> {
        for &row in rows {
            self.insert(row, col)?;
        }
        Ok(())
    }

    /// Set `(rows[i], cols[i])` for every `i`
    pub fn insert_pairs(&mut self, rows: &[usize], cols: &[usize]) -> Result<()> {
        if rows.len() != cols.len() {
            return Err(Error::StructuralMismatch(format!(
                "{} row indices but {} column indices",
                rows.len(),
                cols.len()
            )));
        }
        for (&row, &col) in rows.iter().zip(cols) {
            self.insert(row, col)?;
        }
        Ok(())
    }

    /// Stack row blocks with the same column count on top of each other
    pub fn vstack(blocks: Vec<SparseBoolMatrix>) -> Result<Self> {
        let n_cols = blocks.first().map(|b| b.n_cols).unwrap_or(0);
        let mut rows = Vec::with_capacity(blocks.iter().map(|b| b.n_rows()).sum());
        for block in blocks {
            if block.n_cols != n_cols {
                return Err(Error::StructuralMismatch(format!(
                    "cannot stack blocks with {} and {} columns",
                    n_cols, block.n_cols
                )));
            }
            rows.extend(block.rows);
        }
        Ok(Self { n_cols, rows })
    }

    /// Compressed sparse row form: `(indptr, indices)`
    pub fn to_csr(&self) -> (Vec<usize>, Vec<usize>) {
        let mut indptr = Vec::with_capacity(self.rows.len() + 1);
        let mut indices = Vec::with_capacity(self.nnz());
        indptr.push(0);
        for cols in &self.rows {
            indices.extend_from_slice(cols);
            indptr.push(indices.len());
        }
        (indptr, indices)
    }

    /// Dense boolean rows
    pub fn to_dense(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|cols| {
                let mut dense = vec![false; self.n_cols];
                for &col in cols {
                    dense[col] = true;
                }
                dense
            })
            .collect()
    }
}
