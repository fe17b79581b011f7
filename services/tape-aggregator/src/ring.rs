//! Fixed-capacity circular row storage shared by every time-aligned series.

use tapeflow_common::TapeError;

/// Fixed `rows x cols` grid with a circular row cursor.
///
/// Storage never resizes and rows are never zeroed implicitly; the fill
/// policy on advance belongs to the caller.
#[derive(Debug, Clone)]
pub struct RingGrid<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    row_idx: usize,
}

impl<T: Copy> RingGrid<T> {
    /// Allocate a `rows x cols` grid initialized to `fill`.
    #[must_use]
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            data: vec![fill; rows * cols],
            rows,
            cols,
            row_idx: 0,
        }
    }

    /// Row capacity
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Columns per row
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Current row cursor
    #[must_use]
    pub const fn row_idx(&self) -> usize {
        self.row_idx
    }

    /// Move the cursor forward by `n` rows, wrapping.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.row_idx = (self.row_idx + n % self.rows) % self.rows;
    }

    /// Pin the cursor to `idx` (series slaved to a clock mirror its cursor).
    #[inline]
    pub fn set_row_idx(&mut self, idx: usize) {
        debug_assert!(idx < self.rows);
        self.row_idx = idx % self.rows;
    }

    /// Row index `steps` behind `idx`, wrapping.
    #[inline]
    #[must_use]
    pub const fn idx_back(&self, idx: usize, steps: usize) -> usize {
        (idx + self.rows - steps % self.rows) % self.rows
    }

    /// Borrow row `idx`.
    #[inline]
    #[must_use]
    pub fn row(&self, idx: usize) -> &[T] {
        &self.data[idx * self.cols..(idx + 1) * self.cols]
    }

    /// Mutably borrow row `idx`.
    #[inline]
    pub fn row_mut(&mut self, idx: usize) -> &mut [T] {
        &mut self.data[idx * self.cols..(idx + 1) * self.cols]
    }

    /// Read one cell.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Write one cell.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Last `n` rows ending at the cursor, oldest first, as owned copies.
    pub fn last_rows(&self, n: usize) -> Result<Vec<Vec<T>>, TapeError> {
        if n > self.rows {
            return Err(TapeError::InvalidArgument(format!(
                "requested {n} rows from a {}-row buffer",
                self.rows
            )));
        }
        let mut out = Vec::with_capacity(n);
        for back in (0..n).rev() {
            out.push(self.row(self.idx_back(self.row_idx, back)).to_vec());
        }
        Ok(out)
    }

    /// Overwrite every cell of the `n` rows ending at the cursor with `value`.
    pub fn fill_back(&mut self, n: usize, value: T) {
        let n = n.min(self.rows);
        let mut idx = self.row_idx;
        for _ in 0..n {
            self.row_mut(idx).fill(value);
            idx = self.idx_back(idx, 1);
        }
    }
}
