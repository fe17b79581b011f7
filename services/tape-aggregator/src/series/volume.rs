//! Per-interval bid/ask/traded volume sums.

use serde::Serialize;

use tapeflow_common::{Print, TapeError};

use crate::clock::IntervalClock;
use crate::ring::RingGrid;

const VOLUME_COLS: usize = 3;

/// Volume accumulated in one bucket, split by print kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeRow {
    /// Size quoted at the bid
    pub bid: f64,
    /// Size quoted at the ask
    pub ask: f64,
    /// Size actually traded
    pub traded: f64,
}

/// Volume series slaved to one clock; skipped buckets are zero-filled.
#[derive(Debug, Clone)]
pub struct VolumeSeries {
    grid: RingGrid<f64>,
    clock_idx: usize,
}

impl VolumeSeries {
    /// Create a series sized to its clock's capacity.
    #[must_use]
    pub fn new(clock: &IntervalClock, clock_idx: usize) -> Self {
        let mut grid = RingGrid::new(clock.rows(), VOLUME_COLS, 0.0);
        grid.set_row_idx(clock.row_idx());
        Self { grid, clock_idx }
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.clock_idx
    }

    /// Consume the clock's advance signal, then add the print's size to the
    /// column matching its kind.
    pub fn on_print(&mut self, clock: &IntervalClock, print: &Print) {
        if clock.rows_advanced() > 0 {
            self.grid.set_row_idx(clock.row_idx());
            self.grid.fill_back(clock.rows_advanced(), 0.0);
        }
        let idx = self.grid.row_idx();
        let col = print.kind.as_index();
        let sum = self.grid.get(idx, col);
        self.grid.set(idx, col, sum + print.size);
    }

    /// Last `n` volume rows ending at the current bucket, oldest first.
    pub fn last_rows(&self, n: usize) -> Result<Vec<VolumeRow>, TapeError> {
        Ok(self
            .grid
            .last_rows(n)?
            .into_iter()
            .map(|row| VolumeRow {
                bid: row[0],
                ask: row[1],
                traded: row[2],
            })
            .collect())
    }
}
