//! Open/high/low/close bars built from traded prints only.
//!
//! Bid and ask prints never shape a bar's body; they only drive the
//! fill-forward when the clock crosses a bucket boundary.

use serde::Serialize;

use tapeflow_common::{Print, PrintKind, TapeError};

use crate::clock::IntervalClock;
use crate::ring::RingGrid;

const COL_OPEN: usize = 0;
const COL_HIGH: usize = 1;
const COL_LOW: usize = 2;
const COL_CLOSE: usize = 3;
const OHLC_COLS: usize = 4;

/// One completed (or in-progress) bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OhlcBar {
    /// First traded price of the bucket
    pub open: f64,
    /// Highest traded price of the bucket
    pub high: f64,
    /// Lowest traded price of the bucket
    pub low: f64,
    /// Last traded price; finalized when the bucket closes
    pub close: f64,
}

/// Bar series slaved to one clock; row `i` corresponds to clock row `i`.
///
/// Only the current row is mutable; a bar's close is finalized lazily when
/// the clock moves on, because it is only knowable once the bar is over.
#[derive(Debug, Clone)]
pub struct OhlcSeries {
    grid: RingGrid<f64>,
    clock_idx: usize,
    price_last: f64,
    row_has_traded: bool,
}

impl OhlcSeries {
    /// Create a series sized to its clock's capacity.
    #[must_use]
    pub fn new(clock: &IntervalClock, clock_idx: usize) -> Self {
        let mut grid = RingGrid::new(clock.rows(), OHLC_COLS, 0.0);
        grid.set_row_idx(clock.row_idx());
        Self {
            grid,
            clock_idx,
            price_last: 0.0,
            row_has_traded: false,
        }
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.clock_idx
    }

    /// Consume the clock's advance signal, then fold in the print.
    pub fn on_print(&mut self, clock: &IntervalClock, print: &Print) {
        self.roll_rows(clock);

        if print.kind != PrintKind::Traded {
            return;
        }
        let price = print.price;
        let idx = self.grid.row_idx();

        if !self.row_has_traded {
            self.grid.row_mut(idx).fill(price);
            self.row_has_traded = true;
            self.price_last = price;
            return;
        }
        if price > self.grid.get(idx, COL_HIGH) {
            self.grid.set(idx, COL_HIGH, price);
        }
        if price < self.grid.get(idx, COL_LOW) {
            self.grid.set(idx, COL_LOW, price);
        }
        self.price_last = price;
    }

    /// Last `n` bars ending at the current one, oldest first.
    pub fn last_bars(&self, n: usize) -> Result<Vec<OhlcBar>, TapeError> {
        Ok(self
            .grid
            .last_rows(n)?
            .into_iter()
            .map(|row| OhlcBar {
                open: row[COL_OPEN],
                high: row[COL_HIGH],
                low: row[COL_LOW],
                close: row[COL_CLOSE],
            })
            .collect())
    }

    /// Whether the current bucket has seen a trade yet
    #[must_use]
    pub const fn current_has_traded(&self) -> bool {
        self.row_has_traded
    }

    // Close the outgoing bar at the last traded price and flat-fill every
    // row the clock advanced over (skipped buckets plus the new one).
    fn roll_rows(&mut self, clock: &IntervalClock) {
        if clock.rows_advanced() == 0 {
            return;
        }
        let outgoing = self.grid.row_idx();
        self.grid.set(outgoing, COL_CLOSE, self.price_last);

        self.grid.set_row_idx(clock.row_idx());
        self.grid.fill_back(clock.rows_advanced(), self.price_last);
        self.row_has_traded = false;
    }
}
