//! Keyed decaying-sum table: the shared core of every rolling aggregate.
//!
//! Each key row carries a summation column plus one column per clock
//! sub-interval, used as a decaying ring: when the clock advances, the
//! columns falling out of the window are subtracted from the summation
//! column and reused for the new sub-interval. Keeps moving-window sums in
//! amortized O(1) per print with no history rescans.

use tracing::error;

use tapeflow_common::constants::value::VALUE_EPS;
use tapeflow_common::TapeError;

use crate::clock::IntervalClock;

/// Column 0 of every row: the running total of the live sub-interval columns
pub const SUM_COL: usize = 0;

/// Dynamic table of value buckets with a moving-window sum per bucket.
///
/// Keys grow contiguously at fixed spacing toward whatever values arrive and
/// are never removed or reordered. All key comparisons go through a fixed
/// epsilon because keys are discretized prices/sizes subject to rounding.
#[derive(Debug, Clone)]
pub struct RollingSumTable {
    keys: Vec<f64>,
    rows: Vec<Vec<f64>>,
    min_value_interval: f64,
    update_interval: u32,
    timeframe: u32,
    col_count: usize,
    col_idx: usize,
    key_min: f64,
    key_max: f64,
    key_min_live: f64,
    key_max_live: f64,
    key_last: f64,
    clock_idx: usize,
}

impl RollingSumTable {
    /// Create a table spanning `timeframe` minutes, bucketed at
    /// `min_value_interval`, driven by `clock`.
    pub fn new(
        clock: &IntervalClock,
        clock_idx: usize,
        timeframe: u32,
        min_value_interval: f64,
        alloc: usize,
    ) -> Result<Self, TapeError> {
        if timeframe == 0 {
            return Err(TapeError::InvalidConfiguration(
                "window timeframe must be positive".to_string(),
            ));
        }
        if min_value_interval <= 0.0 {
            return Err(TapeError::InvalidConfiguration(
                "bucket width must be positive".to_string(),
            ));
        }
        let update_interval = clock.interval_minutes();
        let sub_intervals = timeframe.div_ceil(update_interval) as usize;
        if sub_intervals > clock.rows() {
            // the clock clamps its advance report to capacity; a window wider
            // than that would under-evict after large gaps
            return Err(TapeError::InvalidConfiguration(format!(
                "timeframe {timeframe}m exceeds clock capacity ({} rows of {update_interval}m)",
                clock.rows()
            )));
        }

        Ok(Self {
            keys: Vec::with_capacity(alloc),
            rows: Vec::with_capacity(alloc),
            min_value_interval,
            update_interval,
            timeframe,
            col_count: 1 + sub_intervals,
            col_idx: 1,
            key_min: 0.0,
            key_max: 0.0,
            key_min_live: 0.0,
            key_max_live: 0.0,
            key_last: 0.0,
            clock_idx,
        })
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.clock_idx
    }

    /// Window span in minutes
    #[must_use]
    pub const fn timeframe(&self) -> u32 {
        self.timeframe
    }

    /// Sub-interval granularity in minutes (the owning clock's resolution)
    #[must_use]
    pub const fn update_interval(&self) -> u32 {
        self.update_interval
    }

    /// Columns per row, summation column included
    #[must_use]
    pub const fn col_count(&self) -> usize {
        self.col_count
    }

    /// Cursor into the live sub-interval column
    #[must_use]
    pub const fn col_idx(&self) -> usize {
        self.col_idx
    }

    /// Bucket width
    #[must_use]
    pub const fn min_value_interval(&self) -> f64 {
        self.min_value_interval
    }

    /// Bucket boundaries, ascending
    #[must_use]
    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Borrow the column array of key row `idx`.
    #[must_use]
    pub fn row(&self, idx: usize) -> &[f64] {
        &self.rows[idx]
    }

    /// Bounds of the sub-range currently holding any value
    #[must_use]
    pub const fn live_bounds(&self) -> (f64, f64) {
        (self.key_min_live, self.key_max_live)
    }

    /// Key most recently credited by [`RollingSumTable::add`]
    #[must_use]
    pub const fn key_last(&self) -> f64 {
        self.key_last
    }

    /// Bucket index for `k`, or `None` outside the current bounds.
    #[must_use]
    pub fn key_to_idx(&self, k: f64) -> Option<usize> {
        if self.keys.is_empty()
            || k - self.key_min < -VALUE_EPS
            || k - self.key_max > VALUE_EPS
        {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(((k - self.key_min) / self.min_value_interval + VALUE_EPS) as usize)
    }

    /// Current window total for bucket `k`, or `None` outside bounds.
    #[must_use]
    pub fn sum_at(&self, k: f64) -> Option<f64> {
        self.key_to_idx(k).map(|idx| self.rows[idx][SUM_COL])
    }

    /// Owned `(key, window total)` snapshot of the whole bucket table.
    #[must_use]
    pub fn bucket_sums(&self) -> Vec<(f64, f64)> {
        self.keys
            .iter()
            .zip(&self.rows)
            .map(|(&k, row)| (k, row[SUM_COL]))
            .collect()
    }

    /// Grow the key range one bucket at a time until `k` is inside it.
    ///
    /// O(distance); callers feed adjacent ticks, so amortized cost is low.
    pub fn ensure_key(&mut self, k: f64) {
        if self.keys.is_empty() {
            self.keys.push(k);
            self.rows.push(vec![0.0; self.col_count]);
            self.key_min = k;
            self.key_max = k;
            self.key_min_live = k;
            self.key_max_live = k;
            return;
        }
        while k - self.key_min < -VALUE_EPS {
            self.key_min -= self.min_value_interval;
            self.keys.insert(0, self.key_min);
            self.rows.insert(0, vec![0.0; self.col_count]);
            self.key_min_live = self.key_min;
        }
        while k - self.key_max > VALUE_EPS {
            self.key_max += self.min_value_interval;
            self.keys.push(self.key_max);
            self.rows.push(vec![0.0; self.col_count]);
            self.key_max_live = self.key_max;
        }
    }

    /// Credit `v` to bucket `k`: summation column plus the live sub-interval
    /// column, widening the live bounds.
    pub fn add(&mut self, k: f64, v: f64) {
        let Some(idx) = self.key_to_idx(k) else {
            // reaching here means a caller skipped ensure_key or a window was
            // misconfigured; fatal while developing, a logged no-op in production
            debug_assert!(false, "key {k} outside table bounds");
            error!(key = k, "dropping value credited outside table bounds");
            return;
        };
        self.rows[idx][SUM_COL] += v;
        self.rows[idx][self.col_idx] += v;

        if k - self.key_min_live < -VALUE_EPS {
            self.key_min_live = k;
        }
        if k - self.key_max_live > VALUE_EPS {
            self.key_max_live = k;
        }
        self.key_last = k;
    }

    /// Evict the sub-interval columns that fell out of the window. Must run
    /// before any [`RollingSumTable::add`] for the same print, so new values
    /// are never credited to a column that is about to be evicted.
    pub fn time_update(&mut self, clock: &IntervalClock) {
        let advanced = clock.rows_advanced();
        if advanced == 0 || self.rows.is_empty() {
            return;
        }
        let Some((lo, hi)) = self.live_range() else {
            debug_assert!(false, "live bounds left the key range");
            error!("live bounds left the key range; skipping eviction");
            return;
        };
        // after a full clear the tightening scans leave the bounds inverted
        // until the next value arrives; nothing is live then, but the column
        // cursor must keep moving with the clock
        let any_live = lo <= hi;

        if advanced >= self.col_count - 1 {
            // the gap swallowed the whole window; everything is stale
            if any_live {
                for row in &mut self.rows[lo..=hi] {
                    row.fill(0.0);
                }
            }
        } else {
            for _ in 0..advanced {
                self.col_idx = if self.col_idx == self.col_count - 1 {
                    1
                } else {
                    self.col_idx + 1
                };
                if !any_live {
                    continue;
                }
                for row in &mut self.rows[lo..=hi] {
                    let stale = row[self.col_idx];
                    if stale != 0.0 {
                        row[SUM_COL] -= stale;
                        row[self.col_idx] = 0.0;
                    }
                }
            }
        }
        self.tighten_live_quick();
    }

    /// Pull the live bounds inward past rows whose summation column is zero.
    ///
    /// Only column 0 is inspected: a row whose live columns cancel to exactly
    /// zero is skipped even though sub-interval columns remain nonzero.
    /// [`RollingSumTable::tighten_live_thorough`] closes that hole at the
    /// cost of scanning every column.
    pub fn tighten_live_quick(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let mut lo = self.key_to_idx(self.key_min_live).unwrap_or(0);
        while lo < self.keys.len() - 1 && self.rows[lo][SUM_COL].abs() <= VALUE_EPS {
            lo += 1;
        }
        self.key_min_live = self.keys[lo];

        let mut hi = self
            .key_to_idx(self.key_max_live)
            .unwrap_or(self.keys.len() - 1);
        while hi > 0 && self.rows[hi][SUM_COL].abs() <= VALUE_EPS {
            hi -= 1;
        }
        self.key_max_live = self.keys[hi];
    }

    /// Full-scan variant of the live-bounds tightening: a row counts as live
    /// if any of its columns is nonzero.
    pub fn tighten_live_thorough(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let nonzero = |row: &[f64]| row.iter().any(|v| v.abs() > VALUE_EPS);

        let mut lo = self.key_to_idx(self.key_min_live).unwrap_or(0);
        while lo < self.keys.len() - 1 && !nonzero(&self.rows[lo]) {
            lo += 1;
        }
        self.key_min_live = self.keys[lo];

        let mut hi = self
            .key_to_idx(self.key_max_live)
            .unwrap_or(self.keys.len() - 1);
        while hi > 0 && !nonzero(&self.rows[hi]) {
            hi -= 1;
        }
        self.key_max_live = self.keys[hi];
    }

    // Seed the summation column directly; the VWAP ledger uses this to pin
    // its two rows inside the live scan range permanently.
    pub(crate) fn seed_sum(&mut self, idx: usize, v: f64) {
        self.rows[idx][SUM_COL] = v;
    }

    fn live_range(&self) -> Option<(usize, usize)> {
        let lo = self.key_to_idx(self.key_min_live)?;
        let hi = self.key_to_idx(self.key_max_live)?;
        Some((lo, hi.min(self.rows.len() - 1)))
    }
}
