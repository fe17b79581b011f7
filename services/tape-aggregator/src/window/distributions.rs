//! Concrete rolling-histogram forms over the decaying-sum core.

use tapeflow_common::constants::value::VALUE_EPS;
use tapeflow_common::TapeError;

use crate::clock::IntervalClock;
use crate::window::table::RollingSumTable;

/// Rolling histogram of value by key bucket (e.g. traded size by price).
#[derive(Debug, Clone)]
pub struct ValueDistribution {
    table: RollingSumTable,
}

impl ValueDistribution {
    /// Create a distribution spanning `timeframe` minutes at `bucket_width`.
    pub fn new(
        clock: &IntervalClock,
        clock_idx: usize,
        timeframe: u32,
        bucket_width: f64,
    ) -> Result<Self, TapeError> {
        Ok(Self {
            table: RollingSumTable::new(clock, clock_idx, timeframe, bucket_width, 64)?,
        })
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.table.clock_idx()
    }

    /// Evict expired columns, then credit `v` to bucket `k`.
    pub fn on_print(&mut self, clock: &IntervalClock, k: f64, v: f64) {
        self.table.time_update(clock);
        self.table.ensure_key(k);
        self.table.add(k, v);
    }

    /// Eviction-only tick for prints carrying no datum for this table.
    pub fn time_update(&mut self, clock: &IntervalClock) {
        self.table.time_update(clock);
    }

    /// Underlying bucket table
    #[must_use]
    pub const fn table(&self) -> &RollingSumTable {
        &self.table
    }
}

/// Rolling histogram of per-sub-interval value totals (e.g. traded size per
/// interval). The key is managed internally: each bucket boundary turns the
/// running total into one histogram datum.
#[derive(Debug, Clone)]
pub struct ValueTotalDistribution {
    table: RollingSumTable,
    value_total: f64,
}

impl ValueTotalDistribution {
    /// Create a distribution spanning `timeframe` minutes at `bucket_width`.
    pub fn new(
        clock: &IntervalClock,
        clock_idx: usize,
        timeframe: u32,
        bucket_width: f64,
    ) -> Result<Self, TapeError> {
        Ok(Self {
            table: RollingSumTable::new(clock, clock_idx, timeframe, bucket_width, 64)?,
            value_total: 0.0,
        })
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.table.clock_idx()
    }

    /// Tick the window, then fold `v` into the running total.
    pub fn on_print(&mut self, clock: &IntervalClock, v: f64) {
        self.time_update(clock);
        self.value_total += v;
    }

    /// On a bucket boundary the ended sub-interval's total becomes one
    /// histogram datum (a quiet interval records a zero total); the datum
    /// lands in the column being retired, before eviction reuses it.
    pub fn time_update(&mut self, clock: &IntervalClock) {
        if clock.rows_advanced() > 0 {
            self.table.ensure_key(self.value_total);
            self.table.add(self.value_total, 1.0);
            self.value_total = 0.0;
        }
        self.table.time_update(clock);
    }

    /// Underlying bucket table
    #[must_use]
    pub const fn table(&self) -> &RollingSumTable {
        &self.table
    }

    /// Running total of the open sub-interval
    #[must_use]
    pub const fn pending_total(&self) -> f64 {
        self.value_total
    }
}

/// Rolling histogram of per-sub-interval value ranges (max minus min, e.g.
/// price range per interval). Key managed internally like
/// [`ValueTotalDistribution`], except a sub-interval that saw no values
/// records nothing.
#[derive(Debug, Clone)]
pub struct ValueRangeDistribution {
    table: RollingSumTable,
    value_min: f64,
    value_max: f64,
}

impl ValueRangeDistribution {
    /// Create a distribution spanning `timeframe` minutes at `bucket_width`.
    pub fn new(
        clock: &IntervalClock,
        clock_idx: usize,
        timeframe: u32,
        bucket_width: f64,
    ) -> Result<Self, TapeError> {
        Ok(Self {
            table: RollingSumTable::new(clock, clock_idx, timeframe, bucket_width, 64)?,
            value_min: f64::NAN,
            value_max: f64::NAN,
        })
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.table.clock_idx()
    }

    /// Tick the window, then widen the running min/max with `v`.
    pub fn on_print(&mut self, clock: &IntervalClock, v: f64) {
        self.time_update(clock);
        if self.value_min.is_nan() || v - self.value_min < -VALUE_EPS {
            self.value_min = v;
        }
        if self.value_max.is_nan() || v - self.value_max > VALUE_EPS {
            self.value_max = v;
        }
    }

    /// On a bucket boundary the ended sub-interval's range becomes one
    /// histogram datum and the running min/max reset.
    pub fn time_update(&mut self, clock: &IntervalClock) {
        if clock.rows_advanced() > 0 {
            let k = self.value_max - self.value_min;
            if !k.is_nan() {
                self.table.ensure_key(k);
                self.table.add(k, 1.0);
                self.value_min = f64::NAN;
                self.value_max = f64::NAN;
            }
        }
        self.table.time_update(clock);
    }

    /// Underlying bucket table
    #[must_use]
    pub const fn table(&self) -> &RollingSumTable {
        &self.table
    }
}
