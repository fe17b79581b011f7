//! Multi-horizon volume-weighted average price over a shared base interval.

use serde::Serialize;

use tapeflow_common::TapeError;

use crate::clock::IntervalClock;
use crate::window::table::RollingSumTable;

// The base table is a two-row ledger rather than a histogram: row 0 holds
// per-sub-interval volume, row 1 volume x price.
const KEY_VOLUME: f64 = 0.0;
const KEY_VOLUME_PRICE: f64 = 1.0;
const ROW_VOLUME: usize = 0;
const ROW_VOLUME_PRICE: usize = 1;

/// One VWAP window derived from the shared ledger
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VwapHorizon {
    /// Window span in minutes
    pub timeframe: u32,
    /// Window span in base sub-intervals
    pub sub_intervals: usize,
    /// Volume inside the window
    pub volume: f64,
    /// Volume x price inside the window
    pub volume_price: f64,
    /// Volume-weighted average price; keeps its last figure while the
    /// window's volume is zero (never NaN)
    pub vwap: f64,
}

/// VWAP tracker: one eviction ledger at the clock's resolution feeding any
/// number of longer horizons (e.g. 1/5/10/15 minutes off a 1-minute clock).
#[derive(Debug, Clone)]
pub struct VwapTracker {
    table: RollingSumTable,
    horizons: Vec<VwapHorizon>,
}

impl VwapTracker {
    /// Create a tracker for the given horizon timeframes, all multiples of
    /// the clock's interval; the ledger spans the longest of them.
    pub fn new(
        clock: &IntervalClock,
        clock_idx: usize,
        timeframes: &[u32],
    ) -> Result<Self, TapeError> {
        let Some(&max_timeframe) = timeframes.iter().max() else {
            return Err(TapeError::InvalidConfiguration(
                "vwap tracker needs at least one timeframe".to_string(),
            ));
        };
        let interval = clock.interval_minutes();
        if timeframes.iter().any(|&tf| tf < interval) {
            return Err(TapeError::InvalidConfiguration(format!(
                "vwap timeframe shorter than the {interval}m clock interval"
            )));
        }

        let mut table = RollingSumTable::new(clock, clock_idx, max_timeframe, 1.0, 4)?;
        table.ensure_key(KEY_VOLUME);
        table.ensure_key(KEY_VOLUME_PRICE);
        // pin both ledger rows inside the live scan range for good: without
        // the seed an eviction could tighten the bounds past one of them and
        // later evictions would skip its columns
        table.seed_sum(ROW_VOLUME, 1.0);
        table.seed_sum(ROW_VOLUME_PRICE, 1.0);

        let horizons = timeframes
            .iter()
            .map(|&tf| VwapHorizon {
                timeframe: tf,
                sub_intervals: (tf / interval) as usize,
                volume: 0.0,
                volume_price: 0.0,
                vwap: 0.0,
            })
            .collect();

        Ok(Self { table, horizons })
    }

    /// Index of the owning clock in the engine's clock list
    #[must_use]
    pub const fn clock_idx(&self) -> usize {
        self.table.clock_idx()
    }

    /// Current horizon figures, in configuration order
    #[must_use]
    pub fn horizons(&self) -> &[VwapHorizon] {
        &self.horizons
    }

    /// Underlying eviction ledger
    #[must_use]
    pub const fn table(&self) -> &RollingSumTable {
        &self.table
    }

    /// Evict, then fold in one trade at `price` for `size`.
    pub fn on_print(&mut self, clock: &IntervalClock, price: f64, size: f64) {
        self.time_update(clock);

        self.table.add(KEY_VOLUME, size);
        self.table.add(KEY_VOLUME_PRICE, size * price);
        for horizon in &mut self.horizons {
            horizon.volume += size;
            horizon.volume_price += size * price;
        }
        self.recalc();
    }

    /// Subtract the volume and volume x price falling out of each horizon's
    /// window, then run the ledger's own eviction.
    pub fn time_update(&mut self, clock: &IntervalClock) {
        let advanced = clock.rows_advanced();
        if advanced > 0 {
            let col_count = self.table.col_count();
            for horizon in &mut self.horizons {
                if advanced >= horizon.sub_intervals {
                    // the gap spans this whole window
                    horizon.volume = 0.0;
                    horizon.volume_price = 0.0;
                    horizon.vwap = 0.0;
                    continue;
                }
                // oldest column still inside this horizon's window
                let offset =
                    self.table.col_idx() as isize - horizon.sub_intervals as isize + 1;
                #[allow(clippy::cast_sign_loss)]
                let mut col = if offset < 1 {
                    (offset + col_count as isize - 1) as usize
                } else {
                    offset as usize
                };
                for _ in 0..advanced {
                    horizon.volume -= self.table.row(ROW_VOLUME)[col];
                    horizon.volume_price -= self.table.row(ROW_VOLUME_PRICE)[col];
                    col = if col == col_count - 1 { 1 } else { col + 1 };
                }
            }
        }
        self.table.time_update(clock);
    }

    // Zero-volume horizons keep their previous figure rather than divide.
    fn recalc(&mut self) {
        for horizon in &mut self.horizons {
            if horizon.volume != 0.0 {
                horizon.vwap = horizon.volume_price / horizon.volume;
            }
        }
    }
}
