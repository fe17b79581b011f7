//! Interval clock: converts the print stream's timestamps into discrete
//! bucket indices at one configured resolution.

use tracing::error;

use tapeflow_common::calendar;
use tapeflow_common::constants::time::{ORIGIN_DATE, ORIGIN_MINUTE};
use tapeflow_common::TapeError;

use crate::ring::RingGrid;

const COL_DATE: usize = 0;
const COL_MINUTE: usize = 1;

/// Per-resolution master clock.
///
/// The stamp at the cursor always marks the *start* of the current bucket;
/// `rows_advanced` is recomputed on every [`IntervalClock::advance`] call and
/// must be consumed by dependents before the next call.
#[derive(Debug, Clone)]
pub struct IntervalClock {
    interval_minutes: u32,
    stamps: RingGrid<i32>,
    rows_advanced: usize,
    last_seen: (i32, i32),
    started: bool,
}

impl IntervalClock {
    /// Create a clock ticking every `interval_minutes`, keeping `rows`
    /// bucket stamps of history.
    pub fn new(interval_minutes: u32, rows: usize) -> Result<Self, TapeError> {
        if interval_minutes == 0 {
            return Err(TapeError::InvalidConfiguration(
                "clock interval must be positive".to_string(),
            ));
        }
        if rows == 0 {
            return Err(TapeError::InvalidConfiguration(
                "clock needs at least one row".to_string(),
            ));
        }
        Ok(Self {
            interval_minutes,
            stamps: RingGrid::new(rows, 2, 0),
            rows_advanced: 0,
            last_seen: (0, 0),
            started: false,
        })
    }

    /// Bucket width in minutes
    #[must_use]
    pub const fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Stamp-row capacity
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.stamps.rows()
    }

    /// Current bucket cursor
    #[must_use]
    pub const fn row_idx(&self) -> usize {
        self.stamps.row_idx()
    }

    /// Rows advanced by the most recent [`IntervalClock::advance`] call
    #[must_use]
    pub const fn rows_advanced(&self) -> usize {
        self.rows_advanced
    }

    /// `(date, minute)` stamp of bucket row `idx`
    #[must_use]
    pub fn stamp(&self, idx: usize) -> (i32, i32) {
        (self.stamps.get(idx, COL_DATE), self.stamps.get(idx, COL_MINUTE))
    }

    /// Start stamp of the current bucket
    #[must_use]
    pub fn current_stamp(&self) -> (i32, i32) {
        self.stamp(self.stamps.row_idx())
    }

    /// Last `n` bucket-start stamps, oldest first.
    pub fn last_stamps(&self, n: usize) -> Result<Vec<(i32, i32)>, TapeError> {
        Ok(self
            .stamps
            .last_rows(n)?
            .into_iter()
            .map(|row| (row[COL_DATE], row[COL_MINUTE]))
            .collect())
    }

    /// Feed one print timestamp; returns how many bucket rows elapsed.
    ///
    /// Replays of the same instant are no-ops. Gaps larger than capacity wrap
    /// the buffer completely; the report is clamped to the row count while
    /// the cursor still moves by the full elapsed count modulo capacity, so
    /// pre-gap history is unrecoverable by design (bounded memory).
    pub fn advance(&mut self, date: i32, minute: i32) -> usize {
        self.rows_advanced = 0;

        if (date, minute) == self.last_seen || (date, minute) == self.current_stamp() {
            return 0;
        }
        self.last_seen = (date, minute);

        if !self.started {
            return self.start(date, minute);
        }

        let (cur_date, cur_minute) = self.current_stamp();
        let Ok(delta) = calendar::minutes_between(date, minute, cur_date, cur_minute) else {
            return self.reject_stamp(date, minute);
        };
        let interval = i64::from(self.interval_minutes);
        if delta < interval {
            // also swallows out-of-order stamps inside the current bucket
            return 0;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let moved = (delta / interval) as usize;
        let filled = moved.min(self.stamps.rows());
        self.stamps.advance(moved);

        for back in 0..filled {
            let offset = (moved - back) as i64 * interval;
            let Ok((d, m)) = calendar::add_minutes(cur_date, cur_minute, offset) else {
                return self.reject_stamp(date, minute);
            };
            let idx = self.stamps.idx_back(self.stamps.row_idx(), back);
            self.stamps.set(idx, COL_DATE, d);
            self.stamps.set(idx, COL_MINUTE, m);
        }

        self.rows_advanced = filled;
        filled
    }

    /// Align the first bucket down to this clock's interval grid, anchored at
    /// the calendar origin so every resolution lands on the same lattice.
    fn start(&mut self, date: i32, minute: i32) -> usize {
        let Ok(total) = calendar::minutes_between(date, minute, ORIGIN_DATE, ORIGIN_MINUTE) else {
            return self.reject_stamp(date, minute);
        };
        let interval = i64::from(self.interval_minutes);
        let aligned = total / interval * interval;
        let Ok((d, m)) = calendar::add_minutes(ORIGIN_DATE, ORIGIN_MINUTE, aligned) else {
            return self.reject_stamp(date, minute);
        };

        let idx = self.stamps.row_idx();
        self.stamps.set(idx, COL_DATE, d);
        self.stamps.set(idx, COL_MINUTE, m);
        self.started = true;
        self.rows_advanced = 1;
        1
    }

    // A stamp the calendar cannot decode means a print bypassed parsing;
    // fatal while developing, a logged no-op in production.
    fn reject_stamp(&mut self, date: i32, minute: i32) -> usize {
        debug_assert!(false, "undecodable stamp {date} {minute} reached the clock");
        error!(date, minute, "discarding print with undecodable stamp");
        self.rows_advanced = 0;
        0
    }
}
