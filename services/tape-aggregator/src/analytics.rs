//! Analytics hub: routes each print to the windowed aggregates that consume
//! it and keeps every other aggregate time-aligned.

use tapeflow_common::{Print, PrintKind, TapeError};

use crate::clock::IntervalClock;
use crate::config::AggregatorConfig;
use crate::window::{
    ValueDistribution, ValueRangeDistribution, ValueTotalDistribution, VwapTracker,
};

/// Eviction tick shared by every windowed collection.
trait TimeTicked {
    fn tick(&mut self, clock: &IntervalClock);
    fn clock_slot(&self) -> usize;
}

macro_rules! impl_time_ticked {
    ($($ty:ty),+) => {$(
        impl TimeTicked for $ty {
            fn tick(&mut self, clock: &IntervalClock) {
                self.time_update(clock);
            }
            fn clock_slot(&self) -> usize {
                self.clock_idx()
            }
        }
    )+};
}

impl_time_ticked!(
    ValueDistribution,
    ValueRangeDistribution,
    ValueTotalDistribution,
    VwapTracker
);

/// Windowed-aggregate collections, one table per configured
/// (kind, resolution, timeframe, bucket width) row.
pub struct AnalyticsHub {
    bid_volume: Vec<ValueDistribution>,
    ask_volume: Vec<ValueDistribution>,
    traded_volume: Vec<ValueDistribution>,
    price_range: Vec<ValueRangeDistribution>,
    volume_total: Vec<ValueTotalDistribution>,
    vwap: Vec<VwapTracker>,
}

impl AnalyticsHub {
    /// Build every collection from the configuration tables. Entries whose
    /// resolution has no clock are skipped.
    pub fn new(clocks: &[IntervalClock], config: &AggregatorConfig) -> Result<Self, TapeError> {
        let mut bid_volume = Vec::new();
        let mut ask_volume = Vec::new();
        let mut traded_volume = Vec::new();
        for entry in &config.volume_distributions {
            let Some(idx) = clock_for(clocks, entry.resolution) else {
                continue;
            };
            let clock = &clocks[idx];
            bid_volume.push(ValueDistribution::new(
                clock,
                idx,
                entry.timeframe,
                entry.bucket_width,
            )?);
            ask_volume.push(ValueDistribution::new(
                clock,
                idx,
                entry.timeframe,
                entry.bucket_width,
            )?);
            traded_volume.push(ValueDistribution::new(
                clock,
                idx,
                entry.timeframe,
                entry.bucket_width,
            )?);
        }

        let mut price_range = Vec::new();
        for entry in &config.range_distributions {
            let Some(idx) = clock_for(clocks, entry.resolution) else {
                continue;
            };
            price_range.push(ValueRangeDistribution::new(
                &clocks[idx],
                idx,
                entry.timeframe,
                entry.bucket_width,
            )?);
        }

        let mut volume_total = Vec::new();
        for entry in &config.total_distributions {
            let Some(idx) = clock_for(clocks, entry.resolution) else {
                continue;
            };
            volume_total.push(ValueTotalDistribution::new(
                &clocks[idx],
                idx,
                entry.timeframe,
                entry.bucket_width,
            )?);
        }

        let mut vwap = Vec::new();
        for entry in &config.vwap {
            let Some(idx) = clock_for(clocks, entry.resolution) else {
                continue;
            };
            vwap.push(VwapTracker::new(&clocks[idx], idx, &entry.timeframes)?);
        }

        Ok(Self {
            bid_volume,
            ask_volume,
            traded_volume,
            price_range,
            volume_total,
            vwap,
        })
    }

    /// Dispatch one print. Collections matching its kind receive the datum;
    /// every other collection gets an eviction-only tick, so each one sees
    /// exactly one time update per print and none falls behind its clock.
    pub fn on_print(&mut self, clocks: &[IntervalClock], print: &Print) {
        match print.kind {
            PrintKind::Bid => {
                for dist in &mut self.bid_volume {
                    dist.on_print(&clocks[dist.clock_idx()], print.price, print.size);
                }
                tick_all(&mut self.ask_volume, clocks);
                tick_all(&mut self.traded_volume, clocks);
                tick_all(&mut self.volume_total, clocks);
                tick_all(&mut self.price_range, clocks);
                tick_all(&mut self.vwap, clocks);
            }
            PrintKind::Ask => {
                for dist in &mut self.ask_volume {
                    dist.on_print(&clocks[dist.clock_idx()], print.price, print.size);
                }
                tick_all(&mut self.bid_volume, clocks);
                tick_all(&mut self.traded_volume, clocks);
                tick_all(&mut self.volume_total, clocks);
                tick_all(&mut self.price_range, clocks);
                tick_all(&mut self.vwap, clocks);
            }
            PrintKind::Traded => {
                for dist in &mut self.traded_volume {
                    dist.on_print(&clocks[dist.clock_idx()], print.price, print.size);
                }
                for dist in &mut self.volume_total {
                    dist.on_print(&clocks[dist.clock_idx()], print.size);
                }
                for dist in &mut self.price_range {
                    dist.on_print(&clocks[dist.clock_idx()], print.price);
                }
                for tracker in &mut self.vwap {
                    tracker.on_print(&clocks[tracker.clock_idx()], print.price, print.size);
                }
                tick_all(&mut self.bid_volume, clocks);
                tick_all(&mut self.ask_volume, clocks);
            }
        }
    }

    /// Bid volume-by-price histograms, in configuration order
    #[must_use]
    pub fn bid_volume(&self) -> &[ValueDistribution] {
        &self.bid_volume
    }

    /// Ask volume-by-price histograms, in configuration order
    #[must_use]
    pub fn ask_volume(&self) -> &[ValueDistribution] {
        &self.ask_volume
    }

    /// Traded volume-by-price histograms, in configuration order
    #[must_use]
    pub fn traded_volume(&self) -> &[ValueDistribution] {
        &self.traded_volume
    }

    /// Per-interval price-range histograms, in configuration order
    #[must_use]
    pub fn price_range(&self) -> &[ValueRangeDistribution] {
        &self.price_range
    }

    /// Per-interval traded-total histograms, in configuration order
    #[must_use]
    pub fn volume_total(&self) -> &[ValueTotalDistribution] {
        &self.volume_total
    }

    /// VWAP trackers, in configuration order
    #[must_use]
    pub fn vwap(&self) -> &[VwapTracker] {
        &self.vwap
    }
}

fn tick_all<T: TimeTicked>(items: &mut [T], clocks: &[IntervalClock]) {
    for item in items {
        item.tick(&clocks[item.clock_slot()]);
    }
}

fn clock_for(clocks: &[IntervalClock], resolution: u32) -> Option<usize> {
    clocks
        .iter()
        .position(|c| c.interval_minutes() == resolution)
}
