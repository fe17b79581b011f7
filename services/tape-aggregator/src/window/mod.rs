//! Rolling windowed-sum aggregates: keyed decaying-sum tables and the
//! concrete distribution/VWAP forms built on them.

pub mod distributions;
pub mod table;
pub mod vwap;

pub use distributions::{ValueDistribution, ValueRangeDistribution, ValueTotalDistribution};
pub use table::RollingSumTable;
pub use vwap::{VwapHorizon, VwapTracker};
