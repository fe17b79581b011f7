//! Tape Aggregation Engine
//!
//! Aggregates a raw market print stream into time-aligned series:
//! - multi-resolution OHLC bars and bid/ask/traded volume
//! - rolling value-distribution histograms
//! - multi-horizon VWAP figures
//!
//! One master clock per resolution advances every dependent buffer in
//! lock-step; windowed sums decay incrementally, so ingestion stays
//! amortized O(1) per print over an unbounded, irregular stream.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod engine;
pub mod ring;
pub mod series;
pub mod window;

pub use analytics::AnalyticsHub;
pub use clock::IntervalClock;
pub use config::{AggregatorConfig, VwapSpec, WindowSpec};
pub use engine::TapeAggregator;
pub use ring::RingGrid;
pub use series::{OhlcBar, OhlcSeries, VolumeRow, VolumeSeries};
pub use window::{
    RollingSumTable, ValueDistribution, ValueRangeDistribution, ValueTotalDistribution,
    VwapHorizon, VwapTracker,
};
