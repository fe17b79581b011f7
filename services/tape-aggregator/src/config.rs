//! Aggregation engine configuration.

use serde::{Deserialize, Serialize};

use tapeflow_common::constants::value::DEFAULT_TICK_SIZE;
use tapeflow_common::TapeError;

/// One windowed-table parameter row
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Total window span in minutes
    pub timeframe: u32,
    /// Clock resolution driving the table, in minutes
    pub resolution: u32,
    /// Key bucket width
    pub bucket_width: f64,
}

impl WindowSpec {
    const fn new(timeframe: u32, resolution: u32, bucket_width: f64) -> Self {
        Self {
            timeframe,
            resolution,
            bucket_width,
        }
    }
}

/// VWAP horizon group bound to one clock resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VwapSpec {
    /// Clock resolution driving the ledger, in minutes
    pub resolution: u32,
    /// Horizon windows in minutes, each a multiple of the resolution
    pub timeframes: Vec<u32>,
}

/// Engine configuration
///
/// Window entries referencing a resolution absent from `resolutions` are
/// skipped at startup, so tables can be disabled by removing their clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Clock resolutions in minutes; duplicates collapse
    pub resolutions: Vec<u32>,
    /// Stamp-row capacity for every clock and series
    pub clock_rows: usize,
    /// Bid/ask/traded volume-by-price histograms
    pub volume_distributions: Vec<WindowSpec>,
    /// Per-interval price-range histograms
    pub range_distributions: Vec<WindowSpec>,
    /// Per-interval traded-total histograms
    pub total_distributions: Vec<WindowSpec>,
    /// VWAP horizon groups
    pub vwap: Vec<VwapSpec>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            resolutions: vec![1, 5, 10, 17, 30, 60],
            clock_rows: 2880,
            volume_distributions: vec![
                WindowSpec::new(60, 1, DEFAULT_TICK_SIZE),
                WindowSpec::new(240, 10, DEFAULT_TICK_SIZE),
                WindowSpec::new(1440, 60, DEFAULT_TICK_SIZE),
            ],
            range_distributions: vec![
                WindowSpec::new(60, 1, DEFAULT_TICK_SIZE),
                WindowSpec::new(240, 5, DEFAULT_TICK_SIZE),
            ],
            total_distributions: vec![
                WindowSpec::new(240, 1, 25.0),
                WindowSpec::new(480, 5, 100.0),
            ],
            vwap: vec![
                VwapSpec {
                    resolution: 1,
                    timeframes: vec![1, 5, 10, 15],
                },
                VwapSpec {
                    resolution: 30,
                    timeframes: vec![30, 60, 120, 240],
                },
                VwapSpec {
                    resolution: 60,
                    timeframes: vec![360, 720, 1080, 1440],
                },
            ],
        }
    }
}

impl AggregatorConfig {
    /// Check the parts every constructor relies on; window-level checks
    /// (bucket widths, timeframes vs. capacity) happen where the tables are
    /// built so misconfiguration always fails at setup.
    pub fn validate(&self) -> Result<(), TapeError> {
        if self.resolutions.is_empty() {
            return Err(TapeError::InvalidConfiguration(
                "at least one clock resolution is required".to_string(),
            ));
        }
        if self.resolutions.iter().any(|&r| r == 0) {
            return Err(TapeError::InvalidConfiguration(
                "clock resolutions must be positive".to_string(),
            ));
        }
        if self.clock_rows == 0 {
            return Err(TapeError::InvalidConfiguration(
                "clock capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
