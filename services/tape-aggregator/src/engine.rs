//! Ingest coordinator: owns the clocks, series and analytics hub, and fans
//! every print out to them in lock-step.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use tapeflow_common::{Print, QuoteBoard, TapeError};

use crate::analytics::AnalyticsHub;
use crate::clock::IntervalClock;
use crate::config::AggregatorConfig;
use crate::series::{OhlcBar, OhlcSeries, VolumeRow, VolumeSeries};

/// The aggregation engine.
///
/// Single-writer: exactly one caller feeds prints, strictly in arrival
/// order; nothing here is reentrant-safe for concurrent calls. A successful
/// [`TapeAggregator::on_print`] return doubles as the "data updated" signal:
/// it carries no payload, and the caller re-reads whichever accessors it
/// cares about, all of which hand back owned point-in-time snapshots.
pub struct TapeAggregator {
    clocks: Vec<IntervalClock>,
    by_resolution: FxHashMap<u32, usize>,
    ohlc: Vec<OhlcSeries>,
    volume: Vec<VolumeSeries>,
    analytics: AnalyticsHub,
    quotes: QuoteBoard,
    prints_seen: u64,
}

impl TapeAggregator {
    /// One-time setup from a validated configuration.
    pub fn new(config: &AggregatorConfig) -> Result<Self, TapeError> {
        config.validate()?;

        let mut clocks = Vec::new();
        let mut by_resolution = FxHashMap::default();
        let mut ohlc = Vec::new();
        let mut volume = Vec::new();
        for &resolution in &config.resolutions {
            if by_resolution.contains_key(&resolution) {
                continue;
            }
            let idx = clocks.len();
            let clock = IntervalClock::new(resolution, config.clock_rows)?;
            ohlc.push(OhlcSeries::new(&clock, idx));
            volume.push(VolumeSeries::new(&clock, idx));
            by_resolution.insert(resolution, idx);
            clocks.push(clock);
        }

        let analytics = AnalyticsHub::new(&clocks, config)?;

        info!(
            clocks = clocks.len(),
            rows = config.clock_rows,
            "tape aggregator configured"
        );
        Ok(Self {
            clocks,
            by_resolution,
            ohlc,
            volume,
            analytics,
            quotes: QuoteBoard::default(),
            prints_seen: 0,
        })
    }

    /// Parse and ingest one raw tape line.
    ///
    /// A malformed line is rejected with no state change; the next line is
    /// unaffected.
    pub fn on_print_line(&mut self, line: &str) -> Result<(), TapeError> {
        let print = Print::parse(line)?;
        self.on_print(&print);
        Ok(())
    }

    /// Ingest one normalized print, leaving every aggregate updated.
    ///
    /// Clocks advance first so every dependent consumes the same
    /// rows-advanced signal for this print.
    pub fn on_print(&mut self, print: &Print) {
        for clock in &mut self.clocks {
            clock.advance(print.date, print.minute);
        }
        for series in &mut self.ohlc {
            series.on_print(&self.clocks[series.clock_idx()], print);
        }
        for series in &mut self.volume {
            series.on_print(&self.clocks[series.clock_idx()], print);
        }
        self.analytics.on_print(&self.clocks, print);
        self.quotes.record(print);
        self.prints_seen += 1;

        debug!(
            kind = ?print.kind,
            price = print.price,
            size = print.size,
            "print ingested"
        );
    }

    /// Configured clock resolutions, in clock order
    #[must_use]
    pub fn resolutions(&self) -> Vec<u32> {
        self.clocks.iter().map(IntervalClock::interval_minutes).collect()
    }

    /// Clock driving `resolution`-minute buckets, if configured
    #[must_use]
    pub fn clock(&self, resolution: u32) -> Option<&IntervalClock> {
        self.by_resolution.get(&resolution).map(|&i| &self.clocks[i])
    }

    /// OHLC series at `resolution`, if configured
    #[must_use]
    pub fn ohlc(&self, resolution: u32) -> Option<&OhlcSeries> {
        self.by_resolution.get(&resolution).map(|&i| &self.ohlc[i])
    }

    /// Volume series at `resolution`, if configured
    #[must_use]
    pub fn volume(&self, resolution: u32) -> Option<&VolumeSeries> {
        self.by_resolution.get(&resolution).map(|&i| &self.volume[i])
    }

    /// Last `n` bars at `resolution`, oldest first.
    pub fn last_bars(&self, resolution: u32, n: usize) -> Result<Vec<OhlcBar>, TapeError> {
        self.ohlc(resolution)
            .ok_or_else(|| {
                TapeError::InvalidArgument(format!("no {resolution}-minute series configured"))
            })?
            .last_bars(n)
    }

    /// Last `n` volume rows at `resolution`, oldest first.
    pub fn last_volume(&self, resolution: u32, n: usize) -> Result<Vec<VolumeRow>, TapeError> {
        self.volume(resolution)
            .ok_or_else(|| {
                TapeError::InvalidArgument(format!("no {resolution}-minute series configured"))
            })?
            .last_rows(n)
    }

    /// The windowed-aggregate collections
    #[must_use]
    pub const fn analytics(&self) -> &AnalyticsHub {
        &self.analytics
    }

    /// Last price/size per print kind
    #[must_use]
    pub const fn quotes(&self) -> &QuoteBoard {
        &self.quotes
    }

    /// Prints accepted since startup
    #[must_use]
    pub const fn prints_seen(&self) -> u64 {
        self.prints_seen
    }
}
