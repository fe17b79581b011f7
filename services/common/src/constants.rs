//! Core numeric constants for the tapeflow engine.
//!
//! Single source of truth for the feed's calendar encoding and value
//! discretization; components receive these through configuration rather
//! than reading mutable globals.

/// Calendar and clock constants
pub mod time {
    /// Minutes in one calendar day
    pub const MINUTES_PER_DAY: i64 = 1440;

    /// Anchor date for interval-grid alignment, as a YYYYMMDD integer
    pub const ORIGIN_DATE: i32 = 1_01_01;

    /// Anchor minute-of-day paired with [`ORIGIN_DATE`]
    pub const ORIGIN_MINUTE: i32 = 0;
}

/// Value-bucket constants
pub mod value {
    /// Tolerance for comparisons between discretized prices/sizes.
    /// The feed carries two decimal places; anything below this is rounding noise.
    pub const VALUE_EPS: f64 = 1e-8;

    /// Default price bucket width (one tick)
    pub const DEFAULT_TICK_SIZE: f64 = 0.01;
}
