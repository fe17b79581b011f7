//! Rolling distribution and decaying-sum table tests

use pretty_assertions::assert_eq;
use rstest::*;
use tape_aggregator::window::RollingSumTable;
use tape_aggregator::{
    IntervalClock, ValueDistribution, ValueRangeDistribution, ValueTotalDistribution,
};
use tapeflow_common::TapeError;
use test_utils::TAPE_DATE;

#[fixture]
fn minute_clock() -> IntervalClock {
    IntervalClock::new(1, 64).expect("valid clock")
}

#[rstest]
fn test_histogram_round_trip(mut minute_clock: IntervalClock) {
    let mut dist = ValueDistribution::new(&minute_clock, 0, 60, 0.01).expect("valid window");
    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 100.00, 50.0);

    assert_eq!(dist.table().sum_at(100.00), Some(50.0));
}

#[rstest]
fn test_keys_grow_contiguously(mut minute_clock: IntervalClock) {
    let mut dist = ValueDistribution::new(&minute_clock, 0, 60, 0.01).expect("valid window");
    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 100.00, 1.0);
    dist.on_print(&minute_clock, 100.03, 2.0);
    dist.on_print(&minute_clock, 99.98, 3.0);

    let table = dist.table();
    assert_eq!(table.keys().len(), 6);
    assert_eq!(table.key_to_idx(99.98), Some(0));
    assert_eq!(table.key_to_idx(100.03), Some(5));
    assert_eq!(table.sum_at(100.03), Some(2.0));
    assert_eq!(table.sum_at(99.98), Some(3.0));
    // untouched bucket in between
    assert_eq!(table.sum_at(100.01), Some(0.0));
}

#[rstest]
fn test_window_evicts_expired_subintervals(mut minute_clock: IntervalClock) {
    // two-minute window on a one-minute clock: current plus one prior column
    let mut dist = ValueDistribution::new(&minute_clock, 0, 2, 0.01).expect("valid window");

    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 100.00, 10.0);
    minute_clock.advance(TAPE_DATE, 571);
    dist.on_print(&minute_clock, 100.00, 5.0);
    assert_eq!(dist.table().sum_at(100.00), Some(15.0));

    minute_clock.advance(TAPE_DATE, 572);
    dist.time_update(&minute_clock);
    assert_eq!(dist.table().sum_at(100.00), Some(5.0));

    minute_clock.advance(TAPE_DATE, 573);
    dist.time_update(&minute_clock);
    assert_eq!(dist.table().sum_at(100.00), Some(0.0));
}

#[rstest]
fn test_gap_spanning_window_clears_everything(mut minute_clock: IntervalClock) {
    let mut dist = ValueDistribution::new(&minute_clock, 0, 5, 0.01).expect("valid window");
    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 100.00, 10.0);
    dist.on_print(&minute_clock, 100.02, 4.0);

    // market reopens long after the whole window elapsed
    minute_clock.advance(TAPE_DATE, 600);
    dist.time_update(&minute_clock);

    let table = dist.table();
    for idx in 0..table.keys().len() {
        assert!(table.row(idx).iter().all(|&v| v == 0.0));
    }
}

#[rstest]
fn test_total_distribution_records_interval_totals(mut minute_clock: IntervalClock) {
    let mut dist = ValueTotalDistribution::new(&minute_clock, 0, 60, 25.0).expect("valid window");

    // the very first boundary records the empty pre-history interval as zero
    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 5.0);
    dist.on_print(&minute_clock, 10.0);
    assert_eq!(dist.pending_total(), 15.0);

    minute_clock.advance(TAPE_DATE, 571);
    dist.on_print(&minute_clock, 2.0);

    // 0 and 15 both land in the first 25-wide bucket
    assert_eq!(dist.table().sum_at(0.0), Some(2.0));
    assert_eq!(dist.pending_total(), 2.0);
}

#[rstest]
fn test_total_distribution_records_quiet_intervals_as_zero(mut minute_clock: IntervalClock) {
    let mut dist = ValueTotalDistribution::new(&minute_clock, 0, 60, 25.0).expect("valid window");

    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 30.0);
    minute_clock.advance(TAPE_DATE, 571);
    dist.on_print(&minute_clock, 40.0);
    assert_eq!(dist.table().sum_at(25.0), Some(1.0)); // the 30 total

    // a two-minute jump records one datum for the 40, none for the skipped minute
    minute_clock.advance(TAPE_DATE, 573);
    dist.time_update(&minute_clock);
    assert_eq!(dist.table().sum_at(25.0), Some(2.0));

    // a boundary with nothing pending records a zero total
    minute_clock.advance(TAPE_DATE, 574);
    dist.time_update(&minute_clock);
    assert_eq!(dist.table().sum_at(0.0), Some(2.0)); // startup zero plus this one
}

#[rstest]
fn test_range_distribution_records_interval_ranges(mut minute_clock: IntervalClock) {
    let mut dist = ValueRangeDistribution::new(&minute_clock, 0, 60, 0.25).expect("valid window");

    // nothing seen before the first boundary, so nothing is recorded for it
    minute_clock.advance(TAPE_DATE, 570);
    dist.on_print(&minute_clock, 10.00);
    dist.on_print(&minute_clock, 10.75);
    dist.on_print(&minute_clock, 10.25);
    assert!(dist.table().keys().is_empty());

    minute_clock.advance(TAPE_DATE, 571);
    dist.on_print(&minute_clock, 11.00);
    assert_eq!(dist.table().sum_at(0.75), Some(1.0));

    // single value in the interval records a zero range
    minute_clock.advance(TAPE_DATE, 572);
    dist.time_update(&minute_clock);
    assert_eq!(dist.table().sum_at(0.0), Some(1.0));

    // quiet interval records nothing
    minute_clock.advance(TAPE_DATE, 573);
    dist.time_update(&minute_clock);
    let total: f64 = dist.table().bucket_sums().iter().map(|(_, v)| v).sum();
    assert_eq!(total, 2.0);
}

#[rstest]
fn test_quick_scan_skips_exact_zero_cancellation(mut minute_clock: IntervalClock) {
    let mut table =
        RollingSumTable::new(&minute_clock, 0, 3, 1.0, 8).expect("valid window");
    minute_clock.advance(TAPE_DATE, 570);
    table.ensure_key(5.0);
    table.add(5.0, 4.0);

    minute_clock.advance(TAPE_DATE, 571);
    table.time_update(&minute_clock);
    // cancels the summation column while two sub-interval columns stay nonzero
    table.add(5.0, -4.0);
    table.ensure_key(7.0);
    table.add(7.0, 1.0);

    let mut quick = table.clone();
    quick.tighten_live_quick();
    assert_eq!(quick.live_bounds(), (7.0, 7.0));

    let mut thorough = table;
    thorough.tighten_live_thorough();
    assert_eq!(thorough.live_bounds(), (5.0, 7.0));
}

#[rstest]
fn test_window_wider_than_clock_capacity_rejected() {
    let clock = IntervalClock::new(1, 16).expect("valid clock");
    assert!(matches!(
        ValueDistribution::new(&clock, 0, 30, 0.01),
        Err(TapeError::InvalidConfiguration(_))
    ));
}

#[rstest]
fn test_zero_bucket_width_rejected(minute_clock: IntervalClock) {
    assert!(matches!(
        ValueDistribution::new(&minute_clock, 0, 60, 0.0),
        Err(TapeError::InvalidConfiguration(_))
    ));
}
