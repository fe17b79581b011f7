//! Invariant properties checked over randomized print sequences

use proptest::prelude::*;
use tape_aggregator::{IntervalClock, OhlcSeries, ValueDistribution};
use tapeflow_common::calendar;
use test_utils::{print_at, TAPE_DATE};

proptest! {
    /// Every key row's summation column equals the sum of its sub-interval
    /// columns after every update.
    #[test]
    fn summation_column_tracks_subinterval_columns(
        steps in prop::collection::vec((0i32..4, -10i32..10, 1u32..50), 1..120)
    ) {
        let mut clock = IntervalClock::new(1, 64).expect("valid clock");
        let mut dist = ValueDistribution::new(&clock, 0, 5, 0.01).expect("valid window");

        let mut minute = 570;
        for (jump, tick, size) in steps {
            minute += jump;
            if minute >= 1440 {
                break;
            }
            clock.advance(TAPE_DATE, minute);
            let price = 100.0 + f64::from(tick) * 0.01;
            dist.on_print(&clock, price, f64::from(size));

            let table = dist.table();
            for idx in 0..table.keys().len() {
                let row = table.row(idx);
                let cols: f64 = row[1..].iter().sum();
                prop_assert!(
                    (row[0] - cols).abs() < 1e-6,
                    "row {idx}: summation {} vs columns {}",
                    row[0],
                    cols
                );
            }
        }
    }

    /// The clock reports exactly floor(elapsed / interval) rows, clamped to
    /// capacity, across arbitrary jumps including day rollovers.
    #[test]
    fn clock_advance_is_floor_of_elapsed(
        jumps in prop::collection::vec(0i64..200, 1..60),
        interval in 1u32..30
    ) {
        let rows = 32usize;
        let mut clock = IntervalClock::new(interval, rows).expect("valid clock");
        clock.advance(TAPE_DATE, 0);

        let mut elapsed_total = 0i64;
        for jump in jumps {
            elapsed_total += jump;
            let (date, minute) =
                calendar::add_minutes(TAPE_DATE, 0, elapsed_total).expect("valid stamp");

            let (bucket_date, bucket_minute) = clock.current_stamp();
            let since_bucket =
                calendar::minutes_between(date, minute, bucket_date, bucket_minute)
                    .expect("valid stamp");
            let expected = if since_bucket < i64::from(interval) {
                0
            } else {
                (since_bucket / i64::from(interval)).min(rows as i64)
            };

            let advanced = clock.advance(date, minute);
            prop_assert_eq!(advanced as i64, expected);
        }
    }

    /// Bars never violate low <= open/close <= high, whatever mix of trades
    /// and quotes arrives.
    #[test]
    fn ohlc_bars_keep_low_high_ordering(
        steps in prop::collection::vec((0i32..3, 0i32..3, -20i32..20), 1..100)
    ) {
        let mut clock = IntervalClock::new(5, 16).expect("valid clock");
        let mut series = OhlcSeries::new(&clock, 0);

        let mut minute = 570;
        for (jump, kind, tick) in steps {
            minute += jump;
            if minute >= 1440 {
                break;
            }
            let price = 100.0 + f64::from(tick) * 0.05;
            let print = print_at(TAPE_DATE, minute, kind, price, 1.0);
            clock.advance(print.date, print.minute);
            series.on_print(&clock, &print);
        }

        for bar in series.last_bars(16).expect("within capacity") {
            prop_assert!(bar.low <= bar.high);
            prop_assert!(bar.low <= bar.open && bar.open <= bar.high);
            prop_assert!(bar.low <= bar.close && bar.close <= bar.high);
        }
    }
}
