//! End-to-end scenarios through the full engine

use std::io::{BufRead, BufReader, Write};

use pretty_assertions::assert_eq;
use rstest::*;
use tape_aggregator::{AggregatorConfig, TapeAggregator};
use tapeflow_common::{PrintKind, TapeError};
use test_utils::{print_line, tape, KIND_ASK, KIND_BID, KIND_TRADED, TAPE_DATE};

#[fixture]
fn default_engine() -> TapeAggregator {
    TapeAggregator::new(&AggregatorConfig::default()).expect("valid config")
}

#[test]
fn test_five_minute_rollover_end_to_end() {
    let config = AggregatorConfig {
        resolutions: vec![5],
        ..AggregatorConfig::default()
    };
    let mut engine = TapeAggregator::new(&config).expect("valid config");

    engine
        .on_print_line(&print_line(TAPE_DATE, 0, KIND_TRADED, 101.00, 10.0))
        .expect("well-formed print");
    engine
        .on_print_line(&print_line(TAPE_DATE, 7, KIND_TRADED, 102.00, 5.0))
        .expect("well-formed print");

    let clock = engine.clock(5).expect("5m clock");
    assert_eq!(clock.rows_advanced(), 1);
    assert_eq!(clock.current_stamp(), (TAPE_DATE, 5));

    let bars = engine.last_bars(5, 2).expect("within capacity");
    assert_eq!(bars[0].open, 101.00);
    assert_eq!(bars[0].close, 101.00); // fill-forward closed the old bar
    assert_eq!(bars[1].open, 102.00);

    let volume = engine.last_volume(5, 2).expect("within capacity");
    assert_eq!(volume[0].traded, 10.0);
    assert_eq!(volume[1].traded, 5.0);
}

#[rstest]
fn test_default_config_full_pipeline(mut default_engine: TapeAggregator) {
    let lines = tape(&[
        (570, KIND_BID, 100.95, 5.0),
        (570, KIND_ASK, 101.05, 8.0),
        (570, KIND_TRADED, 101.00, 10.0),
        (571, KIND_TRADED, 101.05, 7.0),
        (572, KIND_BID, 100.90, 4.0),
        (573, KIND_TRADED, 100.95, 12.0),
        (590, KIND_TRADED, 101.10, 6.0),
    ]);
    for line in &lines {
        default_engine.on_print_line(line).expect("scripted print");
    }
    assert_eq!(default_engine.prints_seen(), lines.len() as u64);

    // quote board reflects the latest print per kind
    let quotes = default_engine.quotes();
    assert_eq!(quotes.price(PrintKind::Bid), 100.90);
    assert_eq!(quotes.price(PrintKind::Ask), 101.05);
    assert_eq!(quotes.price(PrintKind::Traded), 101.10);

    // every configured resolution carries the same trades
    for resolution in default_engine.resolutions() {
        let volume = default_engine.last_volume(resolution, 1).expect("series");
        assert!(volume[0].traded > 0.0);
    }
    // the hour bar spans the whole session so far
    let hour_bars = default_engine.last_bars(60, 1).expect("60m series");
    assert_eq!(hour_bars[0].open, 101.00);
    assert_eq!(hour_bars[0].high, 101.10);
    assert_eq!(hour_bars[0].low, 100.95);

    // the 1-minute traded histogram accumulated by price bucket
    let traded = &default_engine.analytics().traded_volume()[0];
    assert_eq!(traded.table().sum_at(101.00), Some(10.0));
    assert_eq!(traded.table().sum_at(100.95), Some(12.0));

    // VWAP horizons came alive with the trades
    let tracker = &default_engine.analytics().vwap()[0];
    assert!(tracker.horizons().iter().all(|h| h.vwap > 0.0));
}

#[rstest]
fn test_malformed_lines_rejected_without_state_change(mut default_engine: TapeAggregator) {
    default_engine
        .on_print_line(&print_line(TAPE_DATE, 570, KIND_TRADED, 101.25, 50.0))
        .expect("well-formed print");
    let bars_before = default_engine.last_bars(1, 4).expect("within capacity");

    for bad in [
        "20250106,0930,2,101.25",     // missing field
        "20250106,0930,2,abc,50",     // unparsable price
        "20251301,0930,2,101.25,50",  // impossible date
        "20250106,9930,2,101.25,50",  // impossible time
        "",                           // empty line
    ] {
        assert!(matches!(
            default_engine.on_print_line(bad),
            Err(TapeError::InvalidPrint(_))
        ));
    }

    assert_eq!(default_engine.prints_seen(), 1);
    assert_eq!(default_engine.quotes().price(PrintKind::Traded), 101.25);
    assert_eq!(
        default_engine.last_bars(1, 4).expect("within capacity"),
        bars_before
    );
}

#[rstest]
fn test_settlement_prints_count_as_trades(mut default_engine: TapeAggregator) {
    default_engine
        .on_print_line(&print_line(TAPE_DATE, 570, 6, 99.75, 10.0))
        .expect("settlement print");

    assert_eq!(default_engine.quotes().price(PrintKind::Traded), 99.75);
    let bars = default_engine.last_bars(1, 1).expect("within capacity");
    assert_eq!(bars[0].open, 99.75);
    let volume = default_engine.last_volume(1, 1).expect("within capacity");
    assert_eq!(volume[0].traded, 10.0);
}

#[rstest]
fn test_quote_only_stream_keeps_trade_windows_decaying(mut default_engine: TapeAggregator) {
    default_engine
        .on_print_line(&print_line(TAPE_DATE, 570, KIND_TRADED, 100.00, 10.0))
        .expect("scripted print");
    let traded = &default_engine.analytics().traded_volume()[0];
    assert_eq!(traded.table().sum_at(100.00), Some(10.0));

    // an hour of bid-only prints; the 60-minute traded histogram must decay
    // through the eviction-only ticks it receives on every print
    for minute in 571..=631 {
        default_engine
            .on_print_line(&print_line(TAPE_DATE, minute, KIND_BID, 99.95, 1.0))
            .expect("scripted print");
    }

    let traded = &default_engine.analytics().traded_volume()[0];
    assert_eq!(traded.table().sum_at(100.00), Some(0.0));
    // while the bid histogram kept accumulating
    let bid = &default_engine.analytics().bid_volume()[0];
    assert!(bid.table().sum_at(99.95).unwrap_or(0.0) > 0.0);
    // the VWAP windows emptied without dividing by zero: the 1m horizon
    // resets outright on each quiet boundary, the 5m one decays by
    // subtraction and keeps its last figure
    let tracker = &default_engine.analytics().vwap()[0];
    assert_eq!(tracker.horizons()[0].volume, 0.0);
    assert_eq!(tracker.horizons()[0].vwap, 0.0);
    assert_eq!(tracker.horizons()[1].volume, 0.0);
    assert_eq!(tracker.horizons()[1].vwap, 100.0);
}

#[rstest]
fn test_replay_from_recorded_file(mut default_engine: TapeAggregator) {
    let mut file = tempfile::NamedTempFile::new().expect("temp tape");
    for line in tape(&[
        (570, KIND_TRADED, 101.00, 10.0),
        (571, KIND_TRADED, 101.10, 5.0),
        (575, KIND_TRADED, 100.90, 8.0),
    ]) {
        writeln!(file, "{line}").expect("write tape");
    }
    file.flush().expect("flush tape");

    let reader = BufReader::new(file.reopen().expect("reopen tape"));
    for line in reader.lines() {
        let line = line.expect("read tape");
        default_engine.on_print_line(&line).expect("recorded print");
    }

    assert_eq!(default_engine.prints_seen(), 3);
    let bars = default_engine.last_bars(5, 2).expect("within capacity");
    assert_eq!(bars[0].high, 101.10);
    assert_eq!(bars[1].open, 100.90);
}

#[rstest]
fn test_accessor_errors(default_engine: TapeAggregator) {
    assert!(matches!(
        default_engine.last_bars(1, 5000),
        Err(TapeError::InvalidArgument(_))
    ));
    assert!(matches!(
        default_engine.last_bars(7, 1),
        Err(TapeError::InvalidArgument(_))
    ));
}
