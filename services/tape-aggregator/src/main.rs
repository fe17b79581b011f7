//! Tape Aggregator - replay driver
//!
//! Feeds a recorded (or synthetic) print tape through the aggregation
//! engine: a reader thread produces raw lines and hands them over a channel
//! to the single ingestion loop, which logs rolling aggregate summaries.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::{self, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tape_aggregator::{AggregatorConfig, TapeAggregator};
use tracing::{info, warn};

const SERVICE_NAME: &str = "tape-aggregator";
const FEED_CHANNEL_CAPACITY: usize = 1024;
const SUMMARY_EVERY_PRINTS: u64 = 10_000;
const SUMMARY_RESOLUTION: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = SERVICE_NAME, about = "Replay a market print tape through the aggregation engine")]
struct Args {
    /// CSV tape file (`DATE,TIME,TYPE,PRICE,SIZE` per line); omit to generate
    /// a synthetic tape instead
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of prints to generate in synthetic mode
    #[arg(long, default_value_t = 100_000)]
    synthetic: u64,

    /// Stop after this many prints (0 = entire tape)
    #[arg(long, default_value_t = 0)]
    max_prints: u64,

    /// Pacing delay between prints, in microseconds
    #[arg(long, default_value_t = 0)]
    delay_micros: u64,

    /// JSON file overriding the built-in aggregation tables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AggregatorConfig::default(),
    };
    let mut engine = TapeAggregator::new(&config).context("configuring the engine")?;

    let (tx, rx): (Sender<String>, Receiver<String>) = channel::bounded(FEED_CHANNEL_CAPACITY);
    let feed = spawn_feed(&args, tx)?;

    let mut rejected = 0u64;
    for line in rx.iter() {
        match engine.on_print_line(&line) {
            Ok(()) => {
                if engine.prints_seen() % SUMMARY_EVERY_PRINTS == 0 {
                    log_summary(&engine);
                }
            }
            Err(err) => {
                rejected += 1;
                warn!(%err, line = line.as_str(), "rejected print");
            }
        }
    }
    feed.join()
        .map_err(|_| anyhow::anyhow!("feed thread panicked"))?;

    log_summary(&engine);
    info!(
        prints = engine.prints_seen(),
        rejected, "tape replay complete"
    );
    Ok(())
}

/// Produce tape lines on a worker thread; the channel serializes the handoff
/// into the single-writer engine loop.
fn spawn_feed(args: &Args, tx: Sender<String>) -> Result<thread::JoinHandle<()>> {
    let delay = Duration::from_micros(args.delay_micros);
    let limit = if args.max_prints == 0 {
        u64::MAX
    } else {
        args.max_prints
    };

    if let Some(path) = &args.file {
        let file =
            File::open(path).with_context(|| format!("opening tape {}", path.display()))?;
        info!(tape = %path.display(), "replaying recorded tape");
        Ok(thread::spawn(move || {
            let reader = BufReader::new(file);
            for line in reader.lines().take(usize::try_from(limit).unwrap_or(usize::MAX)) {
                let Ok(line) = line else { break };
                if line.is_empty() || tx.send(line).is_err() {
                    break;
                }
                pace(delay);
            }
        }))
    } else {
        let count = args.synthetic.min(limit);
        info!(prints = count, "replaying synthetic tape");
        Ok(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(0x7a9e);
            let mut walk = SyntheticWalk::default();
            for _ in 0..count {
                if tx.send(walk.next_line(&mut rng)).is_err() {
                    break;
                }
                pace(delay);
            }
        }))
    }
}

fn pace(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Random-walk print generator: a drifting mid price quoted one tick wide,
/// with time advancing a minute every so often.
struct SyntheticWalk {
    date: i32,
    minute: i32,
    mid_ticks: i64,
}

impl Default for SyntheticWalk {
    fn default() -> Self {
        Self {
            date: 20250106,
            minute: 570, // 09:30
            mid_ticks: 10_000,
        }
    }
}

impl SyntheticWalk {
    fn next_line(&mut self, rng: &mut StdRng) -> String {
        if rng.gen_ratio(1, 40) {
            self.minute += 1;
            if self.minute >= 1440 {
                self.minute = 0;
                self.date += 1; // synthetic tape stays inside one month
            }
        }
        self.mid_ticks = (self.mid_ticks + rng.gen_range(-2i64..=2)).max(100);

        let kind = rng.gen_range(0u32..3);
        let price_ticks = match kind {
            0 => self.mid_ticks - 1,
            1 => self.mid_ticks + 1,
            _ => self.mid_ticks,
        };
        #[allow(clippy::cast_precision_loss)]
        let price = price_ticks as f64 / 100.0;
        let size = rng.gen_range(1u32..100);

        let hhmm = self.minute / 60 * 100 + self.minute % 60;
        format!("{},{:04},{},{:.2},{}", self.date, hhmm, kind, price, size)
    }
}

fn log_summary(engine: &TapeAggregator) {
    if let Ok(bars) = engine.last_bars(SUMMARY_RESOLUTION, 1) {
        if let Some(bar) = bars.last() {
            info!(
                open = bar.open,
                high = bar.high,
                low = bar.low,
                close = bar.close,
                "current 1m bar"
            );
        }
    }
    for tracker in engine.analytics().vwap() {
        for horizon in tracker.horizons() {
            if horizon.volume != 0.0 {
                info!(
                    timeframe = horizon.timeframe,
                    vwap = horizon.vwap,
                    volume = horizon.volume,
                    "vwap"
                );
            }
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", SERVICE_NAME.replace('-', "_")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
