//! Print data model for the market tape.

use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::constants::time::MINUTES_PER_DAY;
use crate::errors::TapeError;

/// Number of print kinds carried by the feed
pub const PRINT_KIND_COUNT: usize = 3;

/// Raw field count of a well-formed tape line
const PRINT_FIELD_COUNT: usize = 5;

/// Kind of market event carried by a print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintKind {
    /// Bid quote
    Bid,
    /// Ask quote
    Ask,
    /// Executed trade
    Traded,
}

impl PrintKind {
    /// Decode the feed's numeric type code. Codes above 2 (e.g. settlement
    /// prints, 6) are coerced to `Traded`.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Bid,
            1 => Self::Ask,
            _ => Self::Traded,
        }
    }

    /// Column slot in bid/ask/traded accumulators
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            Self::Bid => 0,
            Self::Ask => 1,
            Self::Traded => 2,
        }
    }
}

/// One normalized market event from the raw tape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Print {
    /// Calendar date as `YYYYMMDD`
    pub date: i32,
    /// Minutes since midnight
    pub minute: i32,
    /// Bid, ask or traded
    pub kind: PrintKind,
    /// Event price
    pub price: f64,
    /// Event size; integral in the raw feed
    pub size: f64,
}

impl Print {
    /// Parse a raw `DATE,TIME,TYPE,PRICE,SIZE` tape line, where `TIME` is
    /// encoded `HHMM.fractional`.
    ///
    /// Rejects the line without side effects on a wrong field count or an
    /// unparsable field; an out-of-range type code is coerced, not rejected.
    pub fn parse(line: &str) -> Result<Self, TapeError> {
        let mut fields = [0.0f64; PRINT_FIELD_COUNT];
        let mut count = 0;

        for raw in line.split(',') {
            if count == PRINT_FIELD_COUNT {
                return Err(TapeError::InvalidPrint(format!(
                    "expected {PRINT_FIELD_COUNT} fields: {line:?}"
                )));
            }
            fields[count] = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| TapeError::InvalidPrint(format!("unparseable field {raw:?}")))?;
            count += 1;
        }
        if count != PRINT_FIELD_COUNT {
            return Err(TapeError::InvalidPrint(format!(
                "expected {PRINT_FIELD_COUNT} fields: {line:?}"
            )));
        }

        #[allow(clippy::cast_possible_truncation)]
        let date = fields[0] as i32;
        calendar::date_from_int(date)?;

        let minute = hhmm_to_minute(fields[1])?;

        #[allow(clippy::cast_possible_truncation)]
        let code = fields[2] as i64;

        Ok(Self {
            date,
            minute,
            kind: PrintKind::from_code(code),
            price: fields[3],
            size: fields[4],
        })
    }
}

/// Convert the feed's `HHMM.fractional` time encoding to whole minutes since
/// midnight (the fraction is dropped, matching the bucketing granularity).
fn hhmm_to_minute(hhmm: f64) -> Result<i32, TapeError> {
    let hours = (hhmm / 100.0).floor();
    let minutes = hours * 60.0 + (hhmm - hours * 100.0);
    if !(0.0..MINUTES_PER_DAY as f64).contains(&minutes) {
        return Err(TapeError::InvalidPrint(format!("time {hhmm} out of range")));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(minutes as i32)
}

/// Last observed price and size per print kind, plus the most recent prints.
///
/// Mirrors what a quote panel binds to: updated on every accepted print,
/// read back between prints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuoteBoard {
    prices: [f64; PRINT_KIND_COUNT],
    sizes: [f64; PRINT_KIND_COUNT],
    last: Option<Print>,
    previous: Option<Print>,
}

impl QuoteBoard {
    /// Fold one accepted print into the board.
    pub fn record(&mut self, print: &Print) {
        self.previous = self.last;
        self.last = Some(*print);
        let slot = print.kind.as_index();
        self.prices[slot] = print.price;
        self.sizes[slot] = print.size;
    }

    /// Last price seen for `kind`, zero before the first such print
    #[must_use]
    pub const fn price(&self, kind: PrintKind) -> f64 {
        self.prices[kind.as_index()]
    }

    /// Last size seen for `kind`, zero before the first such print
    #[must_use]
    pub const fn size(&self, kind: PrintKind) -> f64 {
        self.sizes[kind.as_index()]
    }

    /// Most recent accepted print
    #[must_use]
    pub const fn last(&self) -> Option<&Print> {
        self.last.as_ref()
    }

    /// Print before the most recent one
    #[must_use]
    pub const fn previous(&self) -> Option<&Print> {
        self.previous.as_ref()
    }
}
