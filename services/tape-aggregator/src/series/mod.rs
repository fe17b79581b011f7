//! Clock-slaved interval series: OHLC bars and per-interval volume.

pub mod ohlc;
pub mod volume;

pub use ohlc::{OhlcBar, OhlcSeries};
pub use volume::{VolumeRow, VolumeSeries};
