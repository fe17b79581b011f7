//! Shared data model and calendar arithmetic for the tapeflow engine

pub mod calendar;
pub mod constants;
pub mod errors;
pub mod types;

pub use errors::TapeError;
pub use types::{Print, PrintKind, QuoteBoard};
