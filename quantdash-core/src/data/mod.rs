//! Candle sources: CSV import and synthetic generation.

pub mod csv_import;
pub mod synthetic;

pub use csv_import::{load_candles, parse_time, read_candles, CsvError};
pub use synthetic::{candles_from_closes, synthetic_candles};
