//! CSV candle import.
//!
//! Expected header: `time,open,high,low,close[,volume]` (case-insensitive,
//! extra columns ignored). `time` may be RFC 3339, `YYYY-MM-DD` (midnight UTC),
//! or integer Unix seconds. Rows must be strictly ascending in time.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Candle;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: {source}")]
    Record {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unrecognized time '{value}'")]
    BadTime { row: usize, value: String },

    #[error("row {row}: time is not after the previous row")]
    OutOfOrder { row: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse a timestamp in any of the accepted formats.
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Read candles from any CSV source.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Normalize header case so "Close" and "close" both bind.
    let headers = rdr.headers()?.clone();
    rdr.set_headers(headers.iter().map(|h| h.to_ascii_lowercase()).collect());

    let mut candles: Vec<Candle> = Vec::new();
    for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // Row numbers are 1-based and count the header line.
        let row = i + 2;
        let record = result.map_err(|source| CsvError::Record { row, source })?;
        let time = parse_time(&record.time).ok_or_else(|| CsvError::BadTime {
            row,
            value: record.time.clone(),
        })?;
        if candles.last().is_some_and(|prev| prev.time >= time) {
            return Err(CsvError::OutOfOrder { row });
        }
        candles.push(Candle {
            time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.unwrap_or(0.0),
        });
    }

    let insane = candles.iter().filter(|c| !c.is_sane()).count();
    if insane > 0 {
        tracing::warn!(insane, total = candles.len(), "CSV contains candles failing OHLC sanity checks");
    }
    Ok(candles)
}

/// Load candles from a CSV file on disk.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, CsvError> {
    let file = std::fs::File::open(path).map_err(|source| CsvError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_candles(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reads_mixed_time_formats() {
        let data = "\
Time,Open,High,Low,Close,Volume
2024-01-02,100,105,99,104,1200
2024-01-03T00:00:00Z,104,106,103,105,900
1704326400,105,107,104,106,
";
        let candles = read_candles(data.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[0].time,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(candles[2].time, Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap());
        assert_eq!(candles[2].volume, 0.0);
        assert_eq!(candles[1].close, 105.0);
    }

    #[test]
    fn volume_column_optional() {
        let data = "time,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n";
        let candles = read_candles(data.as_bytes()).unwrap();
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let data = "time,open,high,low,close\n2024-01-03,1,2,0.5,1.5\n2024-01-02,1,2,0.5,1.5\n";
        let err = read_candles(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::OutOfOrder { row: 3 }));
    }

    #[test]
    fn rejects_bad_time() {
        let data = "time,open,high,low,close\nyesterday,1,2,0.5,1.5\n";
        let err = read_candles(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::BadTime { row: 2, .. }));
    }

    #[test]
    fn rejects_non_numeric_price() {
        let data = "time,open,high,low,close\n2024-01-02,1,2,0.5,abc\n";
        let err = read_candles(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::Record { row: 2, .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spy.csv");
        std::fs::write(&path, "time,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.5,10\n").unwrap();
        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].volume, 10.0);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = load_candles(Path::new("/nonexistent/candles.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/candles.csv"));
    }
}
