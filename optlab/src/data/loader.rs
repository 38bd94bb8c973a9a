//! Data loader for daily close CSV files.
//!
//! Expected layout, one row per trading day, with a header:
//! - `date` in `YYYY-MM-DD`
//! - `close` as a positive decimal
//!
//! Extra columns (open, high, low, volume, ...) are ignored, so exports from
//! most data vendors load unchanged.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::types::PriceBar;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data at row {row}: {reason}")]
    InvalidData { row: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Close")]
    close: f64,
}

/// Load a price series from a CSV file on disk.
pub fn load_price_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceBar>, LoaderError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let file = std::fs::File::open(path)?;
    load_price_reader(file)
}

/// Load a price series from any reader producing CSV text.
///
/// Rows are returned sorted ascending by date; duplicate dates keep the
/// last occurrence.
pub fn load_price_reader<R: Read>(reader: R) -> Result<Vec<PriceBar>, LoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (idx, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = idx + 2; // header is row 1
        let record = record?;

        // Accept plain dates and datetime stamps ("2024-01-02 00:00:00-05:00").
        let date_str = record.date.get(..10).unwrap_or(&record.date);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            LoaderError::InvalidData {
                row,
                reason: format!("bad date {:?}: {}", record.date, e),
            }
        })?;

        if !record.close.is_finite() || record.close <= 0.0 {
            return Err(LoaderError::InvalidData {
                row,
                reason: format!("close must be positive, got {}", record.close),
            });
        }

        bars.push(PriceBar::new(date, record.close));
    }

    bars.sort_by_key(|b| b.date);
    bars.reverse();
    bars.dedup_by_key(|b| b.date);
    bars.reverse();

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_basic_csv() {
        let csv = "date,close\n2024-01-03,101.5\n2024-01-02,100.0\n";
        let bars = load_price_reader(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 101.5);
    }

    #[test]
    fn test_vendor_columns_and_timestamps() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-02 00:00:00-05:00,99,101,98,100.25,1000\n";
        let bars = load_price_reader(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 100.25);
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let csv = "date,close\n2024-01-02,100\n2024-01-02,105\n";
        let bars = load_price_reader(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 105.0);
    }

    #[test]
    fn test_rejects_non_positive_close() {
        let csv = "date,close\n2024-01-02,0\n";
        let err = load_price_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidData { row: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_price_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }
}
