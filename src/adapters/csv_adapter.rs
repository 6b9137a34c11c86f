//! CSV file data adapter.
//!
//! One `{PAIR}.csv` file per trading pair in a base directory, with the
//! header `timestamp,open,high,low,close,volume`. Timestamps are unix
//! seconds, the way exchange OHLC dumps arrive.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, pair: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", pair))
    }

    fn read_all(&self, pair: &str) -> Result<Vec<Bar>, SigtraderError> {
        let path = self.csv_path(pair);
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = parse_timestamp(field(&record, 0, "timestamp")?)?;
            let open: f64 = parse_number(field(&record, 1, "open")?, "open")?;
            let high: f64 = parse_number(field(&record, 2, "high")?, "high")?;
            let low: f64 = parse_number(field(&record, 3, "low")?, "low")?;
            let close: f64 = parse_number(field(&record, 4, "close")?, "close")?;
            let volume: f64 = parse_number(field(&record, 5, "volume")?, "volume")?;

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, SigtraderError> {
    record.get(index).ok_or_else(|| SigtraderError::Data {
        reason: format!("missing {name} column"),
    })
}

fn parse_number(value: &str, name: &str) -> Result<f64, SigtraderError> {
    value.parse().map_err(|e| SigtraderError::Data {
        reason: format!("invalid {name} value: {e}"),
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SigtraderError> {
    let seconds: i64 = value.parse().map_err(|e| SigtraderError::Data {
        reason: format!("invalid timestamp: {e}"),
    })?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| SigtraderError::Data {
        reason: format!("timestamp {seconds} out of range"),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        pair: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        let bars = self.read_all(pair)?;
        Ok(bars
            .into_iter()
            .filter(|bar| bar.timestamp >= start && bar.timestamp <= end)
            .collect())
    }

    fn latest_bars(
        &self,
        pair: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        let bars = self.read_all(pair)?;
        Ok(match after {
            Some(after) => bars
                .into_iter()
                .filter(|bar| bar.timestamp > after)
                .collect(),
            None => bars,
        })
    }

    fn list_pairs(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut pairs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(pair) = name_str.strip_suffix(".csv") {
                pairs.push(pair.to_string());
            }
        }

        pairs.sort();
        Ok(pairs)
    }

    fn data_range(
        &self,
        pair: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SigtraderError> {
        let bars = self.read_all(pair)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
