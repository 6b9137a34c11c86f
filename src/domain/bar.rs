//! OHLCV bar representation and series validation.

use chrono::{DateTime, Utc};

use super::error::SeriesError;

/// One OHLC-plus-volume observation for a fixed time interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Check the single-bar invariants: all prices positive, high at or above
    /// every other price, low at or below every other price.
    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(SeriesError::NonPositivePrice {
                timestamp: self.timestamp,
            });
        }
        if self.high < self.open.max(self.close).max(self.low)
            || self.low > self.open.min(self.close).min(self.high)
        {
            return Err(SeriesError::InconsistentRange {
                timestamp: self.timestamp,
            });
        }
        Ok(())
    }
}

/// Validate a whole series before the engine touches it: per-bar invariants
/// plus strictly ascending, unique timestamps. Gaps are tolerated.
pub fn validate_series(bars: &[Bar]) -> Result<(), SeriesError> {
    let mut prev: Option<DateTime<Utc>> = None;
    for bar in bars {
        bar.validate()?;
        if let Some(prev_ts) = prev {
            if bar.timestamp == prev_ts {
                return Err(SeriesError::DuplicateTimestamp {
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < prev_ts {
                return Err(SeriesError::OutOfOrder {
                    timestamp: bar.timestamp,
                });
            }
        }
        prev = Some(bar.timestamp);
    }
    Ok(())
}
