//! Price series access port trait.

use chrono::{DateTime, Utc};

use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;

/// Read contract for historical and incrementally-arriving bars. Adapters
/// must return bars sorted ascending by timestamp with no duplicates; the
/// engine re-validates at ingestion and fails fast on violations.
pub trait DataPort {
    /// Bars for a pair within an inclusive time range.
    fn fetch_bars(
        &self,
        pair: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SigtraderError>;

    /// Bars strictly after `after` (all bars when `None`). The polling
    /// primitive for paper trading.
    fn latest_bars(
        &self,
        pair: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, SigtraderError>;

    fn list_pairs(&self) -> Result<Vec<String>, SigtraderError>;

    /// (first timestamp, last timestamp, bar count) for a pair, or `None`
    /// when no data exists.
    fn data_range(
        &self,
        pair: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SigtraderError>;
}
