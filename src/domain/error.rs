//! Domain error types.

use chrono::{DateTime, Utc};

/// Fail-fast validation errors for an ingested bar series. Raised before any
/// ledger mutation, so an aborted run leaves no partial state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("bars out of order at {timestamp}")]
    OutOfOrder { timestamp: DateTime<Utc> },

    #[error("duplicate bar timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: DateTime<Utc> },

    #[error("non-positive price in bar at {timestamp}")]
    NonPositivePrice { timestamp: DateTime<Utc> },

    #[error("high/low outside open/close envelope at {timestamp}")]
    InconsistentRange { timestamp: DateTime<Utc> },
}

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for pair {pair}")]
    NoData { pair: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid strategy parameter {param}: {reason}")]
    StrategyParam { param: String, reason: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    /// A fill passed the execution gate but would have driven the ledger into
    /// negative cash. This is an engine defect, never a market condition, and
    /// is surfaced distinctly from ordinary skipped signals.
    #[error("invariant violation at {timestamp}: {reason}")]
    InvariantViolation {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::Data { .. } | SigtraderError::NoData { .. } => 3,
            SigtraderError::UnknownStrategy { .. } | SigtraderError::StrategyParam { .. } => 4,
            SigtraderError::Series(_) => 5,
            SigtraderError::InvariantViolation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
