//! Fill events and the skipped-signal audit trail.

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A simulated executed trade. Created only by the execution simulator once a
/// signal passes feasibility gating; immutable afterwards and appended to the
/// run's ordered fill log.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
}

/// Why a non-Hold signal produced no fill. These are market conditions, not
/// errors; the run continues.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InsufficientCash { required: f64, available: f64 },
    BelowMinTradeUnit { quantity: f64, minimum: f64 },
    NoOpenPosition,
    PositionAlreadyOpen,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientCash {
                required,
                available,
            } => write!(f, "insufficient cash: need {required:.2}, have {available:.2}"),
            SkipReason::BelowMinTradeUnit { quantity, minimum } => {
                write!(f, "quantity {quantity} below minimum trade unit {minimum}")
            }
            SkipReason::NoOpenPosition => write!(f, "no open position to sell"),
            SkipReason::PositionAlreadyOpen => write!(f, "position already open"),
        }
    }
}

/// Audit-trail record for a signal that was dropped rather than filled.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSignal {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub reason: SkipReason,
}
