//! Authoritative cash/position bookkeeping for a run.
//!
//! The ledger is the single source of truth for portfolio state. All fields
//! are private; the only mutation path is [`Ledger::apply_fill`], which keeps
//! the single-writer discipline enforced by the type system rather than by
//! convention.

use chrono::{DateTime, Utc};

use super::fill::{Fill, Side};

/// A completed Buy → Sell cycle, recorded when a sell closes the position.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// (exit price − cost basis) × quantity. Fees move cash, not this figure.
    pub pnl: f64,
}

/// Raised when a fill would drive cash negative. The execution simulator is
/// required to gate such fills out, so this firing means an engine defect,
/// not a market condition. The ledger state is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("fill ({side} {quantity} @ {price}) would drive cash to {resulting_cash:.2}")]
pub struct LedgerViolation {
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub resulting_cash: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    position: f64,
    cost_basis: f64,
    realized_pnl: f64,
    fee_rate: f64,
    initial_cash: f64,
    entry_timestamp: Option<DateTime<Utc>>,
    round_trips: Vec<RoundTrip>,
}

impl Ledger {
    pub fn new(initial_cash: f64, fee_rate: f64) -> Self {
        Ledger {
            cash: initial_cash,
            position: 0.0,
            cost_basis: 0.0,
            realized_pnl: 0.0,
            fee_rate,
            initial_cash,
            entry_timestamp: None,
            round_trips: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn cost_basis(&self) -> f64 {
        self.cost_basis
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn round_trips(&self) -> &[RoundTrip] {
        &self.round_trips
    }

    /// Mark-to-market portfolio value at the given close price. Pure query.
    pub fn mark_to_market(&self, close_price: f64) -> f64 {
        self.cash + self.position * close_price
    }

    /// Apply a fill to the ledger.
    ///
    /// Buy: cash −= price × qty × (1 + fee_rate), position += qty, cost basis
    /// becomes the quantity-weighted average fill price. Sell: cash +=
    /// price × qty × (1 − fee_rate), realized pnl += (price − cost basis) ×
    /// qty, position reduced (and the cost basis reset once flat).
    ///
    /// Rejects the fill, leaving state unchanged, if the resulting cash would
    /// go negative or a sell exceeds the open position.
    pub fn apply_fill(&mut self, fill: &Fill) -> Result<(), LedgerViolation> {
        match fill.side {
            Side::Buy => {
                let cost = fill.price * fill.quantity * (1.0 + self.fee_rate);
                let resulting_cash = self.cash - cost;
                if resulting_cash < 0.0 {
                    return Err(self.violation(fill, resulting_cash));
                }
                let total_quantity = self.position + fill.quantity;
                self.cost_basis = (self.cost_basis * self.position
                    + fill.price * fill.quantity)
                    / total_quantity;
                self.cash = resulting_cash;
                if self.position == 0.0 {
                    self.entry_timestamp = Some(fill.timestamp);
                }
                self.position = total_quantity;
            }
            Side::Sell => {
                if fill.quantity > self.position {
                    return Err(self.violation(fill, self.cash));
                }
                let proceeds = fill.price * fill.quantity * (1.0 - self.fee_rate);
                let pnl = (fill.price - self.cost_basis) * fill.quantity;
                self.cash += proceeds;
                self.realized_pnl += pnl;
                self.position -= fill.quantity;

                let entry_timestamp = self.entry_timestamp.unwrap_or(fill.timestamp);
                self.round_trips.push(RoundTrip {
                    entry_timestamp,
                    exit_timestamp: fill.timestamp,
                    entry_price: self.cost_basis,
                    exit_price: fill.price,
                    quantity: fill.quantity,
                    pnl,
                });

                if self.position == 0.0 {
                    self.cost_basis = 0.0;
                    self.entry_timestamp = None;
                }
            }
        }
        Ok(())
    }

    fn violation(&self, fill: &Fill, resulting_cash: f64) -> LedgerViolation {
        LedgerViolation {
            side: fill.side,
            price: fill.price,
            quantity: fill.quantity,
            resulting_cash,
        }
    }
}
