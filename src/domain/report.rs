//! Post-run performance reporting.

use chrono::{DateTime, Utc};

use super::fill::{Fill, SkippedSignal};
use super::ledger::{Ledger, RoundTrip};

/// Mark-to-market portfolio value at one bar close.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Immutable summary of a completed run. Derived from the ledger and the
/// per-bar equity curve; never feeds back into engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub realized_pnl: f64,

    pub round_trip_count: usize,
    pub trips_won: usize,
    pub trips_lost: usize,
    pub trips_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,

    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    pub skipped: Vec<SkippedSignal>,
    pub round_trips: Vec<RoundTrip>,
}

impl Report {
    pub fn compute(
        ledger: &Ledger,
        equity_curve: Vec<EquityPoint>,
        fills: Vec<Fill>,
        skipped: Vec<SkippedSignal>,
    ) -> Self {
        let initial_cash = ledger.initial_cash();
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_cash);

        let total_return = if initial_cash > 0.0 {
            (final_equity - initial_cash) / initial_cash
        } else {
            0.0
        };

        let max_drawdown = compute_drawdown(&equity_curve);

        let trips = ledger.round_trips();
        let mut trips_won = 0usize;
        let mut trips_lost = 0usize;
        let mut trips_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trip in trips {
            if trip.pnl > 0.0 {
                trips_won += 1;
                total_wins += trip.pnl;
                if trip.pnl > largest_win {
                    largest_win = trip.pnl;
                }
            } else if trip.pnl < 0.0 {
                trips_lost += 1;
                total_losses += trip.pnl.abs();
                if trip.pnl.abs() > largest_loss {
                    largest_loss = trip.pnl.abs();
                }
            } else {
                trips_breakeven += 1;
            }
        }

        let round_trip_count = trips.len();
        let win_rate = if round_trip_count > 0 {
            trips_won as f64 / round_trip_count as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trips_won > 0 {
            total_wins / trips_won as f64
        } else {
            0.0
        };

        let avg_loss = if trips_lost > 0 {
            total_losses / trips_lost as f64
        } else {
            0.0
        };

        Report {
            initial_cash,
            final_equity,
            total_return,
            max_drawdown,
            realized_pnl: ledger.realized_pnl(),
            round_trip_count,
            trips_won,
            trips_lost,
            trips_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            equity_curve,
            fills,
            skipped,
            round_trips: trips.to_vec(),
        }
    }
}

/// Maximum peak-to-trough decline as a fraction of the peak. Single
/// running-maximum scan over the curve.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
