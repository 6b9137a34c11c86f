//! Execution simulation: signal → fill decision.
//!
//! Converts a signal into at most one simulated fill at a deterministic
//! price, enforcing position and cash constraints against a ledger snapshot.
//! Infeasible signals are skipped with an audit record, never errored.

use super::bar::Bar;
use super::fill::{Fill, Side, SkipReason, SkippedSignal};
use super::signal::Signal;

/// How the buy quantity is derived from the ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingPolicy {
    /// Spend this fraction of available cash (fee-aware), 0 < fraction ≤ 1.
    FixedFraction(f64),
    /// Buy exactly this quantity, subject to feasibility gating.
    FixedQuantity(f64),
}

/// Execution parameters for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub fee_rate: f64,
    pub slippage_rate: f64,
    pub min_trade_unit: f64,
    pub sizing: SizingPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            fee_rate: 0.0,
            slippage_rate: 0.0,
            min_trade_unit: 0.0001,
            sizing: SizingPolicy::FixedFraction(1.0),
        }
    }
}

/// Buy fill price: close moved against the trader by the slippage rate.
pub fn apply_slippage_buy(close_price: f64, slippage_rate: f64) -> f64 {
    close_price * (1.0 + slippage_rate)
}

/// Sell fill price: close moved against the trader by the slippage rate.
pub fn apply_slippage_sell(close_price: f64, slippage_rate: f64) -> f64 {
    close_price * (1.0 - slippage_rate)
}

/// Round a quantity down to a whole number of minimum trade units.
pub fn round_to_lot(quantity: f64, min_trade_unit: f64) -> f64 {
    (quantity / min_trade_unit).floor() * min_trade_unit
}

/// Outcome of simulating one non-Hold signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Filled(Fill),
    Skipped(SkippedSignal),
}

/// Decide whether a signal produces a fill against the given ledger snapshot.
/// Hold produces nothing; Buy and Sell produce exactly one outcome each.
pub fn simulate(
    bar: &Bar,
    signal: Signal,
    cash: f64,
    position: f64,
    config: &ExecutionConfig,
) -> Option<SignalOutcome> {
    match signal {
        Signal::Hold => None,
        Signal::Buy => Some(simulate_buy(bar, cash, position, config)),
        Signal::Sell => Some(simulate_sell(bar, position, config)),
    }
}

/// Buy path: slip the close, size the order, gate on lot size and cash.
/// The engine holds at most one position, so a buy while holding is skipped.
pub fn simulate_buy(
    bar: &Bar,
    cash: f64,
    position: f64,
    config: &ExecutionConfig,
) -> SignalOutcome {
    if position > 0.0 {
        return skip(bar, Side::Buy, SkipReason::PositionAlreadyOpen);
    }

    let price = apply_slippage_buy(bar.close, config.slippage_rate);

    let quantity = match config.sizing {
        SizingPolicy::FixedFraction(fraction) => round_to_lot(
            (cash * fraction) / (price * (1.0 + config.fee_rate)),
            config.min_trade_unit,
        ),
        SizingPolicy::FixedQuantity(quantity) => quantity,
    };

    if quantity < config.min_trade_unit {
        return skip(
            bar,
            Side::Buy,
            SkipReason::BelowMinTradeUnit {
                quantity,
                minimum: config.min_trade_unit,
            },
        );
    }

    // Same expression, in the same order, as the ledger's debit; the gate
    // and the bookkeeping must agree to the last bit.
    let required = price * quantity * (1.0 + config.fee_rate);
    if required > cash {
        return skip(
            bar,
            Side::Buy,
            SkipReason::InsufficientCash {
                required,
                available: cash,
            },
        );
    }

    SignalOutcome::Filled(Fill {
        timestamp: bar.timestamp,
        side: Side::Buy,
        price,
        quantity,
    })
}

/// Sell path: the engine is long-only with a single position, so the entire
/// position is sold. Zero position means the signal is dropped.
pub fn simulate_sell(bar: &Bar, position: f64, config: &ExecutionConfig) -> SignalOutcome {
    if position <= 0.0 {
        return skip(bar, Side::Sell, SkipReason::NoOpenPosition);
    }

    SignalOutcome::Filled(Fill {
        timestamp: bar.timestamp,
        side: Side::Sell,
        price: apply_slippage_sell(bar.close, config.slippage_rate),
        quantity: position,
    })
}

fn skip(bar: &Bar, side: Side, reason: SkipReason) -> SignalOutcome {
    SignalOutcome::Skipped(SkippedSignal {
        timestamp: bar.timestamp,
        side,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    fn config(sizing: SizingPolicy) -> ExecutionConfig {
        ExecutionConfig {
            sizing,
            ..ExecutionConfig::default()
        }
    }

    #[test]
    fn slippage_moves_against_the_trader() {
        assert!((apply_slippage_buy(100.0, 0.001) - 100.1).abs() < 1e-9);
        assert!((apply_slippage_sell(100.0, 0.001) - 99.9).abs() < 1e-9);
        assert!((apply_slippage_buy(100.0, 0.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn round_to_lot_floors() {
        assert!((round_to_lot(1.23456, 0.001) - 1.234).abs() < 1e-9);
        assert!((round_to_lot(0.00009, 0.0001) - 0.0).abs() < 1e-12);
        assert!((round_to_lot(5.0, 1.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hold_produces_nothing() {
        let outcome = simulate(&bar(100.0), Signal::Hold, 10_000.0, 0.0, &config(SizingPolicy::FixedFraction(1.0)));
        assert!(outcome.is_none());
    }

    #[test]
    fn fixed_quantity_buy_fills_at_close() {
        let outcome = simulate_buy(&bar(100.0), 10_000.0, 0.0, &config(SizingPolicy::FixedQuantity(10.0)));
        match outcome {
            SignalOutcome::Filled(fill) => {
                assert_eq!(fill.side, Side::Buy);
                assert!((fill.price - 100.0).abs() < f64::EPSILON);
                assert!((fill.quantity - 10.0).abs() < f64::EPSILON);
            }
            SignalOutcome::Skipped(s) => panic!("expected fill, got skip: {}", s.reason),
        }
    }

    #[test]
    fn fixed_fraction_buy_spends_the_budget() {
        let cfg = ExecutionConfig {
            min_trade_unit: 0.0001,
            sizing: SizingPolicy::FixedFraction(0.5),
            ..ExecutionConfig::default()
        };
        let outcome = simulate_buy(&bar(100.0), 10_000.0, 0.0, &cfg);
        match outcome {
            SignalOutcome::Filled(fill) => {
                // 5000 / 100 = 50, already lot-aligned
                assert!((fill.quantity - 50.0).abs() < 1e-9);
            }
            SignalOutcome::Skipped(s) => panic!("expected fill, got skip: {}", s.reason),
        }
    }

    #[test]
    fn fixed_fraction_sizing_is_fee_aware() {
        let cfg = ExecutionConfig {
            fee_rate: 0.01,
            min_trade_unit: 0.0001,
            sizing: SizingPolicy::FixedFraction(1.0),
            ..ExecutionConfig::default()
        };
        let outcome = simulate_buy(&bar(100.0), 10_100.0, 0.0, &cfg);
        match outcome {
            SignalOutcome::Filled(fill) => {
                // Budget 10100 buys 100 units at 101 per unit all-in.
                assert!((fill.quantity - 100.0).abs() < 1e-9);
                // Notional + fee must not exceed cash.
                assert!(fill.price * fill.quantity * 1.01 <= 10_100.0 + 1e-9);
            }
            SignalOutcome::Skipped(s) => panic!("expected fill, got skip: {}", s.reason),
        }
    }

    #[test]
    fn buy_below_min_trade_unit_skipped() {
        let cfg = ExecutionConfig {
            min_trade_unit: 1.0,
            sizing: SizingPolicy::FixedFraction(1.0),
            ..ExecutionConfig::default()
        };
        // 50 cash at price 100 → 0.5 units, floored to 0.
        let outcome = simulate_buy(&bar(100.0), 50.0, 0.0, &cfg);
        match outcome {
            SignalOutcome::Skipped(skip) => {
                assert!(matches!(skip.reason, SkipReason::BelowMinTradeUnit { .. }));
            }
            SignalOutcome::Filled(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn fixed_quantity_buy_without_cash_skipped() {
        let outcome = simulate_buy(&bar(100.0), 500.0, 0.0, &config(SizingPolicy::FixedQuantity(10.0)));
        match outcome {
            SignalOutcome::Skipped(skip) => {
                assert!(matches!(
                    skip.reason,
                    SkipReason::InsufficientCash { required, available }
                        if required > available
                ));
            }
            SignalOutcome::Filled(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn buy_while_holding_skipped() {
        let outcome = simulate_buy(&bar(100.0), 10_000.0, 5.0, &config(SizingPolicy::FixedQuantity(10.0)));
        match outcome {
            SignalOutcome::Skipped(skip) => {
                assert_eq!(skip.reason, SkipReason::PositionAlreadyOpen);
            }
            SignalOutcome::Filled(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn sell_liquidates_entire_position() {
        let outcome = simulate_sell(&bar(150.0), 10.0, &ExecutionConfig::default());
        match outcome {
            SignalOutcome::Filled(fill) => {
                assert_eq!(fill.side, Side::Sell);
                assert!((fill.quantity - 10.0).abs() < f64::EPSILON);
                assert!((fill.price - 150.0).abs() < f64::EPSILON);
            }
            SignalOutcome::Skipped(s) => panic!("expected fill, got skip: {}", s.reason),
        }
    }

    #[test]
    fn sell_with_no_position_skipped() {
        let outcome = simulate_sell(&bar(150.0), 0.0, &ExecutionConfig::default());
        match outcome {
            SignalOutcome::Skipped(skip) => {
                assert_eq!(skip.reason, SkipReason::NoOpenPosition);
            }
            SignalOutcome::Filled(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn slipped_buy_stays_within_cash() {
        let cfg = ExecutionConfig {
            fee_rate: 0.0026,
            slippage_rate: 0.001,
            min_trade_unit: 0.0001,
            sizing: SizingPolicy::FixedFraction(1.0),
        };
        let outcome = simulate_buy(&bar(100.0), 1_000.0, 0.0, &cfg);
        match outcome {
            SignalOutcome::Filled(fill) => {
                let all_in = fill.price * fill.quantity * (1.0 + cfg.fee_rate);
                assert!(all_in <= 1_000.0 + 1e-9);
                assert!((fill.price - 100.1).abs() < 1e-9);
            }
            SignalOutcome::Skipped(s) => panic!("expected fill, got skip: {}", s.reason),
        }
    }
}
