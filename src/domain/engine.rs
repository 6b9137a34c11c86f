//! The per-bar engine loop, shared by batch backtests and paper trading.
//!
//! Each bar is processed to completion — effective signal, fill decision,
//! ledger update, equity snapshot — before the next bar is considered. That
//! sequential-per-bar contract is what guarantees the ordering invariants:
//! fills land in bar order and no state is observable mid-bar.

use chrono::{DateTime, Utc};

use super::bar::{validate_series, Bar};
use super::error::{SeriesError, SigtraderError};
use super::execution::{simulate, simulate_sell, ExecutionConfig, SignalOutcome};
use super::fill::{Fill, SkippedSignal};
use super::ledger::Ledger;
use super::report::{EquityPoint, Report};
use super::signal::{collect_signals, effective_signal, Signal};
use super::strategy::Strategy;

/// Parameters for one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub execution: ExecutionConfig,
    /// Close any open position at the final close, as a regular fill through
    /// the ledger. Matches the behavior of closing out before reporting.
    pub close_at_end: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_cash: 10_000.0,
            execution: ExecutionConfig::default(),
            close_at_end: true,
        }
    }
}

/// Incremental engine: feed bars one at a time, then [`Engine::finish`].
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    ledger: Ledger,
    fills: Vec<Fill>,
    skipped: Vec<SkippedSignal>,
    equity_curve: Vec<EquityPoint>,
    last_bar: Option<(DateTime<Utc>, f64)>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let ledger = Ledger::new(config.initial_cash, config.execution.fee_rate);
        Engine {
            config,
            ledger,
            fills: Vec::new(),
            skipped: Vec::new(),
            equity_curve: Vec::new(),
            last_bar: None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn skipped(&self) -> &[SkippedSignal] {
        &self.skipped
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_bar.map(|(timestamp, _)| timestamp)
    }

    /// Process one bar to completion. Validates the bar against the series
    /// invariants (so streaming callers get the same fail-fast behavior as
    /// batch ingestion) before any state is touched.
    pub fn process_bar(&mut self, bar: &Bar, signal: Signal) -> Result<(), SigtraderError> {
        bar.validate()?;
        if let Some((last_ts, _)) = self.last_bar {
            if bar.timestamp == last_ts {
                return Err(SeriesError::DuplicateTimestamp {
                    timestamp: bar.timestamp,
                }
                .into());
            }
            if bar.timestamp < last_ts {
                return Err(SeriesError::OutOfOrder {
                    timestamp: bar.timestamp,
                }
                .into());
            }
        }

        let outcome = simulate(
            bar,
            signal,
            self.ledger.cash(),
            self.ledger.position(),
            &self.config.execution,
        );
        match outcome {
            Some(SignalOutcome::Filled(fill)) => self.apply(fill)?,
            Some(SignalOutcome::Skipped(skip)) => self.skipped.push(skip),
            None => {}
        }

        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: self.ledger.mark_to_market(bar.close),
        });
        self.last_bar = Some((bar.timestamp, bar.close));
        Ok(())
    }

    /// Liquidate per configuration and derive the immutable report.
    pub fn finish(mut self) -> Result<Report, SigtraderError> {
        if self.config.close_at_end && self.ledger.position() > 0.0 {
            if let Some((timestamp, close)) = self.last_bar {
                let bar = Bar {
                    timestamp,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 0.0,
                };
                if let SignalOutcome::Filled(fill) =
                    simulate_sell(&bar, self.ledger.position(), &self.config.execution)
                {
                    self.apply(fill)?;
                }
                // The final equity point reflects the liquidated state.
                if let Some(point) = self.equity_curve.last_mut() {
                    point.equity = self.ledger.mark_to_market(close);
                }
            }
        }
        Ok(Report::compute(
            &self.ledger,
            self.equity_curve,
            self.fills,
            self.skipped,
        ))
    }

    fn apply(&mut self, fill: Fill) -> Result<(), SigtraderError> {
        self.ledger
            .apply_fill(&fill)
            .map_err(|violation| SigtraderError::InvariantViolation {
                timestamp: fill.timestamp,
                reason: violation.to_string(),
            })?;
        self.fills.push(fill);
        Ok(())
    }
}

/// Batch backtest: validate the series, collect the strategy's signals over
/// the full history, then run the per-bar loop.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &dyn Strategy,
    config: EngineConfig,
) -> Result<Report, SigtraderError> {
    validate_series(bars)?;
    let signals = collect_signals(strategy.signals(bars));

    let mut engine = Engine::new(config);
    for bar in bars {
        engine.process_bar(bar, effective_signal(&signals, bar.timestamp))?;
    }
    engine.finish()
}
