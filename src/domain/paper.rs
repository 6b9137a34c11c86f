//! Paper trading: the streaming engine fed from a polled data port.
//!
//! A session grows a bar history incrementally, re-runs the strategy over
//! everything seen so far, and pushes only the new timestamps through the
//! same per-bar engine path the batch backtester uses, so fees and slippage
//! behave identically in both modes. Waiting between polls is the caller's
//! only suspension point; each poll processes its bars to completion, which
//! makes stopping between polls safe — no fill is ever left half-applied.

use crate::domain::bar::Bar;
use crate::domain::engine::{Engine, EngineConfig};
use crate::domain::error::SigtraderError;
use crate::domain::fill::Fill;
use crate::domain::report::Report;
use crate::domain::signal::{collect_signals, effective_signal};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;

pub struct PaperSession<'a> {
    data: &'a dyn DataPort,
    strategy: &'a dyn Strategy,
    pair: String,
    engine: Engine,
    history: Vec<Bar>,
}

impl<'a> PaperSession<'a> {
    pub fn new(
        data: &'a dyn DataPort,
        strategy: &'a dyn Strategy,
        pair: &str,
        config: EngineConfig,
    ) -> Self {
        PaperSession {
            data,
            strategy,
            pair: pair.to_string(),
            engine: Engine::new(config),
            history: Vec::new(),
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.history.len()
    }

    /// Fetch bars that arrived since the last poll and process each one to
    /// completion. Returns the fills produced by this poll, in order.
    pub fn poll(&mut self) -> Result<Vec<Fill>, SigtraderError> {
        let after = self.history.last().map(|bar| bar.timestamp);
        let new_bars = self.data.latest_bars(&self.pair, after)?;
        if new_bars.is_empty() {
            return Ok(Vec::new());
        }

        self.history.extend(new_bars.iter().cloned());
        // The strategy sees the whole visible history; only signals at the
        // new timestamps are acted on.
        let signals = collect_signals(self.strategy.signals(&self.history));

        let fills_before = self.engine.fills().len();
        for bar in &new_bars {
            self.engine
                .process_bar(bar, effective_signal(&signals, bar.timestamp))?;
        }
        Ok(self.engine.fills()[fills_before..].to_vec())
    }

    /// End the session: liquidate per configuration and produce the report.
    pub fn finish(self) -> Result<Report, SigtraderError> {
        self.engine.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{ExecutionConfig, SizingPolicy};
    use crate::domain::fill::Side;
    use crate::domain::signal::Signal;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, minute, 0).unwrap()
    }

    fn bar(minute: u32, close: f64) -> Bar {
        Bar {
            timestamp: ts(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    /// Data port that releases one batch of bars per poll.
    struct FeedPort {
        batches: RefCell<Vec<Vec<Bar>>>,
    }

    impl FeedPort {
        fn new(batches: Vec<Vec<Bar>>) -> Self {
            FeedPort {
                batches: RefCell::new(batches),
            }
        }
    }

    impl DataPort for FeedPort {
        fn fetch_bars(
            &self,
            _pair: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Bar>, SigtraderError> {
            Ok(Vec::new())
        }

        fn latest_bars(
            &self,
            _pair: &str,
            after: Option<DateTime<Utc>>,
        ) -> Result<Vec<Bar>, SigtraderError> {
            let mut batches = self.batches.borrow_mut();
            if batches.is_empty() {
                return Ok(Vec::new());
            }
            let batch = batches.remove(0);
            Ok(batch
                .into_iter()
                .filter(|bar| after.is_none_or(|a| bar.timestamp > a))
                .collect())
        }

        fn list_pairs(&self) -> Result<Vec<String>, SigtraderError> {
            Ok(vec!["XBTUSD".to_string()])
        }

        fn data_range(
            &self,
            _pair: &str,
        ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SigtraderError> {
            Ok(None)
        }
    }

    /// Buys on the first bar it sees, sells on the fourth.
    struct BuyThenSell;

    impl Strategy for BuyThenSell {
        fn name(&self) -> &str {
            "buy-then-sell"
        }

        fn signals(&self, bars: &[Bar]) -> Vec<(DateTime<Utc>, Signal)> {
            let mut out = Vec::new();
            if let Some(first) = bars.first() {
                out.push((first.timestamp, Signal::Buy));
            }
            if bars.len() >= 4 {
                out.push((bars[3].timestamp, Signal::Sell));
            }
            out
        }
    }

    fn session_config() -> EngineConfig {
        EngineConfig {
            initial_cash: 10_000.0,
            execution: ExecutionConfig {
                sizing: SizingPolicy::FixedQuantity(10.0),
                ..ExecutionConfig::default()
            },
            close_at_end: false,
        }
    }

    #[test]
    fn incremental_polls_match_streaming_contract() {
        let port = FeedPort::new(vec![
            vec![bar(0, 100.0), bar(1, 101.0)],
            vec![bar(2, 102.0)],
            vec![bar(3, 150.0)],
        ]);
        let strategy = BuyThenSell;
        let mut session = PaperSession::new(&port, &strategy, "XBTUSD", session_config());

        let fills = session.poll().unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].side, Side::Buy);
        assert!((fills[0].price - 100.0).abs() < f64::EPSILON);

        // No new signal in the second batch.
        let fills = session.poll().unwrap();
        assert!(fills.is_empty());

        let fills = session.poll().unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].side, Side::Sell);
        assert!((fills[0].price - 150.0).abs() < f64::EPSILON);

        assert_eq!(session.bars_seen(), 4);
        let report = session.finish().unwrap();
        assert!((report.final_equity - 10_500.0).abs() < 1e-9);
    }

    #[test]
    fn old_signals_are_not_reprocessed() {
        // The strategy re-emits the first-bar Buy on every poll; only the
        // first occurrence may fill, later ones are not new timestamps.
        let port = FeedPort::new(vec![vec![bar(0, 100.0)], vec![bar(1, 101.0)]]);
        let strategy = BuyThenSell;
        let mut session = PaperSession::new(&port, &strategy, "XBTUSD", session_config());

        let first = session.poll().unwrap();
        assert_eq!(first.len(), 1);
        let second = session.poll().unwrap();
        assert!(second.is_empty(), "stale Buy signal must not refill");
    }

    #[test]
    fn empty_poll_is_a_no_op() {
        let port = FeedPort::new(vec![]);
        let strategy = BuyThenSell;
        let mut session = PaperSession::new(&port, &strategy, "XBTUSD", session_config());

        assert!(session.poll().unwrap().is_empty());
        assert_eq!(session.bars_seen(), 0);
    }

    #[test]
    fn finish_liquidates_when_configured() {
        let port = FeedPort::new(vec![vec![bar(0, 100.0), bar(1, 120.0)]]);
        let strategy = BuyThenSell;
        let mut config = session_config();
        config.close_at_end = true;
        let mut session = PaperSession::new(&port, &strategy, "XBTUSD", config);

        session.poll().unwrap();
        let report = session.finish().unwrap();

        let last = report.fills.last().unwrap();
        assert_eq!(last.side, Side::Sell);
        assert!((report.final_equity - 10_200.0).abs() < 1e-9);
    }
}
