//! MACD crossover strategy.
//!
//! Buy when the MACD line crosses above its signal line, sell when it
//! crosses below. MACD = EMA(fast) − EMA(slow) over closes; the signal line
//! is an EMA of the MACD series.

use chrono::{DateTime, Utc};

use super::Strategy;
use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;
use crate::domain::signal::Signal;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdStrategy {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl MacdStrategy {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, SigtraderError> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(SigtraderError::StrategyParam {
                param: "fast/slow/signal".into(),
                reason: "periods must be at least 1".into(),
            });
        }
        if fast >= slow {
            return Err(SigtraderError::StrategyParam {
                param: "fast".into(),
                reason: format!("fast period {fast} must be below slow period {slow}"),
            });
        }
        Ok(MacdStrategy { fast, slow, signal })
    }
}

/// Exponential moving average with α = 2 / (span + 1), seeded from the first
/// value.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &value in values {
        let next = match prev {
            Some(p) => alpha * value + (1.0 - alpha) * p,
            None => value,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "macd"
    }

    fn signals(&self, bars: &[Bar]) -> Vec<(DateTime<Utc>, Signal)> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema(&closes, self.fast);
        let slow = ema(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = ema(&macd, self.signal);

        let mut signals = Vec::new();
        for i in 1..bars.len() {
            let crossed_above = macd[i - 1] <= signal_line[i - 1] && macd[i] > signal_line[i];
            let crossed_below = macd[i - 1] >= signal_line[i - 1] && macd[i] < signal_line[i];
            if crossed_above {
                signals.push((bars[i].timestamp, Signal::Buy));
            } else if crossed_below {
                signals.push((bars[i].timestamp, Signal::Sell));
            }
        }
        signals
    }
}

/// Registry constructor: reads `fast`, `slow` and `signal` periods from the
/// `[strategy]` section, defaulting to the classic 12/26/9.
pub fn build(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SigtraderError> {
    let fast = read_period(config, "fast", DEFAULT_FAST)?;
    let slow = read_period(config, "slow", DEFAULT_SLOW)?;
    let signal = read_period(config, "signal", DEFAULT_SIGNAL)?;
    Ok(Box::new(MacdStrategy::new(fast, slow, signal)?))
}

fn read_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, SigtraderError> {
    let value = config.get_int("strategy", key, default as i64);
    usize::try_from(value).map_err(|_| SigtraderError::StrategyParam {
        param: key.to_string(),
        reason: format!("{value} is not a valid period"),
    })
}
