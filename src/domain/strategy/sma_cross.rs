//! Simple moving average crossover strategy.
//!
//! Buy on the golden cross (fast SMA crossing above slow SMA), sell on the
//! death cross. Silent until the slow window has filled.

use chrono::{DateTime, Utc};

use super::Strategy;
use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;
use crate::domain::signal::Signal;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_FAST: usize = 20;
pub const DEFAULT_SLOW: usize = 50;

#[derive(Debug, Clone)]
pub struct SmaCrossStrategy {
    fast: usize,
    slow: usize,
}

impl SmaCrossStrategy {
    pub fn new(fast: usize, slow: usize) -> Result<Self, SigtraderError> {
        if fast == 0 {
            return Err(SigtraderError::StrategyParam {
                param: "fast".into(),
                reason: "period must be at least 1".into(),
            });
        }
        if fast >= slow {
            return Err(SigtraderError::StrategyParam {
                param: "fast".into(),
                reason: format!("fast period {fast} must be below slow period {slow}"),
            });
        }
        Ok(SmaCrossStrategy { fast, slow })
    }
}

/// Trailing simple moving average; `None` until the window has filled.
fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let mut window_sum = 0.0_f64;
    for i in 0..values.len() {
        window_sum += values[i];
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(window_sum / period as f64);
        }
    }
    out
}

impl Strategy for SmaCrossStrategy {
    fn name(&self) -> &str {
        "sma-cross"
    }

    fn signals(&self, bars: &[Bar]) -> Vec<(DateTime<Utc>, Signal)> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = sma(&closes, self.fast);
        let slow = sma(&closes, self.slow);

        let mut signals = Vec::new();
        for i in 1..bars.len() {
            let (Some(pf), Some(ps), Some(cf), Some(cs)) =
                (fast[i - 1], slow[i - 1], fast[i], slow[i])
            else {
                continue;
            };
            if pf <= ps && cf > cs {
                signals.push((bars[i].timestamp, Signal::Buy));
            } else if pf >= ps && cf < cs {
                signals.push((bars[i].timestamp, Signal::Sell));
            }
        }
        signals
    }
}

/// Registry constructor: reads `fast` and `slow` periods from the
/// `[strategy]` section, defaulting to 20/50.
pub fn build(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SigtraderError> {
    let fast = read_period(config, "fast", DEFAULT_FAST)?;
    let slow = read_period(config, "slow", DEFAULT_SLOW)?;
    Ok(Box::new(SmaCrossStrategy::new(fast, slow)?))
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
