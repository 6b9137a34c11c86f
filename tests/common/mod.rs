#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

pub use sigtrader::domain::bar::Bar;
use sigtrader::domain::engine::EngineConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::execution::{ExecutionConfig, SizingPolicy};
use sigtrader::domain::signal::Signal;
use sigtrader::domain::strategy::Strategy;
use sigtrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, pair: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(pair.to_string(), bars);
        self
    }

    pub fn with_error(mut self, pair: &str, reason: &str) -> Self {
        self.errors.insert(pair.to_string(), reason.to_string());
        self
    }

    fn bars_for(&self, pair: &str) -> Result<Vec<Bar>, SigtraderError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(pair).cloned().unwrap_or_default())
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        pair: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        Ok(self
            .bars_for(pair)?
            .into_iter()
            .filter(|bar| bar.timestamp >= start && bar.timestamp <= end)
            .collect())
    }

    fn latest_bars(
        &self,
        pair: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        let bars = self.bars_for(pair)?;
        Ok(match after {
            Some(after) => bars
                .into_iter()
                .filter(|bar| bar.timestamp > after)
                .collect(),
            None => bars,
        })
    }

    fn list_pairs(&self) -> Result<Vec<String>, SigtraderError> {
        let mut pairs: Vec<String> = self.data.keys().cloned().collect();
        pairs.sort();
        Ok(pairs)
    }

    fn data_range(
        &self,
        pair: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SigtraderError> {
        let bars = self.bars_for(pair)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}

pub fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, minute, 0).unwrap()
}

pub fn make_bar(minute: u32, close: f64) -> Bar {
    Bar {
        timestamp: ts(minute),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i as u32, close))
        .collect()
}

/// Strategy scripted with a fixed list of signals.
pub struct ScriptedStrategy {
    pub script: Vec<(DateTime<Utc>, Signal)>,
}

impl ScriptedStrategy {
    pub fn new(script: Vec<(DateTime<Utc>, Signal)>) -> Self {
        Self { script }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn signals(&self, _bars: &[Bar]) -> Vec<(DateTime<Utc>, Signal)> {
        self.script.clone()
    }
}

pub fn fixed_quantity_config(quantity: f64) -> EngineConfig {
    EngineConfig {
        initial_cash: 10_000.0,
        execution: ExecutionConfig {
            sizing: SizingPolicy::FixedQuantity(quantity),
            ..ExecutionConfig::default()
        },
        close_at_end: false,
    }
}

pub fn fixed_fraction_config(fraction: f64) -> EngineConfig {
    EngineConfig {
        initial_cash: 10_000.0,
        execution: ExecutionConfig {
            sizing: SizingPolicy::FixedFraction(fraction),
            ..ExecutionConfig::default()
        },
        close_at_end: false,
    }
}
