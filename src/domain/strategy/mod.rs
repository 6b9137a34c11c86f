//! Strategy contract and registry.
//!
//! A strategy maps the visible price history to a signal per timestamp. The
//! engine treats every strategy as an opaque box behind [`Strategy`];
//! concrete strategies are registered by name in a [`StrategyRegistry`]
//! populated at startup, so the core never scans for them.

pub mod macd;
pub mod sma_cross;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::bar::Bar;
use super::error::SigtraderError;
use super::signal::Signal;
use crate::ports::config_port::ConfigPort;

pub trait Strategy {
    fn name(&self) -> &str;

    /// Signals for the given history, one entry per timestamp the strategy
    /// wants to act on. Timestamps it stays silent on are Hold. Conflicting
    /// entries for one timestamp are resolved by the engine (Sell wins).
    fn signals(&self, bars: &[Bar]) -> Vec<(DateTime<Utc>, Signal)>;
}

/// Constructor for a named strategy, reading its parameters from the
/// `[strategy]` section of the run configuration.
pub type StrategyBuilder = fn(&dyn ConfigPort) -> Result<Box<dyn Strategy>, SigtraderError>;

/// Explicit name → constructor map. Built-ins are registered up front;
/// embedders may add their own before dispatch.
pub struct StrategyRegistry {
    builders: BTreeMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        StrategyRegistry {
            builders: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("macd", macd::build);
        registry.register("sma-cross", sma_cross::build);
        registry
    }

    pub fn register(&mut self, name: &str, builder: StrategyBuilder) {
        self.builders.insert(name.to_string(), builder);
    }

    pub fn build(
        &self,
        name: &str,
        config: &dyn ConfigPort,
    ) -> Result<Box<dyn Strategy>, SigtraderError> {
        match self.builders.get(name) {
            Some(builder) => builder(config),
            None => Err(SigtraderError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
