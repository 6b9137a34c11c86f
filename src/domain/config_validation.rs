//! Configuration validation.
//!
//! Every field is checked before a run starts, so a bad config aborts with a
//! `ConfigInvalid`/`ConfigMissing` error instead of surfacing mid-run.

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_pair(config)?;
    validate_initial_cash(config)?;
    validate_fee_rate(config)?;
    validate_slippage_rate(config)?;
    validate_min_trade_unit(config)?;
    validate_sizing(config)?;
    Ok(())
}

/// Additional checks for batch backtests, which need a date range.
pub fn validate_backtest_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_str = config.get_string("engine", "start_date");
    let end_str = config.get_string("engine", "end_date");

    let start = parse_date(start_str.as_deref(), "start_date")?;
    let end = parse_date(end_str.as_deref(), "end_date")?;

    if start >= end {
        return Err(invalid("start_date", "start_date must be before end_date"));
    }
    Ok(())
}

/// Additional checks for paper sessions, which poll on an interval.
pub fn validate_paper_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let interval = config.get_int("engine", "interval_minutes", 15);
    if interval < 1 {
        return Err(invalid("interval_minutes", "interval must be at least 1 minute"));
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("strategy", "name") {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

fn validate_pair(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("engine", "pair") {
        Some(pair) if !pair.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "engine".to_string(),
            key: "pair".to_string(),
        }),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("engine", "initial_cash", 0.0);
    if value <= 0.0 {
        return Err(invalid("initial_cash", "initial_cash must be positive"));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("engine", "fee_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("fee_rate", "fee_rate must be in [0, 1)"));
    }
    Ok(())
}

fn validate_slippage_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("engine", "slippage_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("slippage_rate", "slippage_rate must be in [0, 1)"));
    }
    Ok(())
}

fn validate_min_trade_unit(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("engine", "min_trade_unit", 0.0001);
    if value <= 0.0 {
        return Err(invalid("min_trade_unit", "min_trade_unit must be positive"));
    }
    Ok(())
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let policy = config
        .get_string("engine", "sizing_policy")
        .unwrap_or_else(|| "fixed_fraction".to_string());
    let value = config.get_double("engine", "sizing_value", 1.0);

    match policy.as_str() {
        "fixed_fraction" => {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(
                    "sizing_value",
                    "fixed_fraction sizing_value must be in (0, 1]",
                ));
            }
        }
        "fixed_quantity" => {
            if value <= 0.0 {
                return Err(invalid(
                    "sizing_value",
                    "fixed_quantity sizing_value must be positive",
                ));
            }
        }
        other => {
            return Err(invalid(
                "sizing_policy",
                &format!("unknown sizing policy '{other}', expected fixed_fraction or fixed_quantity"),
            ));
        }
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "engine".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            invalid(field, &format!("invalid {field} format, expected YYYY-MM-DD"))
        }),
    }
}

fn invalid(key: &str, reason: &str) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: "engine".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
