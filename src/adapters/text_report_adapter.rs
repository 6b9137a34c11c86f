//! Text/CSV report adapter.
//!
//! Writes a run report into an output directory: a human-readable
//! `summary.txt` plus `equity_curve.csv`, `fills.csv` and `round_trips.csv`
//! for downstream tooling.

use std::fs;
use std::path::Path;

use crate::domain::error::SigtraderError;
use crate::domain::report::Report;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        TextReportAdapter
    }

    fn write_summary(&self, report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let mut out = String::new();
        out.push_str(&format!("Initial cash:   {:.2}\n", report.initial_cash));
        out.push_str(&format!("Final equity:   {:.2}\n", report.final_equity));
        out.push_str(&format!("Total return:   {:.2}%\n", report.total_return * 100.0));
        out.push_str(&format!("Max drawdown:   {:.2}%\n", report.max_drawdown * 100.0));
        out.push_str(&format!("Realized PnL:   {:.2}\n", report.realized_pnl));
        out.push_str(&format!("Round trips:    {}\n", report.round_trip_count));
        out.push_str(&format!(
            "Win rate:       {:.1}% ({} won / {} lost / {} even)\n",
            report.win_rate * 100.0,
            report.trips_won,
            report.trips_lost,
            report.trips_breakeven
        ));
        out.push_str(&format!("Profit factor:  {:.2}\n", report.profit_factor));
        out.push_str(&format!("Fills:          {}\n", report.fills.len()));
        out.push_str(&format!("Skipped:        {}\n", report.skipped.len()));
        for skip in &report.skipped {
            out.push_str(&format!(
                "  {} {}: {}\n",
                skip.timestamp, skip.side, skip.reason
            ));
        }
        fs::write(path, out)?;
        Ok(())
    }

    fn write_equity_curve(&self, report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        wtr.write_record(["timestamp", "equity"]).map_err(csv_error)?;
        for point in &report.equity_curve {
            wtr.write_record([
                point.timestamp.timestamp().to_string(),
                format!("{:.8}", point.equity),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_fills(&self, report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        wtr.write_record(["timestamp", "side", "price", "quantity"])
            .map_err(csv_error)?;
        for fill in &report.fills {
            wtr.write_record([
                fill.timestamp.timestamp().to_string(),
                fill.side.to_string(),
                format!("{:.8}", fill.price),
                format!("{:.8}", fill.quantity),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_round_trips(&self, report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        wtr.write_record([
            "entry_timestamp",
            "exit_timestamp",
            "entry_price",
            "exit_price",
            "quantity",
            "pnl",
        ])
        .map_err(csv_error)?;
        for trip in &report.round_trips {
            wtr.write_record([
                trip.entry_timestamp.timestamp().to_string(),
                trip.exit_timestamp.timestamp().to_string(),
                format!("{:.8}", trip.entry_price),
                format!("{:.8}", trip.exit_price),
                format!("{:.8}", trip.quantity),
                format!("{:.8}", trip.pnl),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(e: csv::Error) -> SigtraderError {
    SigtraderError::Data {
        reason: format!("CSV write error: {e}"),
    }
}

impl ReportPort for TextReportAdapter {
    fn write(&self, report: &Report, output_path: &Path) -> Result<(), SigtraderError> {
        fs::create_dir_all(output_path)?;
        self.write_summary(report, &output_path.join("summary.txt"))?;
        self.write_equity_curve(report, &output_path.join("equity_curve.csv"))?;
        self.write_fills(report, &output_path.join("fills.csv"))?;
        self.write_round_trips(report, &output_path.join("round_trips.csv"))?;
        Ok(())
    }
}
