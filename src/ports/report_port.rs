//! Report sink port trait.

use std::path::Path;

use crate::domain::error::SigtraderError;
use crate::domain::report::Report;

/// Port for persisting a completed run's report.
pub trait ReportPort {
    fn write(&self, report: &Report, output_path: &Path) -> Result<(), SigtraderError>;
}
