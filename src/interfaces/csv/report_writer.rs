use crate::domain::reconciliation::ReconciliationProjection;
use crate::error::{EngineError, Result};
use std::io::Write;

/// Writes reconciliation projections, one row or object per booking.
pub struct ReportWriter<W: Write> {
    output: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn write_csv(self, report: &[ReconciliationProjection]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(self.output);
        for projection in report {
            writer.serialize(projection)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_json(mut self, report: &[ReconciliationProjection]) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.output, report)
            .map_err(|e| EngineError::InternalError(Box::new(e)))?;
        writeln!(self.output)?;
        self.output.flush()?;
        Ok(())
    }
}
