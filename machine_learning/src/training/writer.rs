use log::debug;

use super::EpochReport;

/// Receives the metrics of every epoch as training goes.
pub trait EpochWriter {
    fn write(&mut self, report: &EpochReport);
}

/// Writes every epoch report to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl EpochWriter for LogWriter {
    fn write(&mut self, report: &EpochReport) {
        debug!(
            "epoch {}: train_loss={:.6e} valid_loss={:.6e} mre={:.6e}",
            report.epoch, report.train_loss, report.valid_loss, report.mre
        );
    }
}

/// Keeps every report in memory.
impl EpochWriter for Vec<EpochReport> {
    fn write(&mut self, report: &EpochReport) {
        self.push(*report);
    }
}

impl<W: EpochWriter + ?Sized> EpochWriter for &mut W {
    fn write(&mut self, report: &EpochReport) {
        (**self).write(report);
    }
}
