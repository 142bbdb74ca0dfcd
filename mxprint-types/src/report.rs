//! Print job outcome

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::intensity::Intensity;

/// Summary of a finished print job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReport {
    /// Lines announced in the print request
    pub lines: u16,

    /// Intensity the job was printed at
    pub intensity: Intensity,

    /// Raster bytes written to the data channel (including padding)
    pub bytes_sent: usize,

    /// Number of data channel writes
    pub chunks: usize,

    /// Job ran without touching the transport
    pub dry_run: bool,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl PrintReport {
    /// Wall-clock time the job took
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for PrintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Printed {} lines at {} ({} bytes in {} chunks, {} ms){}",
            self.lines,
            self.intensity,
            self.bytes_sent,
            self.chunks,
            self.duration().num_milliseconds(),
            if self.dry_run { " [dry run]" } else { "" }
        )
    }
}
