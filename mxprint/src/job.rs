//! Print job state machine
//!
//! A job walks a fixed sequence of states:
//!
//! ```text
//! Idle -> SettingIntensity -> QueryingStatus -> RequestingPrint
//!      -> TransferringData -> Flushing -> AwaitingCompletion -> Done
//! ```
//!
//! Any error after leaving `Idle` moves the job to `Failed`. Both `Done`
//! and `Failed` are terminal.

use std::fmt;

use chrono::Utc;
use tracing::{debug, info, warn};

use mxprint_core::{constants::DEFAULT_PRINT_MODE, Command, ImageBuffer};
use mxprint_types::{Intensity, PrintReport};

use crate::config::PrinterConfig;
use crate::error::{Error, Result};
use crate::printer::Printer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Idle,
    SettingIntensity,
    QueryingStatus,
    RequestingPrint,
    TransferringData,
    Flushing,
    AwaitingCompletion,
    Done,
    Failed,
}

impl JobState {
    /// Successor on the success path
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SettingIntensity),
            Self::SettingIntensity => Some(Self::QueryingStatus),
            Self::QueryingStatus => Some(Self::RequestingPrint),
            Self::RequestingPrint => Some(Self::TransferringData),
            Self::TransferringData => Some(Self::Flushing),
            Self::Flushing => Some(Self::AwaitingCompletion),
            Self::AwaitingCompletion => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check if a job may move from `self` to `to`
    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            Self::Failed => !matches!(self, Self::Idle) && !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SettingIntensity => "setting-intensity",
            Self::QueryingStatus => "querying-status",
            Self::RequestingPrint => "requesting-print",
            Self::TransferringData => "transferring-data",
            Self::Flushing => "flushing",
            Self::AwaitingCompletion => "awaiting-completion",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One print job
///
/// A job runs at most once. The visited states are kept in
/// [`PrintJob::history`].
#[derive(Debug, Clone)]
pub struct PrintJob {
    intensity: Intensity,
    lines: u16,
    mode: u8,
    state: JobState,
    history: Vec<JobState>,
}

impl PrintJob {
    pub fn new(intensity: Intensity, lines: u16) -> Self {
        Self {
            intensity,
            lines,
            mode: DEFAULT_PRINT_MODE,
            state: JobState::Idle,
            history: vec![JobState::Idle],
        }
    }

    /// Set the print request mode byte
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn lines(&self) -> u16 {
        self.lines
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// States visited so far, starting with `Idle`
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }

    /// Drive the job to completion on `printer`
    ///
    /// `buffer` must already hold the packed raster for `lines` lines. With
    /// [`PrinterConfig::dry_run`] set, every state is visited but nothing is
    /// written to the transport.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTransition`] if the job already ran
    /// - [`Error::PrinterError`] if the status response carries an error flag
    /// - [`Error::PrintRejected`] if the print request is not acknowledged
    /// - [`Error::Timeout`] or [`Error::CompletionTimeout`] if the printer
    ///   stops answering
    /// - transport errors from any write
    pub async fn run(&mut self, printer: &mut Printer, buffer: &ImageBuffer) -> Result<PrintReport> {
        if self.state != JobState::Idle {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: JobState::SettingIntensity,
            });
        }

        let started_at = Utc::now();
        let dry_run = printer.config().dry_run;

        info!(
            lines = self.lines,
            intensity = %self.intensity,
            dry_run,
            "Starting print job"
        );

        let outcome = if dry_run {
            let config = printer.config().clone();
            self.rehearse(&config, buffer)
        } else {
            self.drive(printer, buffer).await
        };

        let chunks = match outcome {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(state = %self.state, "Print job failed: {}", e);
                self.fail();
                return Err(e);
            }
        };

        self.transition(JobState::Done)?;

        let report = PrintReport {
            lines: self.lines,
            intensity: self.intensity,
            bytes_sent: buffer.len(),
            chunks,
            dry_run,
            started_at,
            finished_at: Utc::now(),
        };
        info!("{}", report);

        Ok(report)
    }

    async fn drive(&mut self, printer: &mut Printer, buffer: &ImageBuffer) -> Result<usize> {
        self.transition(JobState::SettingIntensity)?;
        printer.set_intensity(self.intensity).await?;

        self.transition(JobState::QueryingStatus)?;
        let status = printer.request_status().await?;
        if status.is_error() {
            return Err(Error::PrinterError {
                code: status.error_code.unwrap_or(0),
            });
        }

        self.transition(JobState::RequestingPrint)?;
        printer.session().reset_completion();
        let ack = printer.print_request(self.lines, self.mode).await?;
        match ack.first() {
            Some(0) => debug!("Print request accepted"),
            status => {
                return Err(Error::PrintRejected {
                    status: status.copied(),
                })
            }
        }

        self.transition(JobState::TransferringData)?;
        let chunks = printer.send_data_chunks(buffer).await?;

        self.transition(JobState::Flushing)?;
        printer.flush_data().await?;

        self.transition(JobState::AwaitingCompletion)?;
        printer.wait_for_print_complete().await?;

        Ok(chunks)
    }

    fn rehearse(&mut self, config: &PrinterConfig, buffer: &ImageBuffer) -> Result<usize> {
        self.transition(JobState::SettingIntensity)?;
        debug!("Dry run: skipping {} {}", Command::SetIntensity, self.intensity);

        self.transition(JobState::QueryingStatus)?;
        debug!("Dry run: skipping {}", Command::GetStatus);

        self.transition(JobState::RequestingPrint)?;
        debug!("Dry run: skipping {} for {} lines", Command::PrintRequest, self.lines);

        self.transition(JobState::TransferringData)?;
        let chunks = buffer.chunks(config.chunk_size).count();
        debug!("Dry run: {} bytes in {} chunks", buffer.len(), chunks);

        self.transition(JobState::Flushing)?;
        self.transition(JobState::AwaitingCompletion)?;

        Ok(chunks)
    }

    fn transition(&mut self, to: JobState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }

        debug!(from = %self.state, %to, "Job state changed");
        self.state = to;
        self.history.push(to);

        Ok(())
    }

    fn fail(&mut self) {
        if self.state.can_transition_to(JobState::Failed) {
            self.state = JobState::Failed;
            self.history.push(JobState::Failed);
        }
    }
}
