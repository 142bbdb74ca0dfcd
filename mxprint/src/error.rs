//! High-level error types

use std::time::Duration;

use crate::job::JobState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] mxprint_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] mxprint_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] mxprint_types::Error),

    #[error("Printer not connected")]
    NotConnected,

    /// No correlated response before the deadline
    #[error("Timeout waiting for response to 0x{command:02X} after {timeout:?}")]
    Timeout {
        command: u8,
        timeout: Duration,
    },

    /// A newer dispatch for the same command replaced this waiter
    #[error("Waiter for 0x{command:02X} was displaced by a newer request")]
    WaiterDisplaced {
        command: u8,
    },

    /// Status response carried an error flag
    #[error("Printer reported error code {code}")]
    PrinterError {
        code: u8,
    },

    /// Print request acknowledgment was empty or nonzero
    #[error("Print request rejected (ack: {status:?})")]
    PrintRejected {
        status: Option<u8>,
    },

    /// Print-complete notification never arrived
    #[error("Print did not complete within {timeout:?}")]
    CompletionTimeout {
        timeout: Duration,
    },

    #[error("Invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: JobState,
        to: JobState,
    },
}

impl Error {
    /// Check if the printer simply did not answer in time
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::CompletionTimeout { .. }
        )
    }

    /// Check if the printer itself refused the job
    pub fn is_printer_fault(&self) -> bool {
        matches!(
            self,
            Self::PrinterError { .. } | Self::PrintRejected { .. }
        )
    }

    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Transport(_))
    }
}
