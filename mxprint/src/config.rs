//! Printer session configuration

use std::time::Duration;

use mxprint_core::constants::{
    DEFAULT_CHUNK_DELAY, DEFAULT_COMMAND_TIMEOUT, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_PRINT_MODE, DEFAULT_RESPONSE_TIMEOUT, DEFAULT_SETTLE_DELAY, PRINTER_WIDTH_BYTES,
};

/// Timing and protocol knobs for a [`Printer`](crate::Printer)
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mxprint::PrinterConfig;
///
/// let config = PrinterConfig::default()
///     .with_completion_timeout(Duration::from_secs(60))
///     .with_verify_checksums(true);
///
/// assert_eq!(config.chunk_size, 48);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Wait for status and print-request responses
    pub command_timeout: Duration,

    /// Wait for any other correlated response
    pub response_timeout: Duration,

    /// Wait for the print-complete notification
    pub completion_timeout: Duration,

    /// Pause after set-intensity and flush
    pub settle_delay: Duration,

    /// Pause after each data chunk
    pub chunk_delay: Duration,

    /// Bytes per data channel write
    pub chunk_size: usize,

    /// Mode byte sent with the print request
    pub print_mode: u8,

    /// Reject notifications with a bad checksum or terminator
    pub verify_checksums: bool,

    /// Walk jobs without touching the transport
    pub dry_run: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            chunk_size: PRINTER_WIDTH_BYTES,
            print_mode: DEFAULT_PRINT_MODE,
            verify_checksums: false,
            dry_run: false,
        }
    }
}

impl PrinterConfig {
    /// Set command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set print completion timeout
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set pacing between data chunks
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Set data chunk size (clamped to at least one byte)
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn with_print_mode(mut self, mode: u8) -> Self {
        self.print_mode = mode;
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
