//! Printer status decoding
//!
//! The get-status response carries a state bitmask at payload byte 6, the
//! battery level and print head temperature at bytes 9 and 10, and an error
//! flag / error code pair at bytes 12 and 13.

use std::fmt;

use bitflags::bitflags;

use crate::constants::{
    STATUS_BATTERY_OFFSET, STATUS_ERROR_CODE_OFFSET, STATUS_ERROR_FLAG_OFFSET,
    STATUS_FLAGS_OFFSET, STATUS_TEMPERATURE_OFFSET,
};

bitflags! {
    /// Raw status bitmask (payload byte 6)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u8 {
        const PRINTING = 1;
        const PAPER_JAM = 1 << 1;
        const OUT_OF_PAPER = 1 << 2;
        const COVER_OPEN = 1 << 3;
        const BATTERY_LOW = 1 << 4;
        const OVERHEAT = 1 << 5;
    }
}

/// Last known printer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrinterState {
    pub printing: bool,
    pub paper_jam: bool,
    pub out_of_paper: bool,
    pub cover_open: bool,
    pub battery_low: bool,
    pub overheat: bool,
}

impl PrinterState {
    /// Decode a status byte; bits 6 and 7 are ignored
    ///
    /// # Examples
    ///
    /// ```
    /// use mxprint_core::PrinterState;
    ///
    /// let state = PrinterState::from_status_byte(0x07);
    /// assert!(state.printing && state.paper_jam && state.out_of_paper);
    /// assert!(!state.cover_open && !state.battery_low && !state.overheat);
    /// ```
    pub fn from_status_byte(byte: u8) -> Self {
        Self::from(StatusFlags::from_bits_truncate(byte))
    }

    /// Decode from a get-status payload
    ///
    /// Returns `None` when the payload is too short to carry the bitmask.
    pub fn from_status_payload(payload: &[u8]) -> Option<Self> {
        payload
            .get(STATUS_FLAGS_OFFSET)
            .copied()
            .map(Self::from_status_byte)
    }

    pub fn flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::empty();
        flags.set(StatusFlags::PRINTING, self.printing);
        flags.set(StatusFlags::PAPER_JAM, self.paper_jam);
        flags.set(StatusFlags::OUT_OF_PAPER, self.out_of_paper);
        flags.set(StatusFlags::COVER_OPEN, self.cover_open);
        flags.set(StatusFlags::BATTERY_LOW, self.battery_low);
        flags.set(StatusFlags::OVERHEAT, self.overheat);
        flags
    }

    /// Check if a condition prevents printing
    pub fn has_fault(&self) -> bool {
        self.paper_jam || self.out_of_paper || self.cover_open || self.overheat
    }
}

impl From<StatusFlags> for PrinterState {
    fn from(flags: StatusFlags) -> Self {
        Self {
            printing: flags.contains(StatusFlags::PRINTING),
            paper_jam: flags.contains(StatusFlags::PAPER_JAM),
            out_of_paper: flags.contains(StatusFlags::OUT_OF_PAPER),
            cover_open: flags.contains(StatusFlags::COVER_OPEN),
            battery_low: flags.contains(StatusFlags::BATTERY_LOW),
            overheat: flags.contains(StatusFlags::OVERHEAT),
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.flags();
        if flags.is_empty() {
            return write!(f, "idle");
        }
        let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Decoded get-status response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusReport {
    /// `None` when the payload is too short to carry the bitmask
    pub state: Option<PrinterState>,

    /// Battery level as reported by the printer
    pub battery_level: Option<u8>,

    /// Print head temperature as reported by the printer
    pub temperature: Option<u8>,

    /// Printer-reported error code
    pub error_code: Option<u8>,
}

impl StatusReport {
    /// Parse a get-status payload
    ///
    /// A printer error is reported when the payload is at least 13 bytes and
    /// byte 12 is nonzero; the code is byte 13 (0 when the payload stops
    /// short of it).
    pub fn parse(payload: &[u8]) -> Self {
        let error_code = match payload.get(STATUS_ERROR_FLAG_OFFSET) {
            Some(&flag) if flag != 0 => {
                Some(payload.get(STATUS_ERROR_CODE_OFFSET).copied().unwrap_or(0))
            }
            _ => None,
        };

        Self {
            state: PrinterState::from_status_payload(payload),
            battery_level: payload.get(STATUS_BATTERY_OFFSET).copied(),
            temperature: payload.get(STATUS_TEMPERATURE_OFFSET).copied(),
            error_code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }
}
