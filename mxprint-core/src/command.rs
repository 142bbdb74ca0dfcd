//! MXW01 protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command identifiers
///
/// The same identifier is used for a request on the command channel and for
/// the printer's correlated response on the notification channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Query printer status (response carries the status payload)
    GetStatus = 0xA1,

    /// Set print head intensity (single byte payload, no response)
    SetIntensity = 0xA2,

    /// Announce a print job (response is an acknowledgment)
    PrintRequest = 0xA9,

    /// Sent by the printer when a job has finished printing
    PrintComplete = 0xAA,

    /// Flush buffered raster data to the print head
    FlushData = 0xAD,
}

impl Command {
    /// Check if this command is sent by the host
    pub fn is_request(self) -> bool {
        !self.is_notification_only()
    }

    /// Check if this identifier only ever arrives from the printer
    pub fn is_notification_only(self) -> bool {
        matches!(self, Self::PrintComplete)
    }

    /// Check if the printer answers this command with a correlated frame
    pub fn expects_response(self) -> bool {
        matches!(self, Self::GetStatus | Self::PrintRequest)
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::GetStatus => "GET_STATUS",
            Self::SetIntensity => "SET_INTENSITY",
            Self::PrintRequest => "PRINT_REQUEST",
            Self::PrintComplete => "PRINT_COMPLETE",
            Self::FlushData => "FLUSH_DATA",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0xA1 => Ok(Self::GetStatus),
            0xA2 => Ok(Self::SetIntensity),
            0xA9 => Ok(Self::PrintRequest),
            0xAA => Ok(Self::PrintComplete),
            0xAD => Ok(Self::FlushData),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_conversion() {
        assert_eq!(u8::from(Command::GetStatus), 0xA1);
        assert_eq!(u8::from(Command::FlushData), 0xAD);
        assert_eq!(Command::try_from(0xA9).unwrap(), Command::PrintRequest);
        assert_eq!(Command::try_from(0xAA).unwrap(), Command::PrintComplete);
    }

    #[test]
    fn test_command_direction() {
        assert!(Command::PrintComplete.is_notification_only());
        assert!(!Command::PrintComplete.is_request());
        assert!(Command::SetIntensity.is_request());
    }

    #[test]
    fn test_expects_response() {
        assert!(Command::GetStatus.expects_response());
        assert!(Command::PrintRequest.expects_response());
        assert!(!Command::SetIntensity.expects_response());
        assert!(!Command::FlushData.expects_response());
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(Command::try_from(0x00), Err(Error::UnknownCommand(0x00))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::GetStatus.to_string(), "GET_STATUS(0xA1)");
    }
}
