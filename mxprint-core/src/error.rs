//! Error types for mxprint-core



/// Result type alias for mxprint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to hold a header
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Leading markers are not 0x22 0x21
    #[error("Bad frame marker: {found:02X?}")]
    BadMarker {
        found: [u8; 2],
    },

    /// Declared payload length exceeds the received bytes
    #[error("Truncated frame: header declares {declared} payload bytes, only {available} present")]
    Truncated {
        declared: usize,
        available: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Terminator byte is not 0xFF
    #[error("Bad frame terminator: 0x{0:02X}")]
    BadTerminator(u8),

    /// Unknown command identifier
    #[error("Unknown command identifier: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Payload too large
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Bitmap row does not match the raster width
    #[error("Row {row} has {actual} pixels, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl Error {
    /// Check if this error describes a malformed inbound frame
    ///
    /// Malformed notifications are dropped, never fatal.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::BadMarker { .. }
                | Self::Truncated { .. }
                | Self::ChecksumMismatch { .. }
                | Self::BadTerminator(_)
        )
    }

    /// Check if the frame arrived intact but its trailer did not verify
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. } | Self::BadTerminator(_))
    }
}
