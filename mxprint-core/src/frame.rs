//! MXW01 protocol frame structure and encoding/decoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::trace;

use crate::{
    checksum,
    command::Command,
    constants::{FRAME_MARKER, FRAME_TERMINATOR},
    error::{Error, Result},
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};

/// MXW01 protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬─────────┬─────────┬──────────┬───────────┬──────────┬────────────┐
/// │ Markers  │ Command │  Flags  │  Length  │  Payload  │ Checksum │ Terminator │
/// │  22 21   │ 1 byte  │ 1 byte  │ 2 bytes  │  N bytes  │  1 byte  │     FF     │
/// │          │         │ (0x00)  │ (LE u16) │           │ (CRC-8)  │            │
/// └──────────┴─────────┴─────────┴──────────┴───────────┴──────────┴────────────┘
/// ```
///
/// The checksum covers the payload only.
///
/// # Examples
///
/// ```
/// use mxprint_core::{Command, Frame};
///
/// let frame = Frame::with_payload(Command::GetStatus, vec![0x00]).unwrap();
/// let encoded = frame.encode();
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert_eq!(decoded.command_id(), 0xA1);
/// assert_eq!(decoded.payload().as_ref(), &[0x00]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    command_id: u8,
    flags: u8,
    payload: Bytes,
}

impl Frame {
    /// Trailer size in bytes (checksum + terminator)
    pub const TRAILER_SIZE: usize = 2;

    /// Size of an encoded frame with an empty payload
    pub const OVERHEAD: usize = HEADER_SIZE + Self::TRAILER_SIZE;

    /// Create a new frame with empty payload
    pub fn new(command: impl Into<u8>) -> Self {
        Self {
            command_id: command.into(),
            flags: 0,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload does not fit the
    /// 16-bit length field.
    ///
    /// # Examples
    ///
    /// ```
    /// use mxprint_core::{Command, Frame};
    ///
    /// let frame = Frame::with_payload(Command::SetIntensity, vec![0x5D]).unwrap();
    /// assert_eq!(frame.payload().len(), 1);
    /// ```
    pub fn with_payload(command: impl Into<u8>, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            command_id: command.into(),
            flags: 0,
            payload,
        })
    }

    /// Raw command identifier
    pub fn command_id(&self) -> u8 {
        self.command_id
    }

    /// Known command for this frame, if any
    pub fn command(&self) -> Result<Command> {
        Command::try_from(self.command_id)
    }

    /// Check whether this frame carries the given command
    pub fn is(&self, command: Command) -> bool {
        self.command_id == u8::from(command)
    }

    /// Reserved header byte (zero on every frame we send)
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the frame, keeping only the payload
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Calculate checksum for this frame
    pub fn checksum(&self) -> u8 {
        checksum::calculate(&self.payload)
    }

    /// Encode frame to bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use mxprint_core::{Command, Frame};
    ///
    /// let frame = Frame::with_payload(Command::GetStatus, vec![0x00]).unwrap();
    /// assert_eq!(
    ///     frame.encode().as_ref(),
    ///     &[0x22, 0x21, 0xA1, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF]
    /// );
    /// ```
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_slice(&FRAME_MARKER);
        buf.put_u8(self.command_id);
        buf.put_u8(self.flags);
        // Length fits: enforced by with_payload / decode
        buf.put_u16_le(self.payload.len() as u16);
        buf.put_slice(&self.payload);
        buf.put_u8(self.checksum());
        buf.put_u8(FRAME_TERMINATOR);

        buf
    }

    /// Decode a frame from bytes
    ///
    /// Validates the header markers and that the declared payload is present.
    /// The trailing checksum and terminator are not inspected; printers in the
    /// field do not always send a valid trailer. Use [`Frame::decode_checked`]
    /// to verify them.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than the 6-byte header
    /// - Header markers are not `22 21`
    /// - Buffer is shorter than the declared payload
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(Error::FrameTooShort {
                expected: HEADER_SIZE,
                actual: raw.len(),
            });
        }

        if raw[..2] != FRAME_MARKER {
            return Err(Error::BadMarker {
                found: [raw[0], raw[1]],
            });
        }

        let command_id = raw[2];
        let flags = raw[3];
        let length = usize::from(LittleEndian::read_u16(&raw[4..6]));

        let body = &raw[HEADER_SIZE..];
        if body.len() < length {
            return Err(Error::Truncated {
                declared: length,
                available: body.len(),
            });
        }

        let frame = Self {
            command_id,
            flags,
            payload: Bytes::copy_from_slice(&body[..length]),
        };

        trace!("Decoded {:?}", frame);

        Ok(frame)
    }

    /// Decode a frame and verify its checksum and terminator
    ///
    /// # Errors
    ///
    /// Everything [`Frame::decode`] rejects, plus:
    /// - Missing trailer
    /// - [`Error::ChecksumMismatch`]
    /// - [`Error::BadTerminator`]
    pub fn decode_checked(raw: &[u8]) -> Result<Self> {
        let frame = Self::decode(raw)?;

        let trailer_at = HEADER_SIZE + frame.payload.len();
        let Some(trailer) = raw.get(trailer_at..trailer_at + Self::TRAILER_SIZE) else {
            return Err(Error::FrameTooShort {
                expected: trailer_at + Self::TRAILER_SIZE,
                actual: raw.len(),
            });
        };

        let expected = frame.checksum();
        if trailer[0] != expected {
            return Err(Error::ChecksumMismatch {
                expected,
                received: trailer[0],
            });
        }

        if trailer[1] != FRAME_TERMINATOR {
            return Err(Error::BadTerminator(trailer[1]));
        }

        Ok(frame)
    }

    /// Get total encoded frame size
    pub fn size(&self) -> usize {
        Self::OVERHEAD + self.payload.len()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Frame");
        match self.command() {
            Ok(command) => s.field("command", &command),
            Err(_) => s.field("command", &format!("0x{:02X}", self.command_id)),
        };
        s.field("flags", &format!("0x{:02X}", self.flags))
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Ok(command) => write!(f, "Frame[{}](len={})", command, self.payload.len()),
            Err(_) => write!(
                f,
                "Frame[0x{:02X}](len={})",
                self.command_id,
                self.payload.len()
            ),
        }
    }
}
