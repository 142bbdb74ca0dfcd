//! # mxprint-core
//!
//! Core protocol implementation for MXW01 thermal line printers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - CRC-8 checksum calculation
//! - Command definitions
//! - Printer status decoding
//! - 1bpp raster buffer construction
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod raster;
pub mod status;

pub use command::Command;
pub use error::{Error, Result};
pub use frame::Frame;
pub use raster::ImageBuffer;
pub use status::{PrinterState, StatusFlags, StatusReport};

/// Maximum payload size (length field is a u16)
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Frame header size (markers, command, flags, length)
pub const HEADER_SIZE: usize = 6;
