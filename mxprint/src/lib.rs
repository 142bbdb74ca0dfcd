//! # mxprint
//!
//! Protocol engine for MXW01 thermal line printers.
//!
//! ## Features
//!
//! - Type-safe framing with CRC-8 checksums
//! - 1bpp raster packing for the 384 dot print head
//! - Correlated request/response handling with per-command timeouts
//! - A print job state machine from intensity setup to print completion
//! - Async/await API using Tokio, transport agnostic
//!
//! ## Quick Start
//!
//! ```no_run
//! use mxprint::{Bitmap, Intensity, MemoryTransport, Printer};
//!
//! #[tokio::main]
//! async fn main() -> mxprint::Result<()> {
//!     // Any Transport works; the peer end is wired to a BLE stack
//!     let (transport, _peer) = MemoryTransport::pair("MXW01");
//!     let mut printer = Printer::new(transport);
//!     printer.connect().await?;
//!
//!     let mut bitmap = Bitmap::new(384);
//!     bitmap.push_row(vec![true; 384])?;
//!
//!     let report = printer.print(&bitmap, Intensity::MEDIUM).await?;
//!     println!("{}", report);
//!
//!     printer.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod correlation;
pub mod error;
pub mod job;
pub mod printer;
pub mod session;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::PrinterConfig;
pub use correlation::{PendingResponse, PendingTable};
pub use error::{Error, Result};
pub use job::{JobState, PrintJob};
pub use printer::Printer;
pub use session::Session;

// Re-export protocol and transport types
pub use mxprint_core::{Command, Frame, ImageBuffer, PrinterState, StatusFlags, StatusReport};
pub use mxprint_transport::{MemoryPeer, MemoryTransport, Transport};
pub use mxprint_types::{Bitmap, Intensity, PrintReport};
