//! Transport layer for the MXW01 protocol
//!
//! The printer exposes three channels: a command channel, a bulk data
//! channel and a notification channel. Connection setup and discovery are
//! left to the implementation; the protocol engine only writes bytes and
//! consumes inbound notification frames.

pub mod error;
pub mod memory;

pub use error::{Error, Result};
pub use memory::{MemoryPeer, MemoryTransport};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Stream of raw inbound notification frames
pub type Notifications = mpsc::Receiver<Bytes>;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Write one frame to the command channel
    async fn write_command(&mut self, data: &[u8]) -> Result<()>;

    /// Write one chunk to the bulk data channel
    async fn write_data(&mut self, data: &[u8]) -> Result<()>;

    /// Hand over the inbound notification stream
    ///
    /// Returns `None` once taken, or if the implementation delivers
    /// notifications through some other path.
    fn take_notifications(&mut self) -> Option<Notifications>;

    /// Human readable name of the remote printer
    fn peer_name(&self) -> String;
}
