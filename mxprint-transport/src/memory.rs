//! In-process channel transport
//!
//! [`MemoryTransport`] implements [`Transport`] over tokio channels. The
//! other end, [`MemoryPeer`], sees every command and data write and can push
//! notification frames back. It is the glue for bridging a Bluetooth stack
//! that lives on its own task, and doubles as a simulated printer in tests.

use async_trait::async_trait;
use bytes::Bytes;
use mxprint_core::Frame;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::{error::*, Notifications, Transport};

/// Channel-backed transport
pub struct MemoryTransport {
    name: String,
    command_tx: Option<mpsc::UnboundedSender<Bytes>>,
    data_tx: Option<mpsc::UnboundedSender<Bytes>>,
    notifications: Option<Notifications>,
}

/// Remote end of a [`MemoryTransport`]
pub struct MemoryPeer {
    commands: mpsc::UnboundedReceiver<Bytes>,
    data: mpsc::UnboundedReceiver<Bytes>,
    notify_tx: mpsc::Sender<Bytes>,
}

impl MemoryTransport {
    /// Buffered notifications before the peer has to wait
    pub const NOTIFICATION_CAPACITY: usize = 64;

    /// Create a connected transport and its peer
    pub fn pair(name: impl Into<String>) -> (Self, MemoryPeer) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (data_tx, data) = mpsc::unbounded_channel();
        let (notify_tx, notifications) = mpsc::channel(Self::NOTIFICATION_CAPACITY);

        let transport = Self {
            name: name.into(),
            command_tx: Some(command_tx),
            data_tx: Some(data_tx),
            notifications: Some(notifications),
        };

        let peer = MemoryPeer {
            commands,
            data,
            notify_tx,
        };

        (transport, peer)
    }

    /// Drop the outbound channels; later writes fail with `NotConnected`
    pub fn disconnect(&mut self) {
        if self.command_tx.take().is_some() {
            debug!("Disconnecting from {}...", self.name);
        }
        self.data_tx = None;
    }

    fn send(
        tx: Option<&mpsc::UnboundedSender<Bytes>>,
        channel: &'static str,
        data: &[u8],
    ) -> Result<()> {
        let tx = tx.ok_or(Error::NotConnected)?;

        trace!(
            "Writing {} bytes to {} channel: {:02X?}",
            data.len(),
            channel,
            &data[..data.len().min(16)]
        );

        tx.send(Bytes::copy_from_slice(data))
            .map_err(|_| Error::WriteFailed {
                channel,
                reason: "peer dropped".to_string(),
            })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn is_connected(&self) -> bool {
        self.command_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        Self::send(self.command_tx.as_ref(), "command", data)
    }

    async fn write_data(&mut self, data: &[u8]) -> Result<()> {
        Self::send(self.data_tx.as_ref(), "data", data)
    }

    fn take_notifications(&mut self) -> Option<Notifications> {
        self.notifications.take()
    }

    fn peer_name(&self) -> String {
        self.name.clone()
    }
}

impl MemoryPeer {
    /// Next raw command-channel write
    pub async fn recv_command(&mut self) -> Option<Bytes> {
        self.commands.recv().await
    }

    /// Next decodable command frame
    ///
    /// Writes that do not decode are logged and skipped.
    pub async fn recv_frame(&mut self) -> Option<Frame> {
        while let Some(raw) = self.commands.recv().await {
            match Frame::decode_checked(&raw) {
                Ok(frame) => return Some(frame),
                Err(e) => warn!("Peer skipped undecodable command write: {}", e),
            }
        }
        None
    }

    /// Next data-channel write
    pub async fn recv_data(&mut self) -> Option<Bytes> {
        self.data.recv().await
    }

    /// All data-channel writes received so far
    pub fn drain_data(&mut self) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Ok(chunk) = self.data.try_recv() {
            chunks.push(chunk);
        }
        chunks
    }

    /// Send an encoded frame on the notification channel
    pub async fn notify(&self, frame: &Frame) -> Result<()> {
        self.notify_raw(frame.encode().freeze()).await
    }

    /// Send raw bytes on the notification channel
    pub async fn notify_raw(&self, raw: impl Into<Bytes>) -> Result<()> {
        self.notify_tx
            .send(raw.into())
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Handle for pushing notifications from another task
    pub fn notifier(&self) -> mpsc::Sender<Bytes> {
        self.notify_tx.clone()
    }
}
