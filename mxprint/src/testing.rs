//! Test fixtures: a scripted printer and a mocked transport

use async_trait::async_trait;
use bytes::Bytes;
use mockall::mock;
use tokio::task::JoinHandle;

use mxprint_core::{Command, Frame};
use mxprint_transport::{MemoryTransport, Notifications, Transport};

use crate::config::PrinterConfig;
use crate::printer::Printer;

mock! {
    pub Link {}

    #[async_trait]
    impl Transport for Link {
        fn is_connected(&self) -> bool;
        async fn write_command(&mut self, data: &[u8]) -> mxprint_transport::Result<()>;
        async fn write_data(&mut self, data: &[u8]) -> mxprint_transport::Result<()>;
        fn take_notifications(&mut self) -> Option<Notifications>;
        fn peer_name(&self) -> String;
    }
}

/// How the simulated printer answers
pub(crate) struct Script {
    /// Payload of every get-status response
    pub status: Vec<u8>,

    /// Print request acknowledgment, or silence
    pub ack: Option<Vec<u8>>,

    /// Send print-complete after a flush
    pub complete: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            status: vec![0u8; 14],
            ack: Some(vec![0x00]),
            complete: true,
        }
    }
}

/// Everything the simulated printer received
#[derive(Debug, Default)]
pub(crate) struct PeerLog {
    pub frames: Vec<Frame>,
    pub chunks: Vec<Bytes>,
}

/// Build a printer wired to a scripted peer
///
/// The peer task finishes once the printer is dropped and returns what it
/// received.
pub(crate) fn simulated(script: Script, config: PrinterConfig) -> (Printer, JoinHandle<PeerLog>) {
    let (transport, mut peer) = MemoryTransport::pair("MXW01-sim");

    let handle = tokio::spawn(async move {
        let mut log = PeerLog::default();

        while let Some(frame) = peer.recv_frame().await {
            log.frames.push(frame.clone());

            let reply = match frame.command() {
                Ok(Command::GetStatus) => Some((Command::GetStatus, script.status.clone())),
                Ok(Command::PrintRequest) => script
                    .ack
                    .clone()
                    .map(|ack| (Command::PrintRequest, ack)),
                Ok(Command::FlushData) => {
                    log.chunks.extend(peer.drain_data());
                    script.complete.then(|| (Command::PrintComplete, Vec::new()))
                }
                _ => None,
            };

            if let Some((command, payload)) = reply {
                let frame = Frame::with_payload(command, payload).unwrap();
                // Listener may already be gone
                let _ = peer.notify(&frame).await;
            }
        }

        log.chunks.extend(peer.drain_data());
        log
    });

    (Printer::with_config(transport, config), handle)
}
