//! High-level printer interface

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use mxprint_core::{
    constants::PRINT_REQUEST_MAGIC, Command, Frame, ImageBuffer, PrinterState, StatusReport,
};
use mxprint_transport::{Notifications, Transport};
use mxprint_types::{Bitmap, Intensity, PrintReport};

use crate::config::PrinterConfig;
use crate::correlation::PendingResponse;
use crate::error::{Error, Result};
use crate::job::PrintJob;
use crate::session::Session;

/// MXW01 printer
///
/// Owns the transport, the correlation table and the last known printer
/// state. Operations are issued one at a time through `&mut self`; inbound
/// notifications are handled by a listener task started in
/// [`Printer::connect`].
///
/// # Examples
///
/// ```no_run
/// use mxprint::{Bitmap, Intensity, MemoryTransport, Printer};
///
/// #[tokio::main]
/// async fn main() -> mxprint::Result<()> {
///     let (transport, _peer) = MemoryTransport::pair("MXW01");
///     let mut printer = Printer::new(transport);
///
///     printer.connect().await?;
///
///     let bitmap = Bitmap::blank(384, 100)?;
///     let report = printer.print(&bitmap, Intensity::MEDIUM).await?;
///     println!("{}", report);
///
///     printer.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct Printer {
    transport: Box<dyn Transport>,
    session: Session,
    config: PrinterConfig,
    notifications: Option<Notifications>,
    listener: Option<Listener>,
}

/// Running notification listener
///
/// The task hands the stream back when told to stop, so a later
/// [`Printer::connect`] can resume it.
struct Listener {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Notifications>,
}

impl Printer {
    /// Create a printer with the default configuration
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, PrinterConfig::default())
    }

    /// Create a printer with a custom configuration
    pub fn with_config(transport: impl Transport + 'static, config: PrinterConfig) -> Self {
        Self {
            transport: Box::new(transport),
            session: Session::new(config.verify_checksums),
            config,
            notifications: None,
            listener: None,
        }
    }

    /// Set command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Last known printer state
    pub fn state(&self) -> Arc<PrinterState> {
        self.session.state()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Check if the notification listener is running
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.handle.is_finished())
    }

    /// Start processing inbound notifications
    ///
    /// If the transport does not hand out a notification stream, frames
    /// must be delivered through [`Printer::notify`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the transport is not connected.
    pub async fn connect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            return Err(Error::NotConnected);
        }

        if self.listener.is_some() {
            return Ok(());
        }

        info!("Listening for notifications from {}...", self.transport.peer_name());

        let stream = self
            .notifications
            .take()
            .or_else(|| self.transport.take_notifications());

        let Some(mut notifications) = stream else {
            debug!("Transport has no notification stream; expecting Printer::notify");
            return Ok(());
        };

        let (shutdown, mut stop) = oneshot::channel();
        let session = self.session.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop => {
                        debug!("Notification listener stopped");
                        break;
                    }
                    raw = notifications.recv() => match raw {
                        Some(raw) => {
                            session.handle_notification(&raw);
                        }
                        None => {
                            debug!("Notification stream closed");
                            break;
                        }
                    },
                }
            }
            notifications
        });

        self.listener = Some(Listener { shutdown, handle });

        Ok(())
    }

    /// Stop the notification listener
    ///
    /// The notification stream is kept for the next [`Printer::connect`].
    /// The transport itself is left to its owner.
    pub async fn disconnect(&mut self) {
        if let Some(Listener { shutdown, handle }) = self.listener.take() {
            info!("Disconnecting from {}...", self.transport.peer_name());
            let _ = shutdown.send(());

            match handle.await {
                Ok(notifications) => self.notifications = Some(notifications),
                Err(e) => warn!("Notification listener ended abnormally: {}", e),
            }
        }
    }

    /// Feed one raw notification frame
    pub fn notify(&self, raw: &[u8]) -> Option<Frame> {
        self.session.handle_notification(raw)
    }

    /// Send a command without waiting for a response
    pub async fn send_command(
        &mut self,
        command: Command,
        payload: impl Into<Bytes>,
    ) -> Result<()> {
        let frame = Frame::with_payload(command, payload)?;
        self.send_frame(&frame).await
    }

    /// Send a command and register for its correlated response
    ///
    /// The waiter is registered before the write so a fast response cannot
    /// slip past it. If the write fails the waiter is removed again.
    pub async fn dispatch(
        &mut self,
        command: Command,
        payload: impl Into<Bytes>,
        timeout: Duration,
    ) -> Result<PendingResponse> {
        let frame = Frame::with_payload(command, payload)?;
        let pending = self.session.pending().register(command.into(), timeout);

        if let Err(e) = self.send_frame(&frame).await {
            self.session.pending().cancel(&pending);
            return Err(e);
        }

        Ok(pending)
    }

    /// Send a command and wait for its response payload
    pub async fn request(
        &mut self,
        command: Command,
        payload: impl Into<Bytes>,
    ) -> Result<Bytes> {
        let timeout = self.config.response_timeout;
        self.dispatch(command, payload, timeout).await?.wait().await
    }

    /// Set print head intensity
    pub async fn set_intensity(&mut self, intensity: Intensity) -> Result<()> {
        debug!("Setting intensity to {}", intensity);

        self.send_command(Command::SetIntensity, vec![intensity.value()])
            .await?;
        sleep(self.config.settle_delay).await;

        Ok(())
    }

    /// Query printer status
    ///
    /// The last known state is updated as a side effect.
    pub async fn request_status(&mut self) -> Result<StatusReport> {
        let timeout = self.config.command_timeout;
        let payload = self
            .dispatch(Command::GetStatus, vec![0x00], timeout)
            .await?
            .wait()
            .await?;

        let report = StatusReport::parse(&payload);
        debug!("Status: {:?}", report);

        Ok(report)
    }

    /// Announce a print job of `lines` lines and return the acknowledgment
    pub async fn print_request(&mut self, lines: u16, mode: u8) -> Result<Bytes> {
        let [lo, hi] = lines.to_le_bytes();
        let timeout = self.config.command_timeout;

        debug!(lines, mode, "Requesting print");

        self.dispatch(
            Command::PrintRequest,
            vec![lo, hi, PRINT_REQUEST_MAGIC, mode],
            timeout,
        )
        .await?
        .wait()
        .await
    }

    /// Write the raster buffer to the data channel
    ///
    /// Returns the number of chunks written.
    pub async fn send_data_chunks(&mut self, buffer: &ImageBuffer) -> Result<usize> {
        let mut sent = 0;

        for chunk in buffer.chunks(self.config.chunk_size) {
            self.transport.write_data(&chunk).await?;
            sent += 1;
            trace!(chunk = sent, len = chunk.len(), "Wrote data chunk");
            sleep(self.config.chunk_delay).await;
        }

        debug!(chunks = sent, bytes = buffer.len(), "Raster transfer finished");

        Ok(sent)
    }

    /// Tell the printer to print the buffered data
    pub async fn flush_data(&mut self) -> Result<()> {
        self.send_command(Command::FlushData, vec![0x00]).await?;
        sleep(self.config.settle_delay).await;

        Ok(())
    }

    /// Wait for the print-complete notification
    pub async fn wait_for_print_complete(&self) -> Result<()> {
        self.session
            .wait_for_completion(self.config.completion_timeout)
            .await
    }

    /// Print a bitmap
    ///
    /// The bitmap must be exactly 384 pixels wide and already oriented the
    /// way the printer feeds paper.
    pub async fn print(&mut self, bitmap: &Bitmap, intensity: Intensity) -> Result<PrintReport> {
        let buffer = ImageBuffer::for_printer(bitmap.rows())?;
        let lines = u16::try_from(bitmap.height()).map_err(|_| {
            mxprint_types::Error::Validation(format!("{} lines is too many", bitmap.height()))
        })?;

        let mut job = PrintJob::new(intensity, lines).with_mode(self.config.print_mode);
        job.run(self, &buffer).await
    }

    // Helper methods

    async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        trace!("Sending: {:?}", frame);

        let data = frame.encode();
        self.transport.write_command(&data).await?;

        Ok(())
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            warn!("Printer dropped while still listening");
            listener.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{simulated, MockLink, Script};
    use mxprint_core::constants::{MIN_LINES, PRINTER_WIDTH_BYTES};
    use mxprint_transport::MemoryTransport;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn disconnected_link() -> MockLink {
        let mut link = MockLink::new();
        link.expect_is_connected().return_const(false);
        link.expect_peer_name().return_const("mock".to_string());
        link
    }

    #[tokio::test]
    async fn test_printer_create() {
        let (transport, _peer) = MemoryTransport::pair("MXW01");
        let printer = Printer::new(transport);

        assert!(printer.is_connected());
        assert!(!printer.is_listening());
        assert_eq!(*printer.state(), PrinterState::default());
    }

    #[tokio::test]
    async fn test_connect_requires_transport() {
        let mut printer = Printer::new(disconnected_link());
        assert!(matches!(printer.connect().await, Err(Error::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_status_updates_state() {
        let mut status = vec![0u8; 14];
        status[6] = 0x09;
        status[9] = 80;
        let (mut printer, peer) = simulated(
            Script { status, ..Script::default() },
            PrinterConfig::default(),
        );
        printer.connect().await.unwrap();

        let report = printer.request_status().await.unwrap();

        assert_eq!(report.battery_level, Some(80));
        assert!(printer.state().printing);
        assert!(printer.state().cover_open);

        drop(printer);
        let log = peer.await.unwrap();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(log.frames[0].payload().as_ref(), &[0x00]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_timeout() {
        let (transport, mut peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport);
        printer.connect().await.unwrap();

        let started = Instant::now();
        let err = printer.request_status().await.unwrap_err();

        assert!(matches!(err, Error::Timeout { command: 0xA1, .. }));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(printer.session().pending().is_empty());

        // A late answer changes state but resolves nothing
        let mut status = vec![0u8; 14];
        status[6] = 0x01;
        let late = Frame::with_payload(Command::GetStatus, status).unwrap();
        printer.notify(&late.encode()).unwrap();
        assert!(printer.session().pending().is_empty());

        assert!(peer.recv_frame().await.unwrap().is(Command::GetStatus));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_cancels_waiter() {
        let mut link = MockLink::new();
        link.expect_is_connected().return_const(true);
        link.expect_write_command()
            .returning(|_| Err(mxprint_transport::Error::ConnectionClosed));

        let mut printer = Printer::new(link);
        let err = printer
            .dispatch(Command::GetStatus, vec![0x00], Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport(mxprint_transport::Error::ConnectionClosed)
        ));
        assert!(printer.session().pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_notify_without_stream() {
        let mut link = MockLink::new();
        link.expect_is_connected().return_const(true);
        link.expect_peer_name().return_const("mock".to_string());
        link.expect_take_notifications().returning(|| None);
        link.expect_write_command().returning(|_| Ok(()));

        let mut printer = Printer::new(link);
        printer.connect().await.unwrap();
        assert!(!printer.is_listening());

        let pending = printer
            .dispatch(Command::PrintRequest, vec![1, 0, 0x30, 0], Duration::from_secs(5))
            .await
            .unwrap();

        let ack = Frame::with_payload(Command::PrintRequest, vec![0x00]).unwrap();
        printer.notify(&ack.encode());

        assert_eq!(pending.wait().await.unwrap().as_ref(), &[0x00]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_data_chunks_paced() {
        let (transport, mut peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport);
        let buffer = ImageBuffer::for_printer(&[vec![true; 384]]).unwrap();

        let started = Instant::now();
        let sent = printer.send_data_chunks(&buffer).await.unwrap();

        assert_eq!(sent, MIN_LINES);
        assert!(started.elapsed() >= Duration::from_millis(15) * MIN_LINES as u32);

        let chunks = peer.drain_data();
        assert_eq!(chunks.len(), MIN_LINES);
        assert_eq!(chunks[0].as_ref(), &[0xFF; PRINTER_WIDTH_BYTES]);
        assert!(chunks[1..].iter().all(|c| c.iter().all(|&b| b == 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_write_failure() {
        let mut link = MockLink::new();
        link.expect_write_data()
            .times(1)
            .returning(|_| Err(mxprint_transport::Error::NotConnected));

        let mut printer = Printer::new(link);
        let buffer = ImageBuffer::for_printer(&[vec![false; 384]]).unwrap();

        assert!(matches!(
            printer.send_data_chunks(&buffer).await,
            Err(Error::Transport(mxprint_transport::Error::NotConnected))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_rejects_wrong_width() {
        let (transport, _peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport);
        let bitmap = Bitmap::blank(200, 10).unwrap();

        let err = printer.print(&bitmap, Intensity::MEDIUM).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Core(mxprint_core::Error::RowWidthMismatch { expected: 384, actual: 200, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_bitmap() {
        let (mut printer, peer) = simulated(Script::default(), PrinterConfig::default());
        printer.connect().await.unwrap();

        let mut rows = vec![vec![false; 384]; 100];
        rows[0][0] = true;
        let bitmap = Bitmap::from_rows(384, rows).unwrap();

        let report = printer.print(&bitmap, Intensity::HIGH).await.unwrap();
        assert_eq!(report.lines, 100);
        assert_eq!(report.chunks, 100);
        assert!(printer.session().is_complete());

        drop(printer);
        let log = peer.await.unwrap();
        assert_eq!(log.frames[0].payload().as_ref(), &[0x90]);
        assert_eq!(log.frames[2].payload().as_ref(), &[100, 0, 0x30, 0]);
        assert_eq!(log.chunks[0][0], 0x01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_listener() {
        let (transport, _peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport);

        printer.connect().await.unwrap();
        assert!(printer.is_listening());

        printer.disconnect().await;
        assert!(!printer.is_listening());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_resumes_notifications() {
        let (mut printer, _peer) = simulated(Script::default(), PrinterConfig::default());

        printer.connect().await.unwrap();
        printer.request_status().await.unwrap();

        printer.disconnect().await;
        printer.connect().await.unwrap();
        assert!(printer.is_listening());

        let report = printer.request_status().await.unwrap();
        assert_eq!(report.state, Some(PrinterState::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_resolves_payload() {
        let mut status = vec![0u8; 14];
        status[10] = 42;
        let (mut printer, _peer) = simulated(
            Script { status, ..Script::default() },
            PrinterConfig::default(),
        );
        printer.connect().await.unwrap();

        let payload = printer.request(Command::GetStatus, vec![0x00]).await.unwrap();

        assert_eq!(payload.len(), 14);
        assert_eq!(payload[10], 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_uses_response_timeout() {
        let (transport, _peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport);
        printer.connect().await.unwrap();

        let started = Instant::now();
        let err = printer
            .request(Command::GetStatus, vec![0x00])
            .await
            .unwrap_err();

        match err {
            Error::Timeout { command, timeout } => {
                assert_eq!(command, 0xA1);
                assert_eq!(timeout, Duration::from_secs(10));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_bounds_status() {
        let (transport, _peer) = MemoryTransport::pair("MXW01");
        let mut printer = Printer::new(transport).with_timeout(Duration::from_secs(2));
        printer.connect().await.unwrap();

        assert_eq!(printer.config().command_timeout, Duration::from_secs(2));

        let err = printer.request_status().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { command: 0xA1, timeout } if timeout == Duration::from_secs(2)));
    }
}
