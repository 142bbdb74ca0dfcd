//! Printer session state
//!
//! A session represents one connected printer and tracks:
//! - Outstanding correlated requests
//! - Last known printer state (replaced wholesale on each status frame)
//! - The print-complete flag
//!
//! Inbound notifications are fed through [`Session::handle_notification`],
//! which is the only writer of this state.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mxprint_core::{Command, Frame, PrinterState, StatusReport};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::correlation::PendingTable;
use crate::error::{Error, Result};

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    pending: PendingTable,

    /// Last decoded printer state
    state: RwLock<Arc<PrinterState>>,

    /// Last full status report
    last_status: RwLock<Option<StatusReport>>,

    /// Print-complete flag
    complete: watch::Sender<bool>,

    /// Reject frames with a bad checksum or terminator
    verify_checksums: bool,
}

impl Session {
    /// Create a new session
    pub fn new(verify_checksums: bool) -> Self {
        let (complete, _) = watch::channel(false);

        Self {
            inner: Arc::new(SessionInner {
                pending: PendingTable::new(),
                state: RwLock::new(Arc::new(PrinterState::default())),
                last_status: RwLock::new(None),
                complete,
                verify_checksums,
            }),
        }
    }

    pub fn pending(&self) -> &PendingTable {
        &self.inner.pending
    }

    /// Last known printer state snapshot
    pub fn state(&self) -> Arc<PrinterState> {
        self.inner.state.read().clone()
    }

    /// Last status report received, if any
    pub fn last_status(&self) -> Option<StatusReport> {
        *self.inner.last_status.read()
    }

    /// Check if a print-complete notification arrived since the last reset
    pub fn is_complete(&self) -> bool {
        *self.inner.complete.borrow()
    }

    /// Clear the print-complete flag before starting a job
    pub fn reset_completion(&self) {
        self.inner.complete.send_replace(false);
    }

    /// Wait until the print-complete flag is set
    ///
    /// Returns immediately if it already is.
    pub async fn wait_for_completion(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.inner.complete.subscribe();

        match tokio::time::timeout(timeout, rx.wait_for(|done| *done)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(Error::CompletionTimeout { timeout }),
        }
    }

    /// Process one raw notification frame
    ///
    /// Malformed frames are logged and dropped. Returns the decoded frame.
    pub fn handle_notification(&self, raw: &[u8]) -> Option<Frame> {
        let decoded = if self.inner.verify_checksums {
            Frame::decode_checked(raw)
        } else {
            Frame::decode(raw)
        };

        let frame = match decoded {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring malformed notification ({} bytes): {}", raw.len(), e);
                return None;
            }
        };

        trace!("Received: {:?}", frame);

        if frame.is(Command::PrintComplete) {
            info!("Print complete notification received");
            self.inner.complete.send_replace(true);
        }

        if frame.is(Command::GetStatus) {
            self.apply_status(frame.payload());
        }

        if !self.inner.pending.resolve(frame.command_id(), frame.payload().clone()) {
            debug!("No waiter for {}, discarding", frame);
        }

        Some(frame)
    }

    fn apply_status(&self, payload: &Bytes) {
        let report = StatusReport::parse(payload);

        if let Some(state) = report.state {
            debug!(%state, "Printer state updated");
            *self.inner.state.write() = Arc::new(state);
        }

        *self.inner.last_status.write() = Some(report);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status_frame(status_byte: u8) -> Vec<u8> {
        let mut payload = vec![0u8; 14];
        payload[6] = status_byte;
        Frame::with_payload(Command::GetStatus, payload).unwrap().encode().to_vec()
    }

    #[test]
    fn test_session_new() {
        let session = Session::default();

        assert_eq!(*session.state(), PrinterState::default());
        assert!(session.last_status().is_none());
        assert!(!session.is_complete());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_status_frame_updates_state() {
        let session = Session::default();
        let before = session.state();

        session.handle_notification(&status_frame(0x07)).unwrap();

        let after = session.state();
        assert!(after.printing && after.paper_jam && after.out_of_paper);
        assert!(!after.cover_open);
        // Old snapshot is untouched
        assert_eq!(*before, PrinterState::default());
    }

    #[test]
    fn test_short_status_keeps_state() {
        let session = Session::default();
        session.handle_notification(&status_frame(0x08));

        let short = Frame::with_payload(Command::GetStatus, vec![0u8; 3]).unwrap().encode();
        session.handle_notification(&short).unwrap();

        assert!(session.state().cover_open);
        assert_eq!(session.last_status().unwrap().state, None);
    }

    #[test]
    fn test_state_persists_across_reset() {
        let session = Session::default();
        session.handle_notification(&status_frame(0x10));
        session.reset_completion();

        assert!(session.state().battery_low);
    }

    #[test]
    fn test_print_complete_sets_flag() {
        let session = Session::default();
        session.handle_notification(&Frame::new(Command::PrintComplete).encode());

        assert!(session.is_complete());
        // Consulted, not consumed
        assert!(session.is_complete());

        session.reset_completion();
        assert!(!session.is_complete());
    }

    #[test]
    fn test_malformed_notification_dropped() {
        let session = Session::default();

        assert!(session.handle_notification(&[0x51, 0x78, 0xA1]).is_none());
        assert!(session.handle_notification(&[0x51, 0x78, 0xA1, 0x00, 0x00, 0x00]).is_none());
        assert_eq!(*session.state(), PrinterState::default());
    }

    #[test]
    fn test_checked_mode_drops_corrupt_frame() {
        let session = Session::new(true);
        let mut raw = status_frame(0x01);
        let len = raw.len();
        raw[len - 2] ^= 0xFF;

        assert!(session.handle_notification(&raw).is_none());
        assert!(!session.state().printing);

        // Lenient mode accepts the same bytes
        assert!(Session::new(false).handle_notification(&raw).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_resolves_waiter() {
        let session = Session::default();
        let pending = session.pending().register(0xA1, Duration::from_secs(5));

        session.handle_notification(&status_frame(0x00));

        let payload = pending.wait().await.unwrap();
        assert_eq!(payload.len(), 14);
        assert!(session.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_completion() {
        let session = Session::default();
        let notifier = session.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            notifier.handle_notification(&Frame::new(Command::PrintComplete).encode());
        });

        session.wait_for_completion(Duration::from_secs(20)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_completion_already_set() {
        let session = Session::default();
        session.handle_notification(&Frame::new(Command::PrintComplete).encode());

        session.wait_for_completion(Duration::from_millis(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_timeout() {
        let session = Session::default();

        let err = session
            .wait_for_completion(Duration::from_secs(20))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CompletionTimeout { .. }));
    }
}
