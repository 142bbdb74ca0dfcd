//! Command/response correlation
//!
//! The printer answers a request with a notification carrying the same
//! command identifier, and never pipelines. The table therefore holds at most
//! one waiter per identifier. Registering again for an identifier replaces
//! the previous waiter; the replaced handle fails with
//! [`Error::WaiterDisplaced`] right away instead of hanging until its
//! deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Outstanding waiters keyed by command identifier
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct PendingTable {
    inner: Arc<Mutex<PendingInner>>,
}

#[derive(Debug, Default)]
struct PendingInner {
    waiters: HashMap<u8, Waiter>,
    next_token: u64,
}

#[derive(Debug)]
struct Waiter {
    token: u64,
    deadline: Instant,
    tx: oneshot::Sender<Bytes>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `command`, replacing any existing one
    pub fn register(&self, command: u8, timeout: Duration) -> PendingResponse {
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + timeout;

        let mut inner = self.inner.lock();
        let token = inner.next_token;
        inner.next_token = inner.next_token.wrapping_add(1);

        if let Some(previous) = inner.waiters.insert(command, Waiter { token, deadline, tx }) {
            warn!(
                command = format!("0x{:02X}", command),
                displaced = previous.token,
                "Replacing outstanding waiter"
            );
        }

        trace!(command = format!("0x{:02X}", command), token, ?timeout, "Registered waiter");

        PendingResponse {
            command,
            token,
            timeout,
            deadline,
            rx,
            table: self.clone(),
        }
    }

    /// Resolve the waiter for `command` with `payload`
    ///
    /// Returns `false` if nobody was waiting (or the waiter was abandoned).
    pub fn resolve(&self, command: u8, payload: Bytes) -> bool {
        let Some(waiter) = self.inner.lock().waiters.remove(&command) else {
            return false;
        };

        match waiter.tx.send(payload) {
            Ok(()) => {
                debug!(command = format!("0x{:02X}", command), "Resolved waiter");
                true
            }
            Err(_) => {
                trace!(command = format!("0x{:02X}", command), "Waiter already abandoned");
                false
            }
        }
    }

    /// Remove the waiter behind `pending`, unless it was already replaced
    pub fn cancel(&self, pending: &PendingResponse) -> bool {
        self.remove_if(pending.command, pending.token)
    }

    fn remove_if(&self, command: u8, token: u64) -> bool {
        let mut inner = self.inner.lock();
        match inner.waiters.get(&command) {
            Some(waiter) if waiter.token == token => {
                inner.waiters.remove(&command);
                true
            }
            _ => false,
        }
    }

    /// Drop every waiter whose deadline is at or before `now`
    ///
    /// Returns the number of waiters removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.waiters.len();
        inner.waiters.retain(|_, waiter| waiter.deadline > now);
        before - inner.waiters.len()
    }

    /// Check if a waiter is registered for `command`
    pub fn is_pending(&self, command: u8) -> bool {
        self.inner.lock().waiters.contains_key(&command)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().waiters.is_empty()
    }
}

/// Handle for one correlated response
#[derive(Debug)]
pub struct PendingResponse {
    command: u8,
    token: u64,
    timeout: Duration,
    deadline: Instant,
    rx: oneshot::Receiver<Bytes>,
    table: PendingTable,
}

impl PendingResponse {
    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the response payload
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] when the deadline passes; the waiter is removed
    ///   so a late frame is discarded
    /// - [`Error::WaiterDisplaced`] when a newer registration replaced it
    pub async fn wait(self) -> Result<Bytes> {
        let Self {
            command,
            token,
            timeout,
            deadline,
            rx,
            table,
        } = self;

        match timeout_at(deadline, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(Error::WaiterDisplaced { command }),
            Err(_) => {
                table.remove_if(command, token);
                debug!(command = format!("0x{:02X}", command), ?timeout, "Waiter timed out");
                Err(Error::Timeout { command, timeout })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_resolve() {
        let table = PendingTable::new();
        let pending = table.register(0xA1, Duration::from_secs(5));

        assert!(table.is_pending(0xA1));
        assert!(table.resolve(0xA1, Bytes::from_static(&[1, 2, 3])));
        assert!(table.is_empty());

        assert_eq!(pending.wait().await.unwrap().as_ref(), &[1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_without_waiter() {
        let table = PendingTable::new();
        assert!(!table.resolve(0xA9, Bytes::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_waiter() {
        let table = PendingTable::new();
        let pending = table.register(0xA1, Duration::from_secs(5));
        let started = Instant::now();

        let err = pending.wait().await.unwrap_err();

        assert!(matches!(err, Error::Timeout { command: 0xA1, .. }));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(!table.is_pending(0xA1));

        // Late frame has nothing to resolve
        assert!(!table.resolve(0xA1, Bytes::from_static(&[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_displaced_waiter_fails_fast() {
        let table = PendingTable::new();
        let first = table.register(0xA9, Duration::from_secs(5));
        let second = table.register(0xA9, Duration::from_secs(5));

        assert_eq!(table.len(), 1);
        assert!(matches!(
            first.wait().await,
            Err(Error::WaiterDisplaced { command: 0xA9 })
        ));

        assert!(table.resolve(0xA9, Bytes::from_static(&[0])));
        assert_eq!(second.wait().await.unwrap().as_ref(), &[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timeout_keeps_successor() {
        let table = PendingTable::new();
        let first = table.register(0xA1, Duration::from_secs(1));

        // Displaced handle must not remove the newer registration
        let second = table.register(0xA1, Duration::from_secs(10));
        assert!(!table.cancel(&first));
        assert!(table.is_pending(0xA1));

        assert!(table.cancel(&second));
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_commands() {
        let table = PendingTable::new();
        let status = table.register(0xA1, Duration::from_secs(5));
        let print = table.register(0xA9, Duration::from_secs(5));

        assert!(table.resolve(0xA9, Bytes::from_static(&[0])));
        assert!(table.resolve(0xA1, Bytes::from_static(&[7])));

        assert_eq!(print.wait().await.unwrap().as_ref(), &[0]);
        assert_eq!(status.wait().await.unwrap().as_ref(), &[7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let table = PendingTable::new();
        let _short = table.register(0xA1, Duration::from_secs(1));
        let _long = table.register(0xA9, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(table.purge_expired(Instant::now()), 1);
        assert!(!table.is_pending(0xA1));
        assert!(table.is_pending(0xA9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_handle() {
        let table = PendingTable::new();
        drop(table.register(0xA1, Duration::from_secs(5)));

        assert!(!table.resolve(0xA1, Bytes::new()));
        assert!(table.is_empty());
    }
}
