//! Live connection bookkeeping.
//!
//! Every accepted connection is registered before its task starts and
//! removed when that task ends, whichever way it ends. `close_all` cancels
//! whatever is still registered and refuses later registrations, so an
//! accept racing with shutdown cannot leave a connection behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

pub type ConnectionId = u64;

#[derive(Default)]
struct Inner {
    next_id: ConnectionId,
    live: HashMap<ConnectionId, oneshot::Sender<()>>,
    closed: bool,
}

/// Mutex-guarded set of live connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // the map stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a connection. Returns `None` once the registry has been closed.
    pub fn register(self: &Arc<Self>) -> Option<Registration> {
        let mut inner = self.lock();
        if inner.closed {
            return None;
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        inner.live.insert(id, cancel_tx);

        Some(Registration {
            id,
            cancelled: cancel_rx,
            registry: Arc::clone(self),
        })
    }

    /// Removes a connection. Removing an absent id is a no-op.
    pub fn deregister(&self, id: ConnectionId) -> bool {
        self.lock().live.remove(&id).is_some()
    }

    /// Cancels every live connection and rejects further registrations.
    /// Returns how many connections were cancelled.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut inner = self.lock();
            inner.closed = true;
            inner.live.drain().collect()
        };

        let count = drained.len();
        for (_, cancel) in drained {
            // the receiver is gone if the connection already finished
            let _ = cancel.send(());
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A registered connection's handle on its registry entry.
///
/// Dropping it deregisters the connection, so completion, failure and task
/// abortion all end in the same place.
pub struct Registration {
    id: ConnectionId,
    cancelled: oneshot::Receiver<()>,
    registry: Arc<ConnectionRegistry>,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves when the registry cancels this connection.
    pub async fn cancelled(&mut self) {
        // a dropped sender also counts as cancellation
        let _ = (&mut self.cancelled).await;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
