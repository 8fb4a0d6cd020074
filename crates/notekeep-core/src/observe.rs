//! Live query subscriptions
//!
//! Every open query is an observer in a registry owned by the store. After a
//! committed write the store walks the registry and each observer re-runs its
//! query against the connection, delivering the result to its subscriber if
//! it changed since the last delivery.
//!
//! A `Subscription` is the receiving end. It yields `Ok(snapshot)` values,
//! or a single `Err` followed by end-of-stream when the query fails.
//! Dropping it (or calling `unsubscribe`) removes the observer.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Mutex, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use rusqlite::Connection;
use tokio::sync::mpsc;
use tracing::debug;

use crate::storage::error::StorageResult;

/// Identifier of a registered observer
pub type ObserverId = u64;

/// A registered query that can be re-run after writes
pub(crate) trait Observer: Send {
    /// Re-run the query and deliver the result if it changed.
    ///
    /// Returns `false` once the observer is finished: its subscriber went
    /// away or a failure was delivered.
    fn refresh(&mut self, conn: &Connection) -> bool;
}

/// Observer backed by a query closure
///
/// The query returns `Ok(None)` when there is nothing to deliver (a point
/// lookup with no matching row).
pub(crate) struct QueryObserver<T, F> {
    query: F,
    last: Option<T>,
    tx: mpsc::UnboundedSender<StorageResult<T>>,
}

impl<T, F> QueryObserver<T, F>
where
    T: Clone + PartialEq + Send,
    F: FnMut(&Connection) -> StorageResult<Option<T>> + Send,
{
    pub(crate) fn new(query: F, tx: mpsc::UnboundedSender<StorageResult<T>>) -> Self {
        Self {
            query,
            last: None,
            tx,
        }
    }
}

impl<T, F> Observer for QueryObserver<T, F>
where
    T: Clone + PartialEq + Send,
    F: FnMut(&Connection) -> StorageResult<Option<T>> + Send,
{
    fn refresh(&mut self, conn: &Connection) -> bool {
        if self.tx.is_closed() {
            return false;
        }

        match (self.query)(conn) {
            Ok(Some(value)) => {
                if self.last.as_ref() == Some(&value) {
                    return true;
                }
                self.last = Some(value.clone());
                self.tx.send(Ok(value)).is_ok()
            }
            Ok(None) => {
                self.last = None;
                true
            }
            Err(e) => {
                let _ = self.tx.send(Err(e));
                false
            }
        }
    }
}

/// Registry of open observers
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: ObserverId,
    observers: HashMap<ObserverId, Box<dyn Observer>>,
}

impl ObserverRegistry {
    /// Reserve an id for a new observer
    pub(crate) fn next_id(&mut self) -> ObserverId {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn insert(&mut self, id: ObserverId, observer: Box<dyn Observer>) {
        self.observers.insert(id, observer);
    }

    pub(crate) fn remove(&mut self, id: ObserverId) {
        if self.observers.remove(&id).is_some() {
            debug!(observer = id, "Observer removed");
        }
    }

    /// Re-run every observer, dropping the ones that finished
    pub(crate) fn notify(&mut self, conn: &Connection) {
        self.observers.retain(|id, observer| {
            let keep = observer.refresh(conn);
            if !keep {
                debug!(observer = *id, "Observer finished");
            }
            keep
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

/// Receiving end of a live query
pub struct Subscription<T> {
    id: ObserverId,
    rx: mpsc::UnboundedReceiver<StorageResult<T>>,
    registry: Weak<Mutex<ObserverRegistry>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        id: ObserverId,
        rx: mpsc::UnboundedReceiver<StorageResult<T>>,
        registry: Weak<Mutex<ObserverRegistry>>,
    ) -> Self {
        Self { id, rx, registry }
    }

    /// Observer id, unique within the owning store
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` once the stream has ended: after a delivered error, or
    /// when the store has been dropped.
    pub async fn recv(&mut self) -> Option<StorageResult<T>> {
        self.rx.recv().await
    }

    /// Take an already delivered snapshot without waiting
    ///
    /// The initial snapshot is delivered while the subscription is opened,
    /// so calling this right after subscribing returns the current value, or
    /// `None` for a point lookup with no matching row.
    pub fn try_recv(&mut self) -> Option<StorageResult<T>> {
        self.rx.try_recv().ok()
    }

    /// Take only the most recent delivered snapshot, discarding older ones
    pub fn latest(&mut self) -> Option<StorageResult<T>> {
        let mut latest = None;
        while let Ok(item) = self.rx.try_recv() {
            latest = Some(item);
        }
        latest
    }

    /// Stop receiving updates
    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
            registry.remove(self.id);
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = StorageResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
