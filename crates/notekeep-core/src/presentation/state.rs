//! Observable view state
//!
//! A `StateContainer` holds the latest immutable snapshot of a screen's
//! state. Updates replace the whole snapshot; readers either take a copy or
//! watch for replacements.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::observe::Subscription;
use crate::storage::error::StorageResult;

/// Load state of a piece of screen data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    /// Waiting for the first snapshot
    Loading,
    /// Latest snapshot
    Success(T),
    /// The subscription failed; carries a message fit for display
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    /// The loaded value, if any
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// Holder of a replace-only state snapshot
pub struct StateContainer<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for StateContainer<S> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<S: Clone> StateContainer<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every replacement
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Replace the snapshot
    pub fn replace(&self, next: S) {
        self.tx.send_replace(next);
    }

    /// Modify the snapshot in one step
    ///
    /// Runs under the channel's lock, so concurrent updates never overwrite
    /// each other.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }
}

/// Background tasks owned by a view model
///
/// Dropping the scope aborts every task, which drops their subscriptions
/// and unregisters them from the store.
#[derive(Default)]
pub struct TaskScope {
    handles: Vec<JoinHandle<()>>,
}

impl TaskScope {
    pub fn spawn(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.handles.push(tokio::spawn(task));
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Feed a live query into a state container until it ends
///
/// `open` resolves to the subscription; each snapshot is wrapped in
/// `ViewState::Success` and passed through `to_state`. A failure, either
/// while opening or delivered on the stream, becomes `ViewState::Error` and
/// ends collection. There is no retry.
pub(crate) async fn collect_into<T, S, O, F>(open: O, state: StateContainer<S>, to_state: F)
where
    S: Clone,
    O: Future<Output = StorageResult<Subscription<T>>>,
    F: Fn(ViewState<T>) -> S,
{
    let mut subscription = match open.await {
        Ok(subscription) => subscription,
        Err(e) => {
            state.replace(to_state(ViewState::Error(e.to_string())));
            return;
        }
    };

    while let Some(item) = subscription.recv().await {
        match item {
            Ok(value) => state.replace(to_state(ViewState::Success(value))),
            Err(e) => {
                debug!(error = %e, recoverable = e.is_recoverable(), "Live query failed");
                state.replace(to_state(ViewState::Error(e.to_string())));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_snapshot() {
        let state = StateContainer::new(ViewState::<u32>::Loading);
        let snapshot = state.snapshot();

        state.replace(ViewState::Success(3));

        assert!(snapshot.is_loading());
        assert_eq!(state.snapshot().data(), Some(&3));
    }

    #[test]
    fn test_update_copies_current() {
        let state = StateContainer::new(vec![1, 2]);
        state.update(|v| v.push(3));
        assert_eq!(state.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let state = StateContainer::new(0u64);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..20_000 {
                        state.update(|v| *v += 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(state.snapshot(), 80_000);
    }

    #[tokio::test]
    async fn test_subscribers_see_replacement() {
        let state = StateContainer::new(0u32);
        let mut rx = state.subscribe();

        let writer = state.clone();
        tokio::spawn(async move { writer.replace(7) });

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 7);
    }

    #[tokio::test]
    async fn test_task_scope_aborts_on_drop() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut scope = TaskScope::default();
        scope.spawn(async move {
            // Holds the sender until aborted
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        drop(scope);
        assert!(rx.await.is_err());
    }
}
