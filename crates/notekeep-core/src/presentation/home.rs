//! Home screen: the full note list

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use super::state::{collect_into, StateContainer, TaskScope, ViewState};
use crate::models::Note;
use crate::remote::RemoteNotes;
use crate::use_cases::UseCases;

/// Snapshot of the home screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HomeState {
    pub notes: ViewState<Vec<Note>>,
}

/// State holder for the note list
///
/// Must be created inside a tokio runtime. The list subscription lives as
/// long as the view model.
pub struct HomeViewModel {
    state: StateContainer<HomeState>,
    use_cases: UseCases,
    remote: RemoteNotes,
    _tasks: TaskScope,
}

impl HomeViewModel {
    pub fn new(use_cases: UseCases, remote: RemoteNotes) -> Self {
        let state = StateContainer::new(HomeState::default());

        let mut tasks = TaskScope::default();
        let get_all_notes = use_cases.get_all_notes.clone();
        tasks.spawn(collect_into(
            async move { get_all_notes.call().await },
            state.clone(),
            |notes| HomeState { notes },
        ));

        Self {
            state,
            use_cases,
            remote,
            _tasks: tasks,
        }
    }

    pub fn state(&self) -> HomeState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    /// Delete a note; runs to completion even if the view model is dropped
    pub fn delete_note(&self, id: i64) -> JoinHandle<()> {
        let delete_note = self.use_cases.delete_note.clone();
        tokio::spawn(async move {
            if let Err(e) = delete_note.call(id).await {
                warn!(id, error = %e, "Failed to delete note");
            }
        })
    }

    /// Flip a note's bookmark flag
    pub fn on_bookmark_change(&self, note: &Note) -> JoinHandle<()> {
        let update_note = self.use_cases.update_note.clone();
        let toggled = note.toggled_bookmark();
        tokio::spawn(async move {
            if let Err(e) = update_note.call(toggled).await {
                warn!(error = %e, "Failed to toggle bookmark");
            }
        })
    }

    /// Refresh the remote list; failures leave it unchanged
    pub fn fetch_remote_notes(&self) -> JoinHandle<()> {
        let remote = self.remote.clone();
        tokio::spawn(async move {
            remote.fetch().await;
        })
    }

    /// Notes last fetched from the remote endpoint
    pub fn remote_notes(&self) -> watch::Receiver<Vec<Note>> {
        self.remote.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::LocalNoteRepository;
    use crate::store::NoteStore;
    use std::sync::Arc;

    fn setup() -> (NoteStore, UseCases) {
        let store = NoteStore::open_in_memory().unwrap();
        let use_cases = UseCases::new(Arc::new(LocalNoteRepository::new(store.clone())));
        (store, use_cases)
    }

    async fn wait_for(
        rx: &mut watch::Receiver<HomeState>,
        pred: impl Fn(&HomeState) -> bool,
    ) -> HomeState {
        let state = rx.wait_for(|s| pred(s)).await.unwrap();
        state.clone()
    }

    #[tokio::test]
    async fn test_loading_then_success() {
        let (store, use_cases) = setup();
        store.insert(&Note::new("first", "c")).unwrap();

        let vm = HomeViewModel::new(use_cases, RemoteNotes::disabled());
        let mut rx = vm.subscribe();

        let state = wait_for(&mut rx, |s| !s.notes.is_loading()).await;
        assert_eq!(state.notes.data().unwrap()[0].title, "first");
    }

    #[tokio::test]
    async fn test_bookmark_toggle_and_delete() {
        let (store, use_cases) = setup();
        let id = store.insert(&Note::new("n", "c")).unwrap();
        let vm = HomeViewModel::new(use_cases, RemoteNotes::disabled());
        let mut rx = vm.subscribe();

        let state = wait_for(&mut rx, |s| s.notes.data().is_some()).await;
        let note = state.notes.data().unwrap()[0].clone();

        vm.on_bookmark_change(&note).await.unwrap();
        wait_for(&mut rx, |s| {
            s.notes.data().is_some_and(|n| n.len() == 1 && n[0].is_bookmarked)
        })
        .await;

        vm.delete_note(id).await.unwrap();
        wait_for(&mut rx, |s| s.notes.data().is_some_and(|n| n.is_empty())).await;
    }

    #[tokio::test]
    async fn test_dropping_view_model_unsubscribes() {
        let (store, use_cases) = setup();
        let vm = HomeViewModel::new(use_cases, RemoteNotes::disabled());
        let mut rx = vm.subscribe();
        wait_for(&mut rx, |s| !s.notes.is_loading()).await;
        assert_eq!(store.observer_count(), 1);

        drop(vm);
        // Aborted tasks drop their subscription on the runtime's next turn
        for _ in 0..100 {
            if store.observer_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_error_becomes_error_state() {
        let (store, use_cases) = setup();
        let vm = HomeViewModel::new(use_cases, RemoteNotes::disabled());
        let mut rx = vm.subscribe();
        wait_for(&mut rx, |s| !s.notes.is_loading()).await;

        store.with_connection(|conn| conn.execute_batch("DROP TABLE notes").unwrap());
        store.refresh_observers().unwrap();

        let state = wait_for(&mut rx, |s| matches!(s.notes, ViewState::Error(_))).await;
        let ViewState::Error(message) = state.notes else {
            unreachable!()
        };
        assert!(message.contains("Database error"));
    }

    #[tokio::test]
    async fn test_remote_fetch_failure_leaves_list_empty() {
        let (_store, use_cases) = setup();
        let vm = HomeViewModel::new(use_cases, RemoteNotes::disabled());

        vm.fetch_remote_notes().await.unwrap();
        assert!(vm.remote_notes().borrow().is_empty());
    }
}
