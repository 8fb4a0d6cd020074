//! Bookmarks screen: bookmarked notes, newest first

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use super::state::{collect_into, StateContainer, TaskScope, ViewState};
use crate::models::Note;
use crate::use_cases::UseCases;

/// Snapshot of the bookmarks screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkState {
    pub notes: ViewState<Vec<Note>>,
}

/// State holder for the bookmark-filtered list
pub struct BookmarkViewModel {
    state: StateContainer<BookmarkState>,
    use_cases: UseCases,
    _tasks: TaskScope,
}

impl BookmarkViewModel {
    pub fn new(use_cases: UseCases) -> Self {
        let state = StateContainer::new(BookmarkState::default());

        let mut tasks = TaskScope::default();
        let get_bookmarked_notes = use_cases.get_bookmarked_notes.clone();
        tasks.spawn(collect_into(
            async move { get_bookmarked_notes.call().await },
            state.clone(),
            |notes| BookmarkState { notes },
        ));

        Self {
            state,
            use_cases,
            _tasks: tasks,
        }
    }

    pub fn state(&self) -> BookmarkState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<BookmarkState> {
        self.state.subscribe()
    }

    /// Flip a note's bookmark flag (unbookmarking removes it from this view)
    pub fn on_bookmark_change(&self, note: &Note) -> JoinHandle<()> {
        let update_note = self.use_cases.update_note.clone();
        let toggled = note.toggled_bookmark();
        tokio::spawn(async move {
            if let Err(e) = update_note.call(toggled).await {
                warn!(error = %e, "Failed to toggle bookmark");
            }
        })
    }

    pub fn delete_note(&self, id: i64) -> JoinHandle<()> {
        let delete_note = self.use_cases.delete_note.clone();
        tokio::spawn(async move {
            if let Err(e) = delete_note.call(id).await {
                warn!(id, error = %e, "Failed to delete note");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::LocalNoteRepository;
    use crate::store::NoteStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn setup() -> (NoteStore, BookmarkViewModel) {
        let store = NoteStore::open_in_memory().unwrap();
        let use_cases = UseCases::new(Arc::new(LocalNoteRepository::new(store.clone())));
        (store, BookmarkViewModel::new(use_cases))
    }

    fn titles(state: &BookmarkState) -> Option<Vec<String>> {
        state
            .notes
            .data()
            .map(|notes| notes.iter().map(|n| n.title.clone()).collect())
    }

    #[tokio::test]
    async fn test_shows_bookmarks_newest_first() {
        let (store, vm) = setup();
        let mut rx = vm.subscribe();

        for (title, millis, marked) in [("old", 1, true), ("mid", 2, false), ("new", 3, true)] {
            let created = Utc.timestamp_millis_opt(millis).unwrap();
            store
                .insert(&Note::with_id(0, title, "", created).bookmarked(marked))
                .unwrap();
        }

        let state = rx
            .wait_for(|s| titles(s).is_some_and(|t| t.len() == 2))
            .await
            .unwrap()
            .clone();
        assert_eq!(titles(&state).unwrap(), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_unbookmark_removes_from_view() {
        let (store, vm) = setup();
        store
            .insert(&Note::new("pinned", "c").bookmarked(true))
            .unwrap();
        let mut rx = vm.subscribe();

        let state = rx
            .wait_for(|s| titles(s).is_some_and(|t| t.len() == 1))
            .await
            .unwrap()
            .clone();
        let note = state.notes.data().unwrap()[0].clone();

        vm.on_bookmark_change(&note).await.unwrap();
        rx.wait_for(|s| titles(s).is_some_and(|t| t.is_empty()))
            .await
            .unwrap();

        // Still stored, just not bookmarked
        assert!(!store.get_by_id(note.id).unwrap().unwrap().is_bookmarked);
    }

    #[tokio::test]
    async fn test_delete_from_bookmarks() {
        let (store, vm) = setup();
        let id = store.insert(&Note::new("gone", "c").bookmarked(true)).unwrap();
        let mut rx = vm.subscribe();
        rx.wait_for(|s| titles(s).is_some_and(|t| t.len() == 1))
            .await
            .unwrap();

        vm.delete_note(id).await.unwrap();
        rx.wait_for(|s| titles(s).is_some_and(|t| t.is_empty()))
            .await
            .unwrap();
        assert_eq!(store.note_count().unwrap(), 0);
    }
}
