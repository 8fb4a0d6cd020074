//! Detail screen: editor for a single note
//!
//! Opened either for a new note (`note_id == None`) or for an existing one,
//! in which case the form follows the stored note live. Saving goes through
//! the add use case, so an existing note is replaced in place and keeps its
//! creation date.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::state::{StateContainer, TaskScope};
use crate::models::{Note, NEW_NOTE_ID};
use crate::storage::error::StorageResult;
use crate::use_cases::UseCases;

/// Snapshot of the editor form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_bookmark: bool,
    pub created_date: DateTime<Utc>,
    pub is_updating_note: bool,
    /// Why the stored note could not be loaded, if it failed
    pub error: Option<String>,
}

impl Default for DetailState {
    fn default() -> Self {
        let blank = Note::new("", "");
        Self {
            id: NEW_NOTE_ID,
            title: blank.title,
            content: blank.content,
            is_bookmark: false,
            created_date: blank.created_date,
            is_updating_note: false,
            error: None,
        }
    }
}

impl DetailState {
    /// The note this form would save
    pub fn to_note(&self) -> Note {
        Note {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            created_date: self.created_date,
            is_bookmarked: self.is_bookmark,
        }
    }

    fn load(&mut self, note: Note) {
        self.id = note.id;
        self.title = note.title;
        self.content = note.content;
        self.is_bookmark = note.is_bookmarked;
        self.created_date = note.created_date;
    }
}

/// State holder for the note editor
pub struct DetailViewModel {
    state: StateContainer<DetailState>,
    use_cases: UseCases,
    _tasks: TaskScope,
}

impl DetailViewModel {
    pub fn new(use_cases: UseCases, note_id: Option<i64>) -> Self {
        let state = StateContainer::new(DetailState {
            is_updating_note: note_id.is_some(),
            ..DetailState::default()
        });

        let mut tasks = TaskScope::default();
        if let Some(id) = note_id {
            tasks.spawn(follow_note(use_cases.clone(), id, state.clone()));
        }

        Self {
            state,
            use_cases,
            _tasks: tasks,
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Whether both title and content are filled in
    pub fn is_form_not_blank(&self) -> bool {
        self.state().to_note().is_complete()
    }

    pub fn on_title_change(&self, title: impl Into<String>) {
        let title = title.into();
        self.state.update(|s| s.title = title);
    }

    pub fn on_content_change(&self, content: impl Into<String>) {
        let content = content.into();
        self.state.update(|s| s.content = content);
    }

    pub fn on_bookmark_change(&self, is_bookmark: bool) {
        self.state.update(|s| s.is_bookmark = is_bookmark);
    }

    /// Save the form, returning the stored id
    ///
    /// A new note adopts the id assigned by the store, so saving again
    /// replaces it instead of creating a duplicate.
    pub fn add_or_update_note(&self) -> JoinHandle<StorageResult<i64>> {
        let add_note = self.use_cases.add_note.clone();
        let state = self.state.clone();
        let note = self.state.snapshot().to_note();

        tokio::spawn(async move {
            let result = add_note.call(note).await;
            match &result {
                Ok(id) => state.update(|s| s.id = *id),
                Err(e) => warn!(error = %e, "Failed to save note"),
            }
            result
        })
    }
}

/// Keep the form in sync with the stored note
async fn follow_note(use_cases: UseCases, id: i64, state: StateContainer<DetailState>) {
    let mut subscription = match use_cases.get_note_by_id.call(id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(id, error = %e, "Failed to open note");
            state.update(|s| s.error = Some(e.to_string()));
            return;
        }
    };

    while let Some(item) = subscription.recv().await {
        match item {
            Ok(note) => {
                debug!(id, "Note loaded into editor");
                state.update(|s| s.load(note));
            }
            Err(e) => {
                warn!(id, error = %e, recoverable = e.is_recoverable(), "Note subscription failed");
                state.update(|s| s.error = Some(e.to_string()));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::LocalNoteRepository;
    use crate::store::NoteStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn setup() -> (NoteStore, UseCases) {
        let store = NoteStore::open_in_memory().unwrap();
        let use_cases = UseCases::new(Arc::new(LocalNoteRepository::new(store.clone())));
        (store, use_cases)
    }

    #[tokio::test]
    async fn test_new_note_form() {
        let (store, use_cases) = setup();
        let vm = DetailViewModel::new(use_cases, None);

        assert!(!vm.state().is_updating_note);
        assert!(!vm.is_form_not_blank());

        vm.on_title_change("Title");
        assert!(!vm.is_form_not_blank());
        vm.on_content_change("Content");
        vm.on_bookmark_change(true);
        assert!(vm.is_form_not_blank());

        let id = vm.add_or_update_note().await.unwrap().unwrap();
        assert_eq!(vm.state().id, id);

        // Saving again replaces rather than duplicates
        vm.on_title_change("Renamed");
        assert_eq!(vm.add_or_update_note().await.unwrap().unwrap(), id);

        let stored = store.get_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Renamed");
        assert!(stored[0].is_bookmarked);
    }

    #[tokio::test]
    async fn test_editing_existing_note_keeps_created_date() {
        let (store, use_cases) = setup();
        let created = Utc.timestamp_millis_opt(1_600_000_000_000).unwrap();
        let id = store
            .insert(&Note::with_id(0, "Original", "Body", created))
            .unwrap();

        let vm = DetailViewModel::new(use_cases, Some(id));
        let mut rx = vm.subscribe();
        rx.wait_for(|s| s.id == id).await.unwrap();

        let state = vm.state();
        assert!(state.is_updating_note);
        assert_eq!(state.title, "Original");
        assert_eq!(state.created_date, created);

        vm.on_content_change("Edited body");
        vm.add_or_update_note().await.unwrap().unwrap();

        let stored = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.content, "Edited body");
        assert_eq!(stored.created_date, created);
        assert_eq!(store.note_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_follows_external_changes() {
        let (store, use_cases) = setup();
        let id = store.insert(&Note::new("before", "c")).unwrap();

        let vm = DetailViewModel::new(use_cases, Some(id));
        let mut rx = vm.subscribe();
        rx.wait_for(|s| s.title == "before").await.unwrap();

        let note = store.get_by_id(id).unwrap().unwrap();
        store.update(&note.toggled_bookmark()).unwrap();

        rx.wait_for(|s| s.is_bookmark).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_failure_becomes_error() {
        let (store, use_cases) = setup();
        let id = store.insert(&Note::new("doomed", "c")).unwrap();

        let vm = DetailViewModel::new(use_cases, Some(id));
        let mut rx = vm.subscribe();
        rx.wait_for(|s| s.id == id).await.unwrap();
        assert!(vm.state().error.is_none());

        store.with_connection(|conn| conn.execute_batch("DROP TABLE notes").unwrap());
        store.refresh_observers().unwrap();

        let state = rx.wait_for(|s| s.error.is_some()).await.unwrap().clone();
        assert!(state.error.unwrap().contains("Database error"));
        // Form keeps the last loaded values
        assert_eq!(state.title, "doomed");
    }

    #[tokio::test]
    async fn test_missing_note_leaves_form_blank() {
        let (_store, use_cases) = setup();
        let vm = DetailViewModel::new(use_cases, Some(99));

        tokio::task::yield_now().await;
        let state = vm.state();
        assert!(state.is_updating_note);
        assert_eq!(state.id, NEW_NOTE_ID);
        assert!(state.title.is_empty());
        assert!(state.error.is_none());
    }
}
