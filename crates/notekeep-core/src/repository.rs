//! Storage-agnostic note repository
//!
//! `NoteRepository` is the seam between the use cases and the storage
//! technology. `LocalNoteRepository` is the SQLite-backed implementation and
//! forwards every call to `NoteStore` unchanged.

use crate::models::Note;
use crate::observe::Subscription;
use crate::storage::error::StorageResult;
use crate::store::NoteStore;

/// Note storage capability
///
/// Writes block until durable; async callers should run them on a blocking
/// thread (the use cases do).
pub trait NoteRepository: Send + Sync {
    /// Live list of all notes, oldest first
    fn get_all_notes(&self) -> StorageResult<Subscription<Vec<Note>>>;

    /// Live view of one note; silent while the note does not exist
    fn get_note_by_id(&self, id: i64) -> StorageResult<Subscription<Note>>;

    /// Insert or replace a note, returning its id
    fn insert(&self, note: &Note) -> StorageResult<i64>;

    /// Replace an existing note's mutable fields; no-op if missing
    fn update(&self, note: &Note) -> StorageResult<()>;

    /// Delete a note; no-op if missing
    fn delete(&self, id: i64) -> StorageResult<()>;

    /// Live list of bookmarked notes, newest first
    fn get_bookmarked_notes(&self) -> StorageResult<Subscription<Vec<Note>>>;
}

/// Repository backed by the local SQLite store
#[derive(Clone)]
pub struct LocalNoteRepository {
    store: NoteStore,
}

impl LocalNoteRepository {
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }
}

impl NoteRepository for LocalNoteRepository {
    fn get_all_notes(&self) -> StorageResult<Subscription<Vec<Note>>> {
        self.store.observe_all()
    }

    fn get_note_by_id(&self, id: i64) -> StorageResult<Subscription<Note>> {
        self.store.observe_by_id(id)
    }

    fn insert(&self, note: &Note) -> StorageResult<i64> {
        self.store.insert(note)
    }

    fn update(&self, note: &Note) -> StorageResult<()> {
        self.store.update(note)
    }

    fn delete(&self, id: i64) -> StorageResult<()> {
        self.store.delete(id)
    }

    fn get_bookmarked_notes(&self) -> StorageResult<Subscription<Vec<Note>>> {
        self.store.observe_bookmarked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_repository_is_object_safe() {
        let store = NoteStore::open_in_memory().unwrap();
        let repository: Arc<dyn NoteRepository> = Arc::new(LocalNoteRepository::new(store));

        let id = repository.insert(&Note::new("t", "c")).unwrap();
        let mut by_id = repository.get_note_by_id(id).unwrap();
        assert_eq!(by_id.try_recv().unwrap().unwrap().id, id);
    }

    #[test]
    fn test_writes_reach_the_shared_store() {
        let store = NoteStore::open_in_memory().unwrap();
        let repository = LocalNoteRepository::new(store.clone());

        let id = repository.insert(&Note::new("t", "c")).unwrap();
        let note = store.get_by_id(id).unwrap().unwrap();
        repository.update(&note.toggled_bookmark()).unwrap();

        let mut bookmarked = repository.get_bookmarked_notes().unwrap();
        assert_eq!(bookmarked.try_recv().unwrap().unwrap().len(), 1);

        repository.delete(id).unwrap();
        assert_eq!(store.note_count().unwrap(), 0);
        assert!(bookmarked.try_recv().unwrap().unwrap().is_empty());
    }
}
