//! Use cases exposed to the presentation layer
//!
//! Each use case wraps exactly one repository call. They are async: the
//! repository call runs on tokio's blocking pool so the calling task is
//! never stuck on disk I/O. Errors pass through unchanged.

use std::sync::Arc;

use crate::models::Note;
use crate::observe::Subscription;
use crate::repository::NoteRepository;
use crate::storage::error::{StorageError, StorageResult};

/// Run a repository call on the blocking pool
async fn run_blocking<T, F>(repository: &Arc<dyn NoteRepository>, op: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn NoteRepository) -> StorageResult<T> + Send + 'static,
{
    let repository = Arc::clone(repository);
    tokio::task::spawn_blocking(move || op(repository.as_ref()))
        .await
        .map_err(|e| StorageError::Worker(e.to_string()))?
}

/// Persist a new note, or replace one with the same id
#[derive(Clone)]
pub struct AddOrInsertNote {
    repository: Arc<dyn NoteRepository>,
}

impl AddOrInsertNote {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    /// Returns the id the note is stored under
    pub async fn call(&self, note: Note) -> StorageResult<i64> {
        run_blocking(&self.repository, move |repo| repo.insert(&note)).await
    }
}

/// Replace an existing note's title, content and bookmark flag
#[derive(Clone)]
pub struct UpdateNote {
    repository: Arc<dyn NoteRepository>,
}

impl UpdateNote {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    pub async fn call(&self, note: Note) -> StorageResult<()> {
        run_blocking(&self.repository, move |repo| repo.update(&note)).await
    }
}

/// Remove a note by id
#[derive(Clone)]
pub struct DeleteNote {
    repository: Arc<dyn NoteRepository>,
}

impl DeleteNote {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    pub async fn call(&self, id: i64) -> StorageResult<()> {
        run_blocking(&self.repository, move |repo| repo.delete(id)).await
    }
}

/// Subscribe to the full note list, oldest first
#[derive(Clone)]
pub struct GetAllNotes {
    repository: Arc<dyn NoteRepository>,
}

impl GetAllNotes {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    pub async fn call(&self) -> StorageResult<Subscription<Vec<Note>>> {
        run_blocking(&self.repository, |repo| repo.get_all_notes()).await
    }
}

/// Subscribe to a single note
#[derive(Clone)]
pub struct GetNoteById {
    repository: Arc<dyn NoteRepository>,
}

impl GetNoteById {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    pub async fn call(&self, id: i64) -> StorageResult<Subscription<Note>> {
        run_blocking(&self.repository, move |repo| repo.get_note_by_id(id)).await
    }
}

/// Subscribe to bookmarked notes, newest first
#[derive(Clone)]
pub struct GetBookmarkedNotes {
    repository: Arc<dyn NoteRepository>,
}

impl GetBookmarkedNotes {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    pub async fn call(&self) -> StorageResult<Subscription<Vec<Note>>> {
        run_blocking(&self.repository, |repo| repo.get_bookmarked_notes()).await
    }
}

/// All use cases, built over one repository
#[derive(Clone)]
pub struct UseCases {
    pub add_note: AddOrInsertNote,
    pub update_note: UpdateNote,
    pub delete_note: DeleteNote,
    pub get_all_notes: GetAllNotes,
    pub get_note_by_id: GetNoteById,
    pub get_bookmarked_notes: GetBookmarkedNotes,
}

impl UseCases {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self {
            add_note: AddOrInsertNote::new(Arc::clone(&repository)),
            update_note: UpdateNote::new(Arc::clone(&repository)),
            delete_note: DeleteNote::new(Arc::clone(&repository)),
            get_all_notes: GetAllNotes::new(Arc::clone(&repository)),
            get_note_by_id: GetNoteById::new(Arc::clone(&repository)),
            get_bookmarked_notes: GetBookmarkedNotes::new(repository),
        }
    }
}
