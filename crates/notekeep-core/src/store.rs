//! Note store
//!
//! The `NoteStore` owns the SQLite connection and the registry of live
//! queries. It is opened once per process and shared by cloning the handle;
//! clones refer to the same connection.
//!
//! ## Writes and notification
//!
//! Each write runs in its own transaction while holding the connection lock.
//! After a commit that changed at least one row, every open subscription
//! re-runs its query before the lock is released, so subscribers only ever
//! see committed state and receive snapshots in commit order.
//!
//! ## Usage
//!
//! ```ignore
//! let store = NoteStore::open(&config)?;
//!
//! let mut all = store.observe_all()?;
//! let id = store.insert(&Note::new("Title", "Body"))?;
//!
//! // Current snapshot, then one per committed change
//! let notes = all.recv().await;
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::Note;
use crate::observe::{Observer, ObserverRegistry, QueryObserver, Subscription};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::notes;
use crate::storage::schema::{init_schema, needs_init};

/// Shared handle to the notes database
#[derive(Clone)]
pub struct NoteStore {
    conn: Arc<Mutex<Connection>>,
    observers: Arc<Mutex<ObserverRegistry>>,
    path: Option<PathBuf>,
}

impl NoteStore {
    /// Open the store described by the configuration
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(config.sqlite_path())
    }

    /// Open or create the database at `path`
    ///
    /// Creates the parent directory and schema as needed.
    pub fn open_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::from_create_dir(e, parent.to_path_buf()))?;
            }
        }

        let conn = Connection::open(&path)?;
        let store = Self::from_connection(conn, Some(path))?;
        info!(path = ?store.path, "Note store opened");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        match needs_init(&conn) {
            Ok(true) => init_schema(&conn)?,
            Ok(false) => {}
            Err(e) => return Err(classify_open_error(e, path.as_deref())),
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            observers: Arc::new(Mutex::new(ObserverRegistry::default())),
            path,
        })
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ==================== Live queries ====================

    /// All notes ordered by creation date, oldest first
    pub fn observe_all(&self) -> StorageResult<Subscription<Vec<Note>>> {
        self.subscribe(|conn| notes::get_all(conn).map(Some))
    }

    /// A single note; nothing is delivered while no row matches `id`
    pub fn observe_by_id(&self, id: i64) -> StorageResult<Subscription<Note>> {
        self.subscribe(move |conn| notes::get_by_id(conn, id))
    }

    /// Bookmarked notes ordered by creation date, newest first
    pub fn observe_bookmarked(&self) -> StorageResult<Subscription<Vec<Note>>> {
        self.subscribe(|conn| notes::get_bookmarked(conn).map(Some))
    }

    /// Register a query and deliver its current result
    ///
    /// Both locks are held while the initial result is computed, so no write
    /// can commit between the first snapshot and registration.
    fn subscribe<T, F>(&self, query: F) -> StorageResult<Subscription<T>>
    where
        T: Clone + PartialEq + Send + 'static,
        F: FnMut(&Connection) -> StorageResult<Option<T>> + Send + 'static,
    {
        let conn = self.lock_conn()?;
        let mut registry = self.lock_observers();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut observer = QueryObserver::new(query, tx);
        let id = registry.next_id();

        if observer.refresh(&conn) {
            registry.insert(id, Box::new(observer));
            debug!(observer = id, "Observer registered");
        }

        Ok(Subscription::new(id, rx, Arc::downgrade(&self.observers)))
    }

    // ==================== Writes ====================

    /// Insert a note, replacing any note with the same id
    ///
    /// Returns the note's id; unsaved notes receive a new one.
    pub fn insert(&self, note: &Note) -> StorageResult<i64> {
        let id = self.write(|conn| {
            let id = notes::insert_or_replace(conn, note)?;
            Ok((id, true))
        })?;
        debug!(id, "Note inserted");
        Ok(id)
    }

    /// Replace title, content and bookmark of an existing note
    ///
    /// Does nothing when no note has this id.
    pub fn update(&self, note: &Note) -> StorageResult<()> {
        let changed = self.write(|conn| {
            let changed = notes::update(conn, note)?;
            Ok((changed, changed > 0))
        })?;
        debug!(id = note.id, changed, "Note updated");
        Ok(())
    }

    /// Delete a note; does nothing when it does not exist
    pub fn delete(&self, id: i64) -> StorageResult<()> {
        let removed = self.write(|conn| {
            let removed = notes::delete(conn, id)?;
            Ok((removed, removed > 0))
        })?;
        debug!(id, removed, "Note deleted");
        Ok(())
    }

    /// Run a write in a transaction and notify observers if it changed data
    fn write<R>(
        &self,
        op: impl FnOnce(&Connection) -> StorageResult<(R, bool)>,
    ) -> StorageResult<R> {
        let mut conn = self.lock_conn()?;

        let tx = conn.transaction()?;
        let (result, changed) = op(&tx)?;
        tx.commit()?;

        if changed {
            self.lock_observers().notify(&conn);
        }
        Ok(result)
    }

    /// Re-run every open query against the current data
    pub fn refresh_observers(&self) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        self.lock_observers().notify(&conn);
        Ok(())
    }

    // ==================== Point reads ====================

    /// All notes, oldest first
    pub fn get_all(&self) -> StorageResult<Vec<Note>> {
        notes::get_all(&*self.lock_conn()?)
    }

    /// Bookmarked notes, newest first
    pub fn get_bookmarked(&self) -> StorageResult<Vec<Note>> {
        notes::get_bookmarked(&*self.lock_conn()?)
    }

    /// A note by id
    pub fn get_by_id(&self, id: i64) -> StorageResult<Option<Note>> {
        notes::get_by_id(&*self.lock_conn()?, id)
    }

    /// Number of stored notes
    pub fn note_count(&self) -> StorageResult<i64> {
        notes::count(&*self.lock_conn()?)
    }

    /// Number of open subscriptions
    pub fn observer_count(&self) -> usize {
        self.lock_observers().len()
    }

    // ==================== Locks ====================

    fn lock_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Worker("note store connection lock poisoned".to_string()))
    }

    fn lock_observers(&self) -> MutexGuard<'_, ObserverRegistry> {
        // The registry holds no invariants a panicking observer could break
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        f(&self.lock_conn().unwrap())
    }
}

/// Map a failure while inspecting a freshly opened file to a storage error
fn classify_open_error(error: rusqlite::Error, path: Option<&Path>) -> StorageError {
    match (&error, path) {
        (rusqlite::Error::SqliteFailure(e, _), Some(path))
            if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) =>
        {
            StorageError::CorruptDatabase {
                path: path.to_path_buf(),
                details: error.to_string(),
            }
        }
        _ => StorageError::Database(error),
    }
}
