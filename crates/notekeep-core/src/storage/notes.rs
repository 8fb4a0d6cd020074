//! Row-level SQL for the notes table
//!
//! Plain functions over a `Connection`. `NoteStore` wraps them with locking,
//! transactions and change notification; nothing here notifies observers.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{from_epoch_millis, to_epoch_millis, Note};
use crate::storage::error::{StorageError, StorageResult};

const SELECT_NOTES: &str =
    "SELECT id, title, content, created_date, is_bookmarked FROM notes";

/// Raw row as stored, before timestamp decoding
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    created_date: i64,
    is_bookmarked: bool,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_date: row.get(3)?,
            is_bookmarked: row.get(4)?,
        })
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = StorageError;

    fn try_from(row: NoteRow) -> StorageResult<Self> {
        let created_date =
            from_epoch_millis(row.created_date).ok_or_else(|| StorageError::InvalidValue {
                column: "created_date",
                details: format!("{} is not a valid epoch millisecond value", row.created_date),
            })?;

        Ok(Note {
            id: row.id,
            title: row.title,
            content: row.content,
            created_date,
            is_bookmarked: row.is_bookmarked,
        })
    }
}

fn query_notes(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StorageResult<Vec<Note>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, NoteRow::from_row)?;

    let mut notes = Vec::new();
    for row in rows {
        notes.push(Note::try_from(row?)?);
    }
    Ok(notes)
}

/// All notes, oldest first
pub fn get_all(conn: &Connection) -> StorageResult<Vec<Note>> {
    query_notes(
        conn,
        &format!("{} ORDER BY created_date ASC, id ASC", SELECT_NOTES),
        [],
    )
}

/// Bookmarked notes, newest first
pub fn get_bookmarked(conn: &Connection) -> StorageResult<Vec<Note>> {
    query_notes(
        conn,
        &format!(
            "{} WHERE is_bookmarked = 1 ORDER BY created_date DESC, id DESC",
            SELECT_NOTES
        ),
        [],
    )
}

/// A single note by id
pub fn get_by_id(conn: &Connection, id: i64) -> StorageResult<Option<Note>> {
    let row = conn
        .prepare_cached(&format!("{} WHERE id = ?", SELECT_NOTES))?
        .query_row(params![id], NoteRow::from_row)
        .optional()?;

    row.map(Note::try_from).transpose()
}

/// Number of stored notes
pub fn count(conn: &Connection) -> StorageResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?)
}

/// Insert a note, replacing any row with the same id
///
/// Unsaved notes get a fresh id from SQLite. Returns the row id.
pub fn insert_or_replace(conn: &Connection, note: &Note) -> StorageResult<i64> {
    let created_date = to_epoch_millis(&note.created_date);

    if note.is_persisted() {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO notes (id, title, content, created_date, is_bookmarked)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                note.id,
                note.title,
                note.content,
                created_date,
                note.is_bookmarked
            ],
        )?;
        Ok(note.id)
    } else {
        conn.execute(
            r#"
            INSERT INTO notes (title, content, created_date, is_bookmarked)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![note.title, note.content, created_date, note.is_bookmarked],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Replace the mutable fields of an existing note
///
/// `created_date` is never rewritten. Returns the number of rows changed.
pub fn update(conn: &Connection, note: &Note) -> StorageResult<usize> {
    Ok(conn.execute(
        "UPDATE notes SET title = ?1, content = ?2, is_bookmarked = ?3 WHERE id = ?4",
        params![note.title, note.content, note.is_bookmarked, note.id],
    )?)
}

/// Delete a note by id. Returns the number of rows removed.
pub fn delete(conn: &Connection, id: i64) -> StorageResult<usize> {
    Ok(conn.execute("DELETE FROM notes WHERE id = ?", params![id])?)
}
