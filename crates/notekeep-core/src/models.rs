//! Data models for notekeep
//!
//! Defines the `Note` record and the timestamp encoding used when it is
//! persisted. Notes are identified by a store-assigned integer id; a value
//! of `NEW_NOTE_ID` (or anything below it) means "not yet persisted".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id carried by notes that have not been written to the store yet
pub const NEW_NOTE_ID: i64 = 0;

/// A text note
///
/// Serializes as `{id, title, content, createdDate, isBookMarked}` with the
/// creation date encoded as epoch milliseconds, the shape served by the
/// remote notes endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned identifier (`NEW_NOTE_ID` until persisted)
    #[serde(default)]
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note body content
    pub content: String,
    /// When this note was created; never changes once stored
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_date: DateTime<Utc>,
    /// Whether the note shows up in the bookmarks view
    #[serde(rename = "isBookMarked", default)]
    pub is_bookmarked: bool,
}

impl Note {
    /// Create a new, unsaved note stamped with the current time
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: NEW_NOTE_ID,
            title: title.into(),
            content: content.into(),
            created_date: now_millis(),
            is_bookmarked: false,
        }
    }

    /// Create a note with a specific id and creation date (for loading from storage)
    pub fn with_id(
        id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            created_date: truncate_to_millis(created_date),
            is_bookmarked: false,
        }
    }

    /// Builder-style setter for the bookmark flag
    pub fn bookmarked(mut self, is_bookmarked: bool) -> Self {
        self.is_bookmarked = is_bookmarked;
        self
    }

    /// Whether the store has assigned this note an id
    pub fn is_persisted(&self) -> bool {
        self.id > NEW_NOTE_ID
    }

    /// Whether the note has both a title and content
    ///
    /// Incomplete notes are allowed in storage; editors use this to decide
    /// whether saving makes sense.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.content.is_empty()
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Update the content
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Copy of this note with the bookmark flag flipped
    pub fn toggled_bookmark(&self) -> Self {
        Self {
            is_bookmarked: !self.is_bookmarked,
            ..self.clone()
        }
    }
}

/// Encode a timestamp as epoch milliseconds
pub fn to_epoch_millis(date: &DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Decode epoch milliseconds; `None` if the value is out of chrono's range
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Current time at millisecond precision, so it survives a storage round trip
fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    from_epoch_millis(to_epoch_millis(&date)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_note_is_unsaved() {
        let note = Note::new("Groceries", "milk, eggs");
        assert_eq!(note.id, NEW_NOTE_ID);
        assert!(!note.is_persisted());
        assert!(!note.is_bookmarked);
        assert!(note.is_complete());
    }

    #[test]
    fn test_incomplete_note() {
        assert!(!Note::new("", "body only").is_complete());
        assert!(!Note::new("title only", "").is_complete());
    }

    #[test]
    fn test_negative_id_is_not_persisted() {
        let note = Note::with_id(-1, "t", "c", Utc::now());
        assert!(!note.is_persisted());
    }

    #[test]
    fn test_created_date_truncated_to_millis() {
        let note = Note::new("t", "c");
        let millis = to_epoch_millis(&note.created_date);
        assert_eq!(from_epoch_millis(millis), Some(note.created_date));
    }

    #[test]
    fn test_toggled_bookmark_keeps_identity() {
        let created = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let note = Note::with_id(7, "t", "c", created);

        let toggled = note.toggled_bookmark();
        assert!(toggled.is_bookmarked);
        assert_eq!(toggled.id, 7);
        assert_eq!(toggled.created_date, created);
        assert!(!toggled.toggled_bookmark().is_bookmarked);
    }

    #[test]
    fn test_json_shape() {
        let created = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let note = Note::with_id(3, "Title", "Body", created).bookmarked(true);

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["createdDate"], 1_700_000_000_123i64);
        assert_eq!(value["isBookMarked"], true);

        let parsed: Note = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, note);
    }

    #[test]
    fn test_json_defaults_for_missing_fields() {
        let json = r#"{"title": "a", "content": "b", "createdDate": 0}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id, NEW_NOTE_ID);
        assert!(!note.is_bookmarked);
    }
}
