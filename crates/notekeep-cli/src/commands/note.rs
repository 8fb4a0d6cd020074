//! Note command handlers

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use notekeep_core::{AppContainer, Note, Subscription};

use crate::editor::{confirm, edit_content};
use crate::output::Output;

/// How long `edit` waits for the editor form to load the stored note
const EDITOR_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new note
pub async fn add(
    app: &AppContainer,
    title: String,
    content: Option<String>,
    bookmark: bool,
    output: &Output,
) -> Result<()> {
    let content = match content {
        Some(c) => c,
        None => edit_content(&title, "")?,
    };

    let editor = app.detail_view_model(None);
    editor.on_title_change(title.trim());
    editor.on_content_change(content);
    editor.on_bookmark_change(bookmark);

    if !editor.is_form_not_blank() {
        bail!("Note title and content cannot be empty");
    }

    let id = editor
        .add_or_update_note()
        .await
        .context("Save task failed")?
        .context("Failed to save note")?;

    output.success(&format!("Created note {}", id));
    output.print_note(&editor.state().to_note())
}

/// List all notes, oldest first
pub async fn list(app: &AppContainer, output: &Output) -> Result<()> {
    let mut subscription = app
        .use_cases()
        .get_all_notes
        .call()
        .await
        .context("Failed to query notes")?;
    let notes = first_snapshot(&mut subscription)?.unwrap_or_default();
    output.print_notes(&notes)
}

/// List bookmarked notes, newest first
pub async fn bookmarks(app: &AppContainer, output: &Output) -> Result<()> {
    let mut subscription = app
        .use_cases()
        .get_bookmarked_notes
        .call()
        .await
        .context("Failed to query bookmarks")?;
    let notes = first_snapshot(&mut subscription)?.unwrap_or_default();
    output.print_notes(&notes)
}

/// Show a single note
pub async fn show(app: &AppContainer, id: i64, output: &Output) -> Result<()> {
    let note = find_note(app, id).await?;
    output.print_note(&note)
}

/// Edit a note's title and content
///
/// With neither `title` nor `content` given, the content is opened in $EDITOR.
pub async fn edit(
    app: &AppContainer,
    id: i64,
    title: Option<String>,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    let note = find_note(app, id).await?;

    let editor = app.detail_view_model(Some(id));
    let mut rx = editor.subscribe();
    tokio::time::timeout(
        EDITOR_LOAD_TIMEOUT,
        rx.wait_for(|s| s.id == id || s.error.is_some()),
    )
    .await
    .map_err(|_| anyhow!("Timed out loading note {}", id))?
    .map(|_| ())
    .context("Editor closed while loading")?;
    if let Some(error) = editor.state().error {
        bail!("Failed to load note {}: {}", id, error);
    }

    let content = match (&title, content) {
        (None, None) => Some(edit_content(&note.title, &note.content)?),
        (_, content) => content,
    };
    if let Some(title) = title {
        editor.on_title_change(title.trim());
    }
    if let Some(content) = content {
        editor.on_content_change(content);
    }

    if editor.state().to_note() == note {
        output.message("No changes made.");
        return Ok(());
    }
    if !editor.is_form_not_blank() {
        bail!("Note title and content cannot be empty");
    }

    editor
        .add_or_update_note()
        .await
        .context("Save task failed")?
        .context("Failed to save note")?;

    output.success(&format!("Updated note {}", id));
    output.print_note(&editor.state().to_note())
}

/// Toggle a note's bookmark
pub async fn toggle_bookmark(app: &AppContainer, id: i64, output: &Output) -> Result<()> {
    let note = find_note(app, id).await?;
    let toggled = note.toggled_bookmark();
    let now_bookmarked = toggled.is_bookmarked;

    app.use_cases()
        .update_note
        .call(toggled)
        .await
        .context("Failed to update bookmark")?;

    if now_bookmarked {
        output.success(&format!("Bookmarked note {}", id));
    } else {
        output.success(&format!("Removed bookmark from note {}", id));
    }
    Ok(())
}

/// Delete a note
pub async fn delete(app: &AppContainer, id: i64, yes: bool, output: &Output) -> Result<()> {
    let note = find_note(app, id).await?;

    if output.should_prompt() && !yes {
        println!("Delete note: {} - {}", note.id, note.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    app.use_cases()
        .delete_note
        .call(id)
        .await
        .context("Failed to delete note")?;

    output.success(&format!("Deleted note {}", id));
    Ok(())
}

/// Current value of a note, or an error if it does not exist
async fn find_note(app: &AppContainer, id: i64) -> Result<Note> {
    let mut subscription = app
        .use_cases()
        .get_note_by_id
        .call(id)
        .await
        .context("Failed to query note")?;
    first_snapshot(&mut subscription)?.ok_or_else(|| anyhow!("Note not found: {}", id))
}

/// The snapshot delivered when the subscription was opened
///
/// `None` for a point lookup with no matching row.
fn first_snapshot<T>(subscription: &mut Subscription<T>) -> Result<Option<T>> {
    match subscription.try_recv() {
        Some(Ok(value)) => Ok(Some(value)),
        Some(Err(e)) => Err(e).context("Query failed"),
        None => Ok(None),
    }
}
