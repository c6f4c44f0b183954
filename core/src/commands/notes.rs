//! Note-related commands
//!
//! Sticky notes board operations and search.

use super::ignore_not_found;
use crate::app::AppState;
use crate::config::SEARCH_RESULT_LIMIT;
use crate::database::{CollectionKind, Note, NoteColor};
use crate::error::Result;

/// Create a new note on top of the board
pub async fn create_note(state: &AppState, content: &str, color: NoteColor) -> Result<Note> {
    let mut ws = state.workspace().await?;
    let note = ws.notes.add(content, color);
    state.persist(&ws, CollectionKind::Notes)?;
    Ok(note)
}

/// All notes, back to front
pub async fn list_notes(state: &AppState) -> Result<Vec<Note>> {
    let ws = state.workspace().await?;
    let mut notes = ws.notes.notes().to_vec();
    notes.sort_by_key(|n| n.z_index);
    Ok(notes)
}

pub async fn update_note(state: &AppState, id: &str, content: &str) -> Result<Option<Note>> {
    let mut ws = state.workspace().await?;
    let note = ignore_not_found(ws.notes.update_content(id, content))?;
    if note.is_some() {
        state.persist(&ws, CollectionKind::Notes)?;
    }
    Ok(note)
}

pub async fn toggle_note_minimized(state: &AppState, id: &str) -> Result<Option<Note>> {
    let mut ws = state.workspace().await?;
    let note = ignore_not_found(ws.notes.toggle_minimize(id))?;
    if note.is_some() {
        state.persist(&ws, CollectionKind::Notes)?;
    }
    Ok(note)
}

pub async fn bring_note_to_front(state: &AppState, id: &str) -> Result<Option<Note>> {
    let mut ws = state.workspace().await?;
    let note = ignore_not_found(ws.notes.bring_to_front(id))?;
    if note.is_some() {
        state.persist(&ws, CollectionKind::Notes)?;
    }
    Ok(note)
}

pub async fn delete_note(state: &AppState, id: &str) -> Result<bool> {
    let mut ws = state.workspace().await?;
    let deleted = ws.notes.remove(id);
    if deleted {
        state.persist(&ws, CollectionKind::Notes)?;
    } else {
        tracing::warn!("Note not found: {}, ignoring", id);
    }
    Ok(deleted)
}

/// Remove every note after confirmation
pub async fn clear_notes(state: &AppState) -> Result<usize> {
    state.confirm("Clear the whole board?").await?;

    let mut ws = state.workspace().await?;
    let count = ws.notes.clear_all();
    state.persist(&ws, CollectionKind::Notes)?;

    tracing::info!("Cleared {} notes", count);
    Ok(count)
}

/// Search notes by content
pub async fn search_notes(state: &AppState, query: &str) -> Result<Vec<Note>> {
    let ws = state.workspace().await?;
    Ok(ws
        .notes
        .search(query, SEARCH_RESULT_LIMIT)
        .into_iter()
        .cloned()
        .collect())
}
