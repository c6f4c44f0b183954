//! Sticky notes board
//!
//! Holds one user's notes in memory. Z-order is a plain integer per note;
//! the frontmost note has the highest `z_index`.

use crate::clock::IdGenerator;
use crate::config::{NOTE_DEFAULT_SIZE, NOTE_SPAWN_MIN, NOTE_SPAWN_SPREAD};
use crate::database::{Note, NoteColor};
use crate::error::{AppError, Result};
use rand::Rng;
use std::sync::Arc;

pub struct NoteBoard {
    notes: Vec<Note>,
    ids: Arc<dyn IdGenerator>,
}

impl NoteBoard {
    pub fn new(notes: Vec<Note>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { notes, ids }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn top_z(&self) -> i64 {
        self.notes.iter().map(|n| n.z_index).max().unwrap_or(0)
    }

    /// Drop a new note on top of the stack at a random offset
    pub fn add(&mut self, content: &str, color: NoteColor) -> Note {
        let mut rng = rand::thread_rng();
        let note = Note {
            id: self.ids.next_id(),
            content: content.to_string(),
            x: NOTE_SPAWN_MIN + rng.gen_range(0.0..NOTE_SPAWN_SPREAD),
            y: NOTE_SPAWN_MIN + rng.gen_range(0.0..NOTE_SPAWN_SPREAD),
            width: NOTE_DEFAULT_SIZE,
            height: NOTE_DEFAULT_SIZE,
            color,
            z_index: self.top_z() + 1,
            is_minimized: false,
        };

        tracing::debug!("Added note {} at z {}", note.id, note.z_index);
        self.notes.push(note.clone());
        note
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    pub fn update_content(&mut self, id: &str, content: &str) -> Result<Note> {
        let note = self.find_mut(id)?;
        note.content = content.to_string();
        Ok(note.clone())
    }

    pub fn toggle_minimize(&mut self, id: &str) -> Result<Note> {
        let note = self.find_mut(id)?;
        note.is_minimized = !note.is_minimized;
        Ok(note.clone())
    }

    /// Raise a note above every other one. A note already on top keeps its z.
    pub fn bring_to_front(&mut self, id: &str) -> Result<Note> {
        let top = self.top_z();
        let note = self.find_mut(id)?;
        if note.z_index < top {
            note.z_index = top + 1;
        }
        Ok(note.clone())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        self.notes.len() != before
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.notes.len();
        self.notes.clear();
        count
    }

    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    /// Case-insensitive content match, at most `limit` hits
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Note> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SequentialIds;

    fn create_test_board() -> NoteBoard {
        NoteBoard::new(Vec::new(), Arc::new(SequentialIds::new("note")))
    }

    #[test]
    fn test_add_stacks_on_top() {
        let mut board = create_test_board();

        let first = board.add("first", NoteColor::Yellow);
        let second = board.add("second", NoteColor::Pink);

        assert_eq!(first.z_index, 1);
        assert_eq!(second.z_index, 2);
        assert_eq!(second.width, NOTE_DEFAULT_SIZE);
        for note in board.notes() {
            assert!(note.x >= NOTE_SPAWN_MIN && note.x < NOTE_SPAWN_MIN + NOTE_SPAWN_SPREAD);
            assert!(note.y >= NOTE_SPAWN_MIN && note.y < NOTE_SPAWN_MIN + NOTE_SPAWN_SPREAD);
        }
    }

    #[test]
    fn test_bring_to_front() {
        let mut board = create_test_board();
        let first = board.add("first", NoteColor::Yellow);
        board.add("second", NoteColor::Blue);

        let raised = board.bring_to_front(&first.id).unwrap();
        assert_eq!(raised.z_index, 3);

        // Already on top: unchanged
        let again = board.bring_to_front(&first.id).unwrap();
        assert_eq!(again.z_index, 3);
    }

    #[test]
    fn test_update_and_minimize() {
        let mut board = create_test_board();
        let note = board.add("", NoteColor::Green);

        board.update_content(&note.id, "groceries").unwrap();
        let minimized = board.toggle_minimize(&note.id).unwrap();

        assert_eq!(minimized.content, "groceries");
        assert!(minimized.is_minimized);
        assert!(board.update_content("missing", "x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut board = create_test_board();
        let note = board.add("a", NoteColor::Yellow);
        board.add("b", NoteColor::Yellow);

        assert!(board.remove(&note.id));
        assert!(!board.remove(&note.id));
        assert_eq!(board.clear_all(), 1);
        assert!(board.notes().is_empty());
    }

    #[test]
    fn test_search_notes() {
        let mut board = create_test_board();
        board.add("Apple pie", NoteColor::Yellow);
        board.add("Banana bread", NoteColor::Yellow);
        board.add("Cherry", NoteColor::Yellow);

        let results = board.search("AN", 5);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Banana bread");
        assert!(board.search("  ", 5).is_empty());
    }
}
