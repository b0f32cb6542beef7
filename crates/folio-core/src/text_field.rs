//! Single-line query field with native editing behavior.
//!
//! While the field has focus it claims every key except Enter/OK: arrows move
//! the caret, and Backspace, Escape, Back and paging keys never reach menu
//! navigation or the focus ring.

use crate::navigation::RemoteKey;

/// What the field did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldResponse {
    /// The text changed.
    Edited,
    /// The key was used (caret move, no-op edit) without changing the text.
    Consumed,
    /// Enter/OK: submit the query.
    Submit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    /// Caret position in chars.
    cursor: usize,
    /// Whole contents selected; the next edit replaces them.
    selected: bool,
}

impl TextField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.selected = false;
    }

    pub fn select_all(&mut self) {
        self.selected = !self.text.is_empty();
        self.cursor = self.char_len();
    }

    pub fn handle(&mut self, key: RemoteKey) -> FieldResponse {
        match key {
            RemoteKey::Char(c) => {
                if self.selected {
                    self.clear();
                }
                let at = self.byte_offset(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
                FieldResponse::Edited
            }
            RemoteKey::Backspace => {
                if self.selected {
                    self.clear();
                    return FieldResponse::Edited;
                }
                if self.cursor == 0 {
                    return FieldResponse::Consumed;
                }
                let at = self.byte_offset(self.cursor - 1);
                self.text.remove(at);
                self.cursor -= 1;
                FieldResponse::Edited
            }
            RemoteKey::Left => {
                self.selected = false;
                self.cursor = self.cursor.saturating_sub(1);
                FieldResponse::Consumed
            }
            RemoteKey::Right => {
                self.selected = false;
                self.cursor = (self.cursor + 1).min(self.char_len());
                FieldResponse::Consumed
            }
            RemoteKey::Home | RemoteKey::Up => {
                self.selected = false;
                self.cursor = 0;
                FieldResponse::Consumed
            }
            RemoteKey::End | RemoteKey::Down => {
                self.selected = false;
                self.cursor = self.char_len();
                FieldResponse::Consumed
            }
            RemoteKey::Escape | RemoteKey::Back | RemoteKey::PageUp | RemoteKey::PageDown => {
                FieldResponse::Consumed
            }
            RemoteKey::Ok => FieldResponse::Submit,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}
