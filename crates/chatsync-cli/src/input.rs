//! Composer state and key handling.
//!
//! Owns the text buffer and cursor. Character keys edit the buffer; Enter
//! hands the finished line back to the caller.

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// What a key did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The buffer text changed.
    Edited,
    /// Only the cursor moved, or nothing happened.
    Moved,
    /// A line was submitted; the buffer is now empty.
    Submitted(String),
    /// The user asked to quit.
    Quit,
}

/// Composer buffer.
///
/// The cursor is a char index, so multi-byte input edits correctly.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Current cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True while the buffer holds a slash command rather than a message.
    pub fn is_command(&self) -> bool {
        self.buffer.starts_with('/')
    }

    /// Handle a key input event.
    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                KeyOutcome::Edited
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return KeyOutcome::Moved;
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                KeyOutcome::Edited
            },
            KeyInput::Delete => {
                if self.cursor >= self.len() {
                    return KeyOutcome::Moved;
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                KeyOutcome::Edited
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                KeyOutcome::Moved
            },
            KeyInput::Right => {
                if self.cursor < self.len() {
                    self.cursor = self.cursor.saturating_add(1);
                }
                KeyOutcome::Moved
            },
            KeyInput::Home => {
                self.cursor = 0;
                KeyOutcome::Moved
            },
            KeyInput::End => {
                self.cursor = self.len();
                KeyOutcome::Moved
            },
            KeyInput::Enter => {
                self.cursor = 0;
                let line = std::mem::take(&mut self.buffer);
                if line.trim().is_empty() {
                    KeyOutcome::Moved
                } else {
                    KeyOutcome::Submitted(line)
                }
            },
            KeyInput::Esc => KeyOutcome::Quit,
        }
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(at, _)| at)
    }
}
