use tracing::trace;

use crate::document::{Document, Selection, SelectionRange, TextPoint, Token};

/// High-level mutation issued against the editing engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditCommand {
    /// Remove `n` flattened positions before the caret.
    DeleteBackward(usize),
    /// Insert a void inline at the caret. The caret rests on the new node's
    /// leading edge afterwards.
    InsertInline(Token),
    /// Step the caret one position forward.
    MoveForward,
    InsertText(String),
    Focus,
}

/// What the autocomplete core needs from an editing engine.
pub trait TextEngine {
    /// Flattened text of the block holding the caret.
    fn focus_text(&self) -> String;

    /// Caret offset inside [`TextEngine::focus_text`].
    fn focus_offset(&self) -> usize;

    fn selection_range(&self) -> Option<SelectionRange>;

    fn is_focused(&self) -> bool;

    /// Applies a batch of commands atomically: if any command fails the
    /// document and selection are left as they were.
    fn apply(&mut self, commands: Vec<EditCommand>) -> bool;
}

#[derive(Clone, Debug)]
pub struct DocumentEditor {
    document: Document,
    selection: Selection,
    focused: bool,
}

impl DocumentEditor {
    pub fn new(document: Document) -> Self {
        let mut editor = Self {
            document,
            selection: Selection::default(),
            focused: true,
        };
        editor.clamp_selection();
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn cursor(&self) -> TextPoint {
        self.selection.focus
    }

    pub fn move_to(&mut self, point: TextPoint) -> bool {
        let Some(block) = self.document.block(point.block) else {
            return false;
        };
        if point.offset > block.len() {
            return false;
        }
        self.selection = Selection::collapsed(point);
        true
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// The token the caret currently rests on, if any.
    pub fn token_at_cursor(&self) -> Option<&Token> {
        let cursor = self.cursor();
        self.document.block(cursor.block)?.token_at(cursor.offset)
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut buffer = [0u8; 4];
        self.insert_text(ch.encode_utf8(&mut buffer))
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        let cursor = self.cursor();
        let Some(block) = self.document.block_mut(cursor.block) else {
            return false;
        };
        if !block.insert_text(cursor.offset, text) {
            return false;
        }
        self.selection = Selection::collapsed(TextPoint::new(
            cursor.block,
            cursor.offset + text.chars().count(),
        ));
        true
    }

    pub fn insert_inline(&mut self, token: Token) -> bool {
        let cursor = self.cursor();
        let Some(block) = self.document.block_mut(cursor.block) else {
            return false;
        };
        block.insert_token(cursor.offset, token)
    }

    /// Deletes `count` positions before the caret without leaving the block.
    pub fn delete_backward(&mut self, count: usize) -> bool {
        let cursor = self.cursor();
        if count > cursor.offset {
            return false;
        }
        let Some(block) = self.document.block_mut(cursor.block) else {
            return false;
        };
        let start = cursor.offset - count;
        if !block.delete_range(start, cursor.offset) {
            return false;
        }
        self.selection = Selection::collapsed(TextPoint::new(cursor.block, start));
        true
    }

    pub fn backspace(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor.offset > 0 {
            return self.delete_backward(1);
        }
        if cursor.block == 0 {
            return false;
        }
        let blocks = self.document.blocks_mut();
        let current = blocks.remove(cursor.block);
        let previous = &mut blocks[cursor.block - 1];
        let join_offset = previous.len();
        previous.append(current);
        self.selection = Selection::collapsed(TextPoint::new(cursor.block - 1, join_offset));
        true
    }

    pub fn delete(&mut self) -> bool {
        let cursor = self.cursor();
        let block_len = self.current_block_len();
        if cursor.offset < block_len {
            let Some(block) = self.document.block_mut(cursor.block) else {
                return false;
            };
            return block.delete_range(cursor.offset, cursor.offset + 1);
        }
        let blocks = self.document.blocks_mut();
        if cursor.block + 1 >= blocks.len() {
            return false;
        }
        let next = blocks.remove(cursor.block + 1);
        blocks[cursor.block].append(next);
        true
    }

    pub fn insert_paragraph_break(&mut self) -> bool {
        let cursor = self.cursor();
        let Some(block) = self.document.block_mut(cursor.block) else {
            return false;
        };
        let tail = block.split_off(cursor.offset);
        self.document.blocks_mut().insert(cursor.block + 1, tail);
        self.selection = Selection::collapsed(TextPoint::new(cursor.block + 1, 0));
        true
    }

    pub fn move_forward(&mut self) -> bool {
        self.move_right()
    }

    pub fn move_left(&mut self) -> bool {
        let cursor = self.cursor();
        let target = if cursor.offset > 0 {
            TextPoint::new(cursor.block, cursor.offset - 1)
        } else if cursor.block > 0 {
            let previous_len = self.block_len(cursor.block - 1);
            TextPoint::new(cursor.block - 1, previous_len)
        } else {
            return false;
        };
        self.selection = Selection::collapsed(target);
        true
    }

    pub fn move_right(&mut self) -> bool {
        let cursor = self.cursor();
        let target = if cursor.offset < self.current_block_len() {
            TextPoint::new(cursor.block, cursor.offset + 1)
        } else if cursor.block + 1 < self.document.blocks().len() {
            TextPoint::new(cursor.block + 1, 0)
        } else {
            return false;
        };
        self.selection = Selection::collapsed(target);
        true
    }

    pub fn move_to_block_start(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor.offset == 0 {
            return false;
        }
        self.selection = Selection::collapsed(TextPoint::new(cursor.block, 0));
        true
    }

    pub fn move_to_block_end(&mut self) -> bool {
        let cursor = self.cursor();
        let len = self.current_block_len();
        if cursor.offset == len {
            return false;
        }
        self.selection = Selection::collapsed(TextPoint::new(cursor.block, len));
        true
    }

    /// Moves to the neighbouring block, keeping the offset where possible.
    pub fn move_block(&mut self, delta: i32) -> bool {
        let cursor = self.cursor();
        let target = cursor.block as i64 + i64::from(delta);
        if target < 0 || target >= self.document.blocks().len() as i64 {
            return false;
        }
        let block = target as usize;
        let offset = cursor.offset.min(self.block_len(block));
        self.selection = Selection::collapsed(TextPoint::new(block, offset));
        true
    }

    fn current_block_len(&self) -> usize {
        self.block_len(self.cursor().block)
    }

    fn block_len(&self, index: usize) -> usize {
        self.document.block(index).map(|block| block.len()).unwrap_or(0)
    }

    fn clamp_selection(&mut self) {
        let last_block = self.document.blocks().len().saturating_sub(1);
        let clamp = |point: TextPoint, document: &Document| {
            let block = point.block.min(last_block);
            let len = document.block(block).map(|b| b.len()).unwrap_or(0);
            TextPoint::new(block, point.offset.min(len))
        };
        self.selection = Selection {
            anchor: clamp(self.selection.anchor, &self.document),
            focus: clamp(self.selection.focus, &self.document),
        };
    }

    fn apply_command(&mut self, command: EditCommand) -> bool {
        let applied = match command {
            EditCommand::DeleteBackward(count) => self.delete_backward(count),
            EditCommand::InsertInline(token) => self.insert_inline(token),
            EditCommand::MoveForward => self.move_forward(),
            EditCommand::InsertText(text) => self.insert_text(&text),
            EditCommand::Focus => {
                self.focus();
                true
            }
        };
        self.clamp_selection();
        applied
    }
}

impl TextEngine for DocumentEditor {
    fn focus_text(&self) -> String {
        self.document
            .block(self.cursor().block)
            .map(|block| block.flattened_text())
            .unwrap_or_default()
    }

    fn focus_offset(&self) -> usize {
        self.cursor().offset
    }

    fn selection_range(&self) -> Option<SelectionRange> {
        self.document.block(self.selection.focus.block)?;
        Some(self.selection.range())
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn apply(&mut self, commands: Vec<EditCommand>) -> bool {
        let snapshot = (self.document.clone(), self.selection, self.focused);
        for command in commands {
            trace!(?command, "applying edit command");
            if !self.apply_command(command) {
                (self.document, self.selection, self.focused) = snapshot;
                return false;
            }
        }
        true
    }
}

impl Default for DocumentEditor {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
