use crate::document::OBJECT_REPLACEMENT;

pub const DEFAULT_TRIGGER: char = '/';

/// Placed directly before a trigger character, turns it into literal text.
pub const ESCAPE_CHAR: char = '\\';

/// An in-progress query: the trigger character plus whatever was typed
/// between it and the caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    trigger: char,
    trigger_offset: usize,
    caret: usize,
    term: String,
}

impl Query {
    /// Text after the trigger; this is what suggestions are filtered by.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The query as it appears in the document, trigger included.
    pub fn typed(&self) -> String {
        let mut typed = String::with_capacity(self.term.len() + self.trigger.len_utf8());
        typed.push(self.trigger);
        typed.push_str(&self.term);
        typed
    }

    /// Flattened positions between the trigger and the caret, trigger
    /// included.
    pub fn span_len(&self) -> usize {
        self.caret - self.trigger_offset
    }

    pub fn trigger_offset(&self) -> usize {
        self.trigger_offset
    }

    pub fn caret(&self) -> usize {
        self.caret
    }
}

/// Finds the query ending at `caret` in the flattened text of one block.
///
/// Only characters before the caret are considered. The nearest unescaped
/// trigger wins; the scan gives up at a token, since a query never reaches
/// across one.
pub fn detect_query(text: &str, caret: usize, trigger: char) -> Option<Query> {
    let before: Vec<char> = text.chars().take(caret).collect();
    let caret = before.len();

    let mut idx = caret;
    while idx > 0 {
        idx -= 1;
        let ch = before[idx];
        if ch == OBJECT_REPLACEMENT {
            return None;
        }
        if ch != trigger {
            continue;
        }
        if idx > 0 && before[idx - 1] == ESCAPE_CHAR {
            continue;
        }
        return Some(Query {
            trigger,
            trigger_offset: idx,
            caret,
            term: before[idx + 1..].iter().collect(),
        });
    }
    None
}
