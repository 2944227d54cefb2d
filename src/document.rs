//! Paragraph/inline document model.
//!
//! A [`Document`] is a list of paragraph [`Block`]s. Each block holds a run of
//! [`Inline`]s: plain text, or a void [`Token`]. Positions inside a block are
//! expressed in the *flattened* view, where every text character occupies one
//! position and every token occupies exactly one position (shown as
//! [`OBJECT_REPLACEMENT`] in [`Block::flattened_text`]).

pub mod convert;
pub mod schema;

/// Stand-in character for a token in the flattened text of a block.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// A committed suggestion. Immutable once created; the only way to get rid of
/// one is to delete the whole node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    name: String,
}

impl Token {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &'static str {
        schema::TOKEN_TYPE
    }

    /// Data payload in the `{"name":...}` shape used by the debug view.
    pub fn data_json(&self) -> String {
        serde_json::json!({ "name": self.name }).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Token(Token),
}

impl Inline {
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(text) => text.chars().count(),
            Inline::Token(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Inline::Token(token) if schema::is_void(token.node_type()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Atom {
    Char(char),
    Token(Token),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    inlines: Vec<Inline>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self::with_inlines(vec![Inline::Text(text.to_string())])
    }

    pub fn with_inlines(inlines: Vec<Inline>) -> Self {
        let mut block = Self { inlines };
        block.normalize();
        block
    }

    pub fn inlines(&self) -> &[Inline] {
        &self.inlines
    }

    /// Number of flattened positions in the block.
    pub fn len(&self) -> usize {
        self.inlines.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flattened_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            match inline {
                Inline::Text(text) => out.push_str(text),
                Inline::Token(_) => out.push(OBJECT_REPLACEMENT),
            }
        }
        out
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.inlines.iter().filter_map(|inline| match inline {
            Inline::Token(token) => Some(token),
            Inline::Text(_) => None,
        })
    }

    /// The token occupying flattened position `offset`, if any.
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        let mut position = 0;
        for inline in &self.inlines {
            let len = inline.len();
            if offset < position + len {
                return match inline {
                    Inline::Token(token) => Some(token),
                    Inline::Text(_) => None,
                };
            }
            position += len;
        }
        None
    }

    /// Inline structure as shown by the debug line: text verbatim, tokens as
    /// their data payload.
    pub fn describe(&self) -> String {
        self.inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text(text) => text.clone(),
                Inline::Token(token) => token.data_json(),
            })
            .collect()
    }

    pub(crate) fn insert_text(&mut self, offset: usize, text: &str) -> bool {
        if offset > self.len() {
            return false;
        }
        if text.is_empty() {
            return true;
        }
        let mut atoms = self.atoms();
        let inserted = text.chars().map(Atom::Char);
        atoms.splice(offset..offset, inserted);
        self.replace_atoms(atoms);
        true
    }

    pub(crate) fn insert_token(&mut self, offset: usize, token: Token) -> bool {
        if offset > self.len() {
            return false;
        }
        let mut atoms = self.atoms();
        atoms.insert(offset, Atom::Token(token));
        self.replace_atoms(atoms);
        true
    }

    /// Removes flattened positions `start..end`. A token inside the range is
    /// removed as a whole node.
    pub(crate) fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start > end || end > self.len() {
            return false;
        }
        if start == end {
            return true;
        }
        let mut atoms = self.atoms();
        atoms.drain(start..end);
        self.replace_atoms(atoms);
        true
    }

    pub(crate) fn split_off(&mut self, offset: usize) -> Block {
        let mut atoms = self.atoms();
        let offset = offset.min(atoms.len());
        let tail = atoms.split_off(offset);
        self.replace_atoms(atoms);
        let mut block = Block::new();
        block.replace_atoms(tail);
        block
    }

    pub(crate) fn append(&mut self, other: Block) {
        self.inlines.extend(other.inlines);
        self.normalize();
    }

    fn atoms(&self) -> Vec<Atom> {
        let mut atoms = Vec::with_capacity(self.len());
        for inline in &self.inlines {
            match inline {
                Inline::Text(text) => atoms.extend(text.chars().map(Atom::Char)),
                Inline::Token(token) => atoms.push(Atom::Token(token.clone())),
            }
        }
        atoms
    }

    fn replace_atoms(&mut self, atoms: Vec<Atom>) {
        let mut inlines = Vec::new();
        let mut text = String::new();
        for atom in atoms {
            match atom {
                Atom::Char(ch) => text.push(ch),
                Atom::Token(token) => {
                    if !text.is_empty() {
                        inlines.push(Inline::Text(std::mem::take(&mut text)));
                    }
                    inlines.push(Inline::Token(token));
                }
            }
        }
        if !text.is_empty() {
            inlines.push(Inline::Text(text));
        }
        self.inlines = inlines;
    }

    /// Merges adjacent text runs and drops empty ones.
    fn normalize(&mut self) {
        let mut merged: Vec<Inline> = Vec::with_capacity(self.inlines.len());
        for inline in self.inlines.drain(..) {
            match inline {
                Inline::Text(text) if text.is_empty() => {}
                Inline::Text(text) => {
                    if let Some(Inline::Text(previous)) = merged.last_mut() {
                        previous.push_str(&text);
                    } else {
                        merged.push(Inline::Text(text));
                    }
                }
                token @ Inline::Token(_) => merged.push(token),
            }
        }
        self.inlines = merged;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut document = Self { blocks };
        schema::ensure_document_initialized(&mut document);
        document
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn token_count(&self) -> usize {
        self.blocks.iter().map(|block| block.tokens().count()).sum()
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A position in the flattened view of one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPoint {
    pub block: usize,
    pub offset: usize,
}

impl TextPoint {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: TextPoint,
    pub focus: TextPoint,
}

impl Selection {
    pub fn collapsed(point: TextPoint) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The range inside the focus block. An anchor in another block collapses
    /// the range onto the focus.
    pub fn range(&self) -> SelectionRange {
        if self.anchor.block != self.focus.block {
            return SelectionRange::collapsed(self.focus);
        }
        let start = self.anchor.offset.min(self.focus.offset);
        let end = self.anchor.offset.max(self.focus.offset);
        SelectionRange {
            block: self.focus.block,
            start,
            end,
        }
    }
}

/// A contiguous range of flattened positions inside a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub block: usize,
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn collapsed(point: TextPoint) -> Self {
        Self {
            block: point.block,
            start: point.offset,
            end: point.offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_token() -> Block {
        Block::with_inlines(vec![
            Inline::Text("hi ".to_string()),
            Inline::Token(Token::new("World")),
            Inline::Text("!".to_string()),
        ])
    }

    #[test]
    fn token_counts_as_single_position() {
        let block = block_with_token();
        assert_eq!(block.len(), 5);
        assert_eq!(block.flattened_text(), format!("hi {OBJECT_REPLACEMENT}!"));
        assert_eq!(block.token_at(3).map(Token::name), Some("World"));
        assert!(block.token_at(2).is_none());
    }

    #[test]
    fn token_data_is_valid_json() {
        assert_eq!(Token::new("Forge").data_json(), r#"{"name":"Forge"}"#);

        let token = Token::new("a\u{1b}b \"quoted\"");
        let json = token.data_json();
        assert_eq!(json, r#"{"name":"a\u001bb \"quoted\""}"#);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["name"], token.name());
    }

    #[test]
    fn with_inlines_merges_and_prunes_text() {
        let block = Block::with_inlines(vec![
            Inline::Text("a".to_string()),
            Inline::Text(String::new()),
            Inline::Text("b".to_string()),
        ]);
        assert_eq!(block.inlines(), &[Inline::Text("ab".to_string())]);
    }

    #[test]
    fn delete_range_removes_token_as_whole_node() {
        let mut block = block_with_token();
        assert!(block.delete_range(2, 4));
        assert_eq!(block.inlines(), &[Inline::Text("hi!".to_string())]);
        assert_eq!(block.tokens().count(), 0);
    }

    #[test]
    fn delete_range_rejects_out_of_bounds() {
        let mut block = Block::from_text("abc");
        assert!(!block.delete_range(1, 9));
        assert_eq!(block.flattened_text(), "abc");
    }

    #[test]
    fn insert_token_splits_text_run() {
        let mut block = Block::from_text("ab");
        assert!(block.insert_token(1, Token::new("X")));
        assert_eq!(
            block.inlines(),
            &[
                Inline::Text("a".to_string()),
                Inline::Token(Token::new("X")),
                Inline::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn split_off_and_append_restore_block() {
        let mut block = block_with_token();
        let original = block.clone();
        let tail = block.split_off(4);
        assert_eq!(tail.flattened_text(), "!");
        block.append(tail);
        assert_eq!(block, original);
    }

    #[test]
    fn describe_renders_token_data() {
        assert_eq!(block_with_token().describe(), "hi {\"name\":\"World\"}!");
    }

    #[test]
    fn selection_range_orders_offsets() {
        let selection = Selection {
            anchor: TextPoint::new(0, 5),
            focus: TextPoint::new(0, 2),
        };
        let range = selection.range();
        assert_eq!((range.start, range.end), (2, 5));
        assert!(!range.is_collapsed());
    }

    #[test]
    fn new_document_has_one_empty_paragraph() {
        let document = Document::new();
        assert_eq!(document.blocks().len(), 1);
        assert!(document.blocks()[0].is_empty());
        assert_eq!(Document::from_blocks(Vec::new()), document);
    }
}
