use tracing::debug;

use super::query::detect_query;
use crate::document::Token;
use crate::editor::{EditCommand, TextEngine};

/// Replaces the trigger and the typed query in front of the caret with a
/// token named `suggestion`, leaving the caret right after the token.
///
/// Nothing happens when no query can be extracted at the caret any more.
pub fn commit_token<E>(engine: &mut E, suggestion: &str, trigger: char) -> bool
where
    E: TextEngine + ?Sized,
{
    let Some(query) = detect_query(&engine.focus_text(), engine.focus_offset(), trigger) else {
        debug!(suggestion, "commit skipped, no query at caret");
        return false;
    };

    let committed = engine.apply(vec![
        EditCommand::DeleteBackward(query.span_len()),
        EditCommand::InsertInline(Token::new(suggestion)),
        EditCommand::MoveForward,
    ]);
    debug!(
        suggestion,
        query = %query.typed(),
        committed,
        "committed token"
    );
    committed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document, Inline, TextPoint};
    use crate::editor::DocumentEditor;

    fn editor_at_end(text: &str) -> DocumentEditor {
        let document = Document::from_blocks(vec![Block::from_text(text)]);
        let mut editor = DocumentEditor::new(document);
        assert!(editor.move_to(TextPoint::new(0, text.chars().count())));
        editor
    }

    #[test]
    fn replaces_query_with_token() {
        let mut editor = editor_at_end("hello /wor");

        assert!(commit_token(&mut editor, "World", '/'));

        let block = &editor.document().blocks()[0];
        assert_eq!(
            block.inlines(),
            &[
                Inline::Text("hello ".to_string()),
                Inline::Token(Token::new("World")),
            ]
        );
        assert_eq!(editor.cursor(), TextPoint::new(0, 7));
    }

    #[test]
    fn removes_exactly_the_query_positions() {
        let mut editor = editor_at_end("ab /wor");
        assert!(editor.move_to(TextPoint::new(0, 7)));
        assert!(commit_token(&mut editor, "World", '/'));
        assert_eq!(editor.focus_text().chars().count(), "ab ".len() + 1);
        assert!(editor.focus_text().starts_with("ab "));
    }

    #[test]
    fn keeps_text_after_caret() {
        let mut editor = editor_at_end("x /co tail");
        assert!(editor.move_to(TextPoint::new(0, 5)));

        assert!(commit_token(&mut editor, "Cool Company", '/'));

        let block = &editor.document().blocks()[0];
        assert_eq!(
            block.inlines(),
            &[
                Inline::Text("x ".to_string()),
                Inline::Token(Token::new("Cool Company")),
                Inline::Text(" tail".to_string()),
            ]
        );
        assert_eq!(editor.cursor(), TextPoint::new(0, 3));
    }

    #[test]
    fn without_query_nothing_changes() {
        let mut editor = editor_at_end("hello world");
        let before = editor.document().clone();
        assert!(!commit_token(&mut editor, "World", '/'));
        assert_eq!(editor.document(), &before);
    }

    #[test]
    fn bare_trigger_becomes_token() {
        let mut editor = editor_at_end("/");
        assert!(commit_token(&mut editor, "Forge", '/'));
        assert_eq!(editor.document().token_count(), 1);
        assert_eq!(editor.focus_text().chars().count(), 1);
        assert_eq!(editor.cursor(), TextPoint::new(0, 1));
    }
}
