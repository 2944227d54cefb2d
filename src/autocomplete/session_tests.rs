use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::*;
use crate::caret::{BlockGeometry, Cell, CellGeometryLocator, CellRect, CursorMarkerLocator};
use crate::document::{Block, Document, Inline, TextPoint, Token};
use crate::editor::DocumentEditor;

fn settings(candidates: &[&str]) -> AutocompleteSettings {
    AutocompleteSettings {
        candidates: candidates.iter().map(|s| s.to_string()).collect(),
        ..AutocompleteSettings::default()
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Feeds characters the way the event loop does: session first, editor
/// second, then a change notification.
fn type_str(session: &mut AutocompleteSession, editor: &mut DocumentEditor, text: &str, now: Instant) {
    for ch in text.chars() {
        let outcome = session.handle_key(&key(KeyCode::Char(ch)), editor, now);
        assert_eq!(outcome, KeyOutcome::PassThrough);
        assert!(editor.insert_char(ch));
        session.on_change(editor, now);
    }
}

fn cursor_layout(top: i32, left: i32) -> LayoutSnapshot {
    LayoutSnapshot {
        blocks: Vec::new(),
        cursor: Some(CaretOffset::new(top, left)),
    }
}

#[test]
fn typing_trigger_and_query_filters_candidates() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();

    type_str(&mut session, &mut editor, "/co", now);

    assert!(session.is_active());
    let query = session.query().expect("query");
    assert_eq!(query.typed(), "/co");
    assert_eq!(query.term(), "co");
    assert_eq!(session.suggestions(), &["Cool Company".to_string()]);
    assert_eq!(session.selected_index(), Some(0));
}

#[test]
fn enter_commits_highlighted_suggestion() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "hi /co", now);

    let outcome = session.handle_key(&key(KeyCode::Enter), &mut editor, now);

    assert_eq!(outcome, KeyOutcome::Committed);
    assert!(!session.is_active());
    assert_eq!(
        editor.document().blocks()[0].inlines(),
        &[
            Inline::Text("hi ".to_string()),
            Inline::Token(Token::new("Cool Company")),
        ]
    );
    assert_eq!(editor.cursor(), TextPoint::new(0, 4));
}

#[test]
fn arrows_are_consumed_and_move_highlight() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Coca-Cola", "Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/c", now);
    assert_eq!(session.suggestions().len(), 2);

    assert_eq!(
        session.handle_key(&key(KeyCode::Down), &mut editor, now),
        KeyOutcome::Consumed
    );
    assert_eq!(session.selected_index(), Some(1));
    assert_eq!(
        session.handle_key(&key(KeyCode::Down), &mut editor, now),
        KeyOutcome::Consumed
    );
    assert_eq!(session.selected_index(), Some(0));
    assert_eq!(
        session.handle_key(&key(KeyCode::Up), &mut editor, now),
        KeyOutcome::Consumed
    );
    assert_eq!(session.selected_index(), Some(1));

    assert_eq!(
        session.handle_key(&key(KeyCode::Enter), &mut editor, now),
        KeyOutcome::Committed
    );
    assert_eq!(editor.token_at_cursor(), None);
    assert_eq!(editor.document().token_count(), 1);
    assert_eq!(
        editor.document().blocks()[0].tokens().next(),
        Some(&Token::new("Cool Company"))
    );
}

#[test]
fn navigation_keys_pass_through_when_inactive() {
    let now = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    assert_eq!(
        session.handle_key(&key(KeyCode::Enter), &mut editor, now),
        KeyOutcome::PassThrough
    );
    assert_eq!(
        session.handle_key(&key(KeyCode::Down), &mut editor, now),
        KeyOutcome::PassThrough
    );
}

#[test]
fn enter_with_no_matches_keeps_mode() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/zz", now);
    assert!(session.suggestions().is_empty());

    assert_eq!(
        session.handle_key(&key(KeyCode::Enter), &mut editor, now),
        KeyOutcome::Consumed
    );
    assert!(session.is_active());
    assert_eq!(editor.focus_text(), "/zz");
}

#[test]
fn deleting_the_trigger_deactivates() {
    let now = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/a", now);

    assert!(editor.backspace());
    session.on_change(&editor, now);
    assert!(session.is_active());
    assert_eq!(session.query().map(Query::typed), Some("/".to_string()));

    assert!(editor.backspace());
    session.on_change(&editor, now);
    assert!(!session.is_active());
    assert!(session.suggestions().is_empty());
}

#[test]
fn changed_query_resets_highlight() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Coca-Cola", "Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", now);
    session.handle_key(&key(KeyCode::Down), &mut editor, now);
    session.handle_key(&key(KeyCode::Down), &mut editor, now);
    assert_eq!(session.selected_index(), Some(2));

    type_str(&mut session, &mut editor, "c", now);
    assert_eq!(session.selected_index(), Some(0));
}

#[test]
fn caret_is_measured_after_layout() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);

    assert_eq!(session.phase(), PopupPhase::Positioning);
    assert!(!session.show_suggestions());
    assert_eq!(session.next_deadline(), Some(start));

    let outcome = session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(4, 1));
    assert!(outcome.changed);
    assert!(!outcome.edited);
    assert_eq!(session.anchor(), Some(CaretOffset::new(5, 1)));
    assert!(session.show_suggestions());
}

#[test]
fn anchor_stays_put_while_typing() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    let anchor = session.anchor();

    type_str(&mut session, &mut editor, "cool", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 5));
    assert_eq!(session.anchor(), anchor);
}

#[test]
fn failed_measurement_retries_on_next_change() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);

    session.run_due(start, &mut editor, &CursorMarkerLocator, &LayoutSnapshot::default());
    assert_eq!(session.phase(), PopupPhase::Positioning);

    type_str(&mut session, &mut editor, "c", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 2));
    assert_eq!(session.anchor(), Some(CaretOffset::new(1, 2)));
}

#[test]
fn cell_geometry_anchor_sits_below_trigger() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);

    let layout = LayoutSnapshot {
        blocks: vec![BlockGeometry {
            origin: CaretOffset::new(0, 0),
            cells: vec![Cell {
                rect: CellRect::new(0, 0, 1, 1),
                line_break: false,
            }],
        }],
        cursor: None,
    };
    session.run_due(start, &mut editor, &CellGeometryLocator::default(), &layout);
    assert_eq!(session.anchor(), Some(CaretOffset::new(1, 1)));
}

#[test]
fn blur_deactivates_after_delay() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));

    assert!(session.on_blur(start));
    let early = start + Duration::from_millis(50);
    session.run_due(early, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    assert!(session.is_active());

    let late = start + Duration::from_millis(100);
    let outcome = session.run_due(late, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    assert!(outcome.changed);
    assert!(!session.is_active());
}

#[test]
fn blur_while_inactive_is_ignored() {
    let mut session = AutocompleteSession::default();
    assert!(!session.on_blur(Instant::now()));
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn pointer_down_survives_blur_and_click_commits() {
    let start = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));

    assert!(session.pointer_down(1));
    assert!(session.on_blur(start));
    let later = start + Duration::from_millis(150);
    session.run_due(later, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    assert!(session.is_active());
    assert_eq!(session.selected_index(), Some(1));

    assert!(session.click(1, &mut editor));
    assert!(!session.is_active());
    assert_eq!(
        editor.document().blocks()[0].tokens().next(),
        Some(&Token::new("Forge"))
    );
}

#[test]
fn released_pointer_no_longer_suppresses_blur() {
    let start = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));

    assert!(session.pointer_down(0));
    session.pointer_up();

    let blur_at = start + Duration::from_secs(10);
    assert!(session.on_blur(blur_at));
    let outcome = session.run_due(
        blur_at + Duration::from_millis(200),
        &mut editor,
        &CursorMarkerLocator,
        &cursor_layout(0, 1),
    );
    assert!(outcome.changed);
    assert!(!session.is_active());
}

#[test]
fn release_during_pending_blur_lets_it_close() {
    let start = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", start);

    assert!(session.pointer_down(0));
    assert!(session.on_blur(start));
    session.pointer_up();

    let later = start + Duration::from_millis(150);
    session.run_due(later, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    assert!(!session.is_active());
    assert_eq!(editor.focus_text(), "/");
}

#[test]
fn click_outside_list_does_nothing() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Forge"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/", now);
    assert!(!session.click(3, &mut editor));
    assert!(session.is_active());
}

#[test]
fn programmatic_activation_types_trigger_later() {
    let start = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Cool Company", "Forge"]));
    let mut editor = DocumentEditor::default();

    session.activate_programmatically(start);
    assert!(session.is_active());
    assert_eq!(session.query(), None);
    assert_eq!(editor.focus_text(), "");

    // Nothing to measure before the trigger exists.
    session.run_due(start, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 0));
    assert_eq!(session.phase(), PopupPhase::Positioning);

    let due = start + Duration::from_millis(50);
    let outcome = session.run_due(due, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 0));
    assert!(outcome.edited);
    assert_eq!(editor.focus_text(), "/");
    assert_eq!(session.query().map(Query::typed), Some("/".to_string()));
    assert_eq!(session.suggestions().len(), 2);
    assert_eq!(session.anchor(), None);

    // The next frame has the caret after the inserted trigger.
    session.run_due(due, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 1));
    assert_eq!(session.anchor(), Some(CaretOffset::new(1, 1)));
}

#[test]
fn deactivation_cancels_pending_work() {
    let start = Instant::now();
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::default();

    session.activate_programmatically(start);
    session.deactivate("test");

    let due = start + Duration::from_secs(1);
    let outcome = session.run_due(due, &mut editor, &CursorMarkerLocator, &cursor_layout(0, 0));
    assert_eq!(outcome, DeferredOutcome::default());
    assert_eq!(editor.focus_text(), "");
}

#[test]
fn second_trigger_restarts_query() {
    let now = Instant::now();
    let mut session = AutocompleteSession::new(settings(&["Forge", "Cool Company"]));
    let mut editor = DocumentEditor::default();
    type_str(&mut session, &mut editor, "/x/fo", now);
    assert_eq!(session.query().map(Query::typed), Some("/fo".to_string()));
    assert_eq!(session.suggestions(), &["Forge".to_string()]);
}

#[test]
fn moving_into_other_block_deactivates() {
    let now = Instant::now();
    let document = Document::from_blocks(vec![Block::from_text("plain"), Block::new()]);
    let mut session = AutocompleteSession::default();
    let mut editor = DocumentEditor::new(document);
    assert!(editor.move_to(TextPoint::new(1, 0)));
    type_str(&mut session, &mut editor, "/", now);
    assert!(session.is_active());

    assert!(editor.move_block(-1));
    session.on_change(&editor, now);
    assert!(!session.is_active());
}
