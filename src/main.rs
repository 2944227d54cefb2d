use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use slashpad::autocomplete::{AutocompleteSession, KeyOutcome};
use slashpad::caret::{CaretLocator, LayoutSnapshot, select_locator};
use slashpad::config::Config;
use slashpad::document::{Document, convert};
use slashpad::editor::DocumentEditor;
use slashpad::render::{
    CursorVisualPosition, REPORTS_CELL_GEOMETRY, label_column_width, point_at, render_document,
};
use slashpad::theme::Theme;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const POPUP_MIN_WIDTH: u16 = 16;
const NO_MATCHES: &str = "No matches";

/// Terminal rich-text editor with slash-triggered tokens
#[derive(Parser)]
#[command(name = "slashpad")]
#[command(version)]
struct Args {
    /// FTML document to edit (created on first save)
    file: Option<PathBuf>,

    /// Configuration file (defaults to <config dir>/slashpad/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file; without it nothing is logged
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    run()
}

fn init_logging(log_file: Option<&Path>, level: &str) -> Result<()> {
    // The terminal owns stdout and stderr while the editor runs.
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("slashpad={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn editor_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 60 {
        let wrap_width = width.saturating_sub(1).max(1);
        return (wrap_width, 0);
    }
    if width < 100 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let left_padding = (width.saturating_sub(100) / 2 + 4).min(width.saturating_sub(1) / 2);
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let (config, config_path) =
        Config::discover(args.config.as_deref()).context("failed to load configuration")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        "slashpad starting"
    );

    let (document, initial_status) = load_document(args.file.as_deref())?;
    let mut app = App::new(document, args.file, &config, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn load_document(path: Option<&Path>) -> Result<(Document, Option<String>)> {
    let Some(path) = path else {
        return Ok((Document::new(), None));
    };
    if !path.exists() {
        return Ok((Document::new(), Some("New document".to_string())));
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match convert::parse_ftml(&content) {
        Ok(document) => Ok((document, None)),
        Err(err) => {
            warn!(%err, path = %path.display(), "could not parse document");
            let message = format!("Parse error: {err}. Starting with empty document.");
            Ok((Document::new(), Some(message)))
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        // Deferred work runs against the layout of the frame just drawn.
        if app.run_deferred(Instant::now()) {
            needs_redraw = true;
            continue;
        }

        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if let Some(deadline) = app.next_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt, Instant::now());
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

/// Where the suggestion list was drawn, for pointer hit testing.
#[derive(Clone, Copy, Debug)]
struct PopupHit {
    list_area: Rect,
    offset: usize,
    len: usize,
}

struct App {
    editor: DocumentEditor,
    session: AutocompleteSession,
    locator: Box<dyn CaretLocator>,
    theme: Theme,
    file_path: Option<PathBuf>,
    max_visible: usize,
    scroll_top: usize,
    should_quit: bool,
    dirty: bool,
    show_debug: bool,
    status_message: Option<(String, Instant)>,
    layout: LayoutSnapshot,
    text_area: Rect,
    popup_hit: Option<PopupHit>,
    pressed_suggestion: Option<usize>,
}

impl App {
    fn new(
        document: Document,
        path: Option<PathBuf>,
        config: &Config,
        initial_status: Option<String>,
    ) -> Self {
        let locator = select_locator(config.caret_locator, REPORTS_CELL_GEOMETRY);
        debug!(locator = locator.name(), "caret locator selected");

        Self {
            editor: DocumentEditor::new(document),
            session: AutocompleteSession::new(config.autocomplete_settings()),
            locator,
            theme: Theme::new(),
            file_path: path,
            max_visible: config.popup.max_visible.max(1),
            scroll_top: 0,
            should_quit: false,
            dirty: false,
            show_debug: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            layout: LayoutSnapshot::default(),
            text_area: Rect::default(),
            popup_hit: None,
            pressed_suggestion: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    fn run_deferred(&mut self, now: Instant) -> bool {
        let outcome =
            self.session
                .run_due(now, &mut self.editor, self.locator.as_ref(), &self.layout);
        if outcome.edited {
            self.mark_dirty();
        }
        outcome.changed
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let debug_height = if self.show_debug { 1 } else { 0 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(debug_height),
                Constraint::Length(1),
            ])
            .split(area);
        let editor_area = vertical[0];
        let debug_area = vertical[1];
        let status_area = vertical[2];

        let (wrap_width, left_padding) = editor_wrap_configuration(editor_area.width as usize);
        let text_area = Rect::new(
            editor_area.x + left_padding as u16,
            editor_area.y,
            (wrap_width as u16).min(editor_area.width),
            editor_area.height,
        );
        self.text_area = text_area;

        let render = render_document(
            self.editor.document(),
            wrap_width,
            Some(self.editor.cursor()),
            &self.theme,
        );
        let viewport_height = text_area.height as usize;
        self.adjust_scroll(render.cursor, render.total_lines, viewport_height);

        let paragraph = Paragraph::new(Text::from(render.lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        if let Some(cursor) = render.cursor {
            if cursor.line >= self.scroll_top
                && cursor.line < self.scroll_top + viewport_height
                && text_area.width > 0
            {
                let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
                let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }
        self.layout = render.layout;

        if self.show_debug {
            let debug_line = Line::from(Span::styled(self.debug_text(), self.theme.debug_style()));
            frame.render_widget(Paragraph::new(debug_line), debug_area);
        }

        let status_line = self.status_line(status_area.width as usize);
        let status_widget = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::NONE))
            .style(self.theme.status_bar_style());
        frame.render_widget(status_widget, status_area);

        self.popup_hit = None;
        if self.session.show_suggestions() {
            self.render_suggestions(frame, editor_area);
        }
    }

    fn render_suggestions(&mut self, frame: &mut Frame, area: Rect) {
        let Some(anchor) = self.session.anchor() else {
            return;
        };
        if area.width < 3 || area.height < 3 {
            return;
        }

        let suggestions = self.session.suggestions();
        let label_width = label_column_width(suggestions, NO_MATCHES) as u16;
        let rows = suggestions.len().clamp(1, self.max_visible) as u16;
        let width = (label_width + 4).max(POPUP_MIN_WIDTH).min(area.width);
        let height = (rows + 2).min(area.height);

        let anchor_x = i32::from(self.text_area.x) + anchor.left;
        let mut anchor_y = i32::from(self.text_area.y) + anchor.top - self.scroll_top as i32;
        // No room below: flip above the caret line.
        if anchor_y + i32::from(height) > i32::from(area.bottom()) {
            anchor_y -= i32::from(height) + 1;
        }
        let max_x = i32::from(area.right().saturating_sub(width));
        let max_y = i32::from(area.bottom().saturating_sub(height));
        let popup_area = Rect::new(
            anchor_x.clamp(i32::from(area.x), max_x.max(i32::from(area.x))) as u16,
            anchor_y.clamp(i32::from(area.y), max_y.max(i32::from(area.y))) as u16,
            width,
            height,
        );

        frame.render_widget(Clear, popup_area);

        let popup_style = self.theme.menu_style();
        let items: Vec<ListItem> = if suggestions.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                NO_MATCHES,
                self.theme.menu_disabled_style(),
            )))]
        } else {
            suggestions
                .iter()
                .map(|label| ListItem::new(Line::from(label.clone())))
                .collect()
        };

        let mut state = ListState::default();
        if !suggestions.is_empty() {
            state.select(self.session.selected_index());
        }

        let title = self
            .session
            .query()
            .map(|query| format!(" {} ", query.typed()))
            .unwrap_or_default();
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(popup_style)
            .border_style(self.theme.menu_disabled_style());
        let list_area = block.inner(popup_area);
        let list = List::new(items)
            .highlight_style(
                self.theme
                    .menu_selected_style()
                    .add_modifier(Modifier::BOLD),
            )
            .style(popup_style)
            .block(block);

        frame.render_stateful_widget(list, popup_area, &mut state);
        self.popup_hit = Some(PopupHit {
            list_area,
            offset: state.offset(),
            len: suggestions.len(),
        });
    }

    fn suggestion_at(&self, column: u16, row: u16) -> Option<usize> {
        let hit = self.popup_hit?;
        if !hit.list_area.contains(Position::new(column, row)) {
            return None;
        }
        let index = hit.offset + (row - hit.list_area.y) as usize;
        (index < hit.len).then_some(index)
    }

    fn status_line(&mut self, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        let position = self.cursor_position_text();
        if let Some((message, _)) = &self.status_message {
            return Line::from(vec![
                Span::raw(format!("{} ", position)),
                Span::raw(message.clone()),
            ]);
        }

        let filename = self
            .file_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "[unnamed]".to_string());
        let marker = if self.dirty { "*" } else { "" };

        let mut spans = vec![
            Span::raw(position),
            Span::raw(" "),
            Span::styled(format!("{filename}{marker}"), self.theme.filename_style()),
            Span::raw(format!(
                ", {} tokens",
                self.editor.document().token_count()
            )),
        ];
        if let Some(query) = self.session.query() {
            spans.push(Span::raw(format!(" [{}]", query.typed())));
        } else if self.session.is_active() {
            spans.push(Span::raw(" [...]"));
        }

        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();

        // Least important first; dropped from the front when space runs out.
        let all_shortcuts = ["F2:Insert", "^D:Debug", "^S:Save", "^Q:Quit"];
        let mut shortcuts_to_show = Vec::new();
        let mut shortcuts_width = 0;
        for shortcut in all_shortcuts.iter().rev() {
            let test_width = if shortcuts_to_show.is_empty() {
                shortcut.chars().count()
            } else {
                shortcuts_width + 1 + shortcut.chars().count()
            };
            if left_width + 1 + test_width > terminal_width {
                break;
            }
            shortcuts_to_show.insert(0, *shortcut);
            shortcuts_width = test_width;
        }

        if !shortcuts_to_show.is_empty() {
            let padding = terminal_width
                .saturating_sub(left_width)
                .saturating_sub(shortcuts_width)
                .max(1);
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::raw(shortcuts_to_show.join(" ")));
        }

        Line::from(spans)
    }

    fn debug_text(&self) -> String {
        self.editor
            .document()
            .block(0)
            .map(|block| block.describe())
            .unwrap_or_default()
    }

    fn cursor_position_text(&self) -> String {
        let cursor = self.editor.cursor();
        format!("{}:{}", cursor.block + 1, cursor.offset + 1)
    }

    fn prune_status_message(&mut self) {
        let expired = self
            .status_message
            .as_ref()
            .is_some_and(|(_, instant)| instant.elapsed() > STATUS_TIMEOUT);
        if expired {
            self.status_message = None;
        }
    }

    fn adjust_scroll(
        &mut self,
        cursor: Option<CursorVisualPosition>,
        total_lines: usize,
        viewport_height: usize,
    ) {
        let viewport = viewport_height.max(1);
        let max_scroll = total_lines.saturating_sub(viewport);
        if let Some(cursor) = cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = cursor.line + 1 - viewport;
            }
        }
        self.scroll_top = self.scroll_top.min(max_scroll);
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(
                key @ KeyEvent {
                    kind: KeyEventKind::Press,
                    ..
                },
            ) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse, now),
            Event::FocusLost => {
                if !self.session.on_blur(now) {
                    self.editor.blur();
                }
            }
            Event::FocusGained => self.editor.focus(),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match self.session.handle_key(&key, &mut self.editor, now) {
            KeyOutcome::Consumed => return,
            KeyOutcome::Committed => {
                self.mark_dirty();
                return;
            }
            KeyOutcome::PassThrough => {}
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let edited = match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                false
            }
            KeyCode::Char('s') if ctrl => {
                self.save();
                false
            }
            KeyCode::Char('d') if ctrl => {
                self.show_debug = !self.show_debug;
                false
            }
            KeyCode::Char('j') if ctrl => self.editor.insert_char('\n'),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.editor.insert_char('\n')
            }
            KeyCode::F(2) => {
                // The trigger is typed later by the session; no query exists yet.
                self.session.activate_programmatically(now);
                return;
            }
            KeyCode::Enter => self.editor.insert_paragraph_break(),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Tab => self.editor.insert_char('\t'),
            KeyCode::Left => {
                self.editor.move_left();
                false
            }
            KeyCode::Right => {
                self.editor.move_right();
                false
            }
            KeyCode::Up => {
                self.editor.move_block(-1);
                false
            }
            KeyCode::Down => {
                self.editor.move_block(1);
                false
            }
            KeyCode::Home => {
                self.editor.move_to_block_start();
                false
            }
            KeyCode::End => {
                self.editor.move_to_block_end();
                false
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.editor.insert_char(ch)
            }
            _ => false,
        };

        if edited {
            self.mark_dirty();
        }
        self.session.on_change(&self.editor, now);
    }

    fn handle_mouse_event(&mut self, event: MouseEvent, now: Instant) {
        let hit = self.suggestion_at(event.column, event.row);
        match event.kind {
            MouseEventKind::Moved => {
                if let Some(index) = hit {
                    self.session.hover(index);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = hit {
                    self.session.pointer_down(index);
                    self.pressed_suggestion = Some(index);
                    return;
                }
                self.pressed_suggestion = None;
                self.move_cursor_to_pointer(event.column, event.row, now);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.session.pointer_up();
                let pressed = self.pressed_suggestion.take();
                if let Some(index) = hit.filter(|index| pressed == Some(*index)) {
                    if self.session.click(index, &mut self.editor) {
                        self.mark_dirty();
                    }
                }
            }
            _ => {}
        }
    }

    fn move_cursor_to_pointer(&mut self, column: u16, row: u16, now: Instant) {
        let area = self.text_area;
        if !area.contains(Position::new(column, row)) {
            return;
        }
        let line = self.scroll_top + (row - area.y) as usize;
        let column = (column - area.x) as usize;
        if let Some(point) = point_at(&self.layout, line, column) {
            if self.editor.move_to(point) {
                self.session.on_change(&self.editor, now);
            }
        }
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn save(&mut self) {
        let message = match self.write_document() {
            Ok(()) => {
                self.dirty = false;
                "Saved".to_string()
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "save failed");
                format!("Save failed: {err:#}")
            }
        };
        self.status_message = Some((message, Instant::now()));
    }

    fn write_document(&self) -> Result<()> {
        let path = self
            .file_path
            .as_ref()
            .context("no file name given on the command line")?;
        let contents =
            convert::write_ftml(self.editor.document()).context("failed to render FTML")?;
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "document saved");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
