use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::caret::{BlockGeometry, CaretOffset, Cell, CellRect, LayoutSnapshot};
use crate::document::{Block, Document, Inline, TextPoint};
use crate::theme::Theme;

/// The renderer records a cell for every flattened position, so layouts it
/// produces always carry cell geometry.
pub const REPORTS_CELL_GEOMETRY: bool = true;

const TAB_WIDTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    pub layout: LayoutSnapshot,
}

pub fn render_document(
    document: &Document,
    width: usize,
    cursor: Option<TextPoint>,
    theme: &Theme,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), cursor, theme);
    renderer.render_document(document);
    renderer.finish()
}

/// Label drawn for a token. The surrounding padding makes the chip stand out
/// from adjacent text.
pub fn chip_label(name: &str) -> String {
    format!(" {name} ")
}

/// Cells needed for the widest of `labels`, never less than `placeholder`.
pub fn label_column_width(labels: &[String], placeholder: &str) -> usize {
    labels
        .iter()
        .map(|label| label.width())
        .max()
        .unwrap_or(0)
        .max(placeholder.width())
}

struct Renderer<'a> {
    wrap_width: usize,
    cursor_point: Option<TextPoint>,
    theme: &'a Theme,
    lines: Vec<Line<'static>>,
    blocks: Vec<BlockGeometry>,
    cursor: Option<CursorVisualPosition>,
}

impl<'a> Renderer<'a> {
    fn new(wrap_width: usize, cursor_point: Option<TextPoint>, theme: &'a Theme) -> Self {
        Self {
            wrap_width,
            cursor_point,
            theme,
            lines: Vec::new(),
            blocks: Vec::new(),
            cursor: None,
        }
    }

    fn render_document(&mut self, document: &Document) {
        for (idx, block) in document.blocks().iter().enumerate() {
            if idx > 0 {
                self.lines.push(Line::from(""));
            }
            self.render_block(idx, block);
        }
    }

    fn render_block(&mut self, index: usize, block: &Block) {
        let cursor_offset = self
            .cursor_point
            .filter(|point| point.block == index)
            .map(|point| point.offset);
        let fragments = collect_fragments(block, cursor_offset, self.theme);
        let first_line = self.lines.len();

        let mut cells: Vec<Option<Cell>> = vec![None; block.len()];
        for (line_offset, line) in wrap_fragments(&fragments, self.wrap_width)
            .into_iter()
            .enumerate()
        {
            let y = (first_line + line_offset) as i32;
            for placed in line.cells {
                if let Some(slot) = cells.get_mut(placed.offset) {
                    *slot = Some(Cell {
                        rect: CellRect::new(placed.column as i32, y, placed.width as i32, 1),
                        line_break: placed.line_break,
                    });
                }
            }
            let spans: Vec<Span<'static>> = line
                .segments
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect();
            self.lines.push(Line::from(spans));
        }

        let geometry = BlockGeometry {
            origin: CaretOffset::new(first_line as i32, 0),
            cells: cells.into_iter().flatten().collect(),
        };
        if let Some(offset) = cursor_offset {
            self.cursor = Some(cursor_position(&geometry, offset));
        }
        self.blocks.push(geometry);
    }

    fn finish(self) -> RenderResult {
        let total_lines = self.lines.len();
        let layout = LayoutSnapshot {
            blocks: self.blocks,
            cursor: self
                .cursor
                .map(|cursor| CaretOffset::new(cursor.line as i32, i32::from(cursor.column))),
        };
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
            layout,
        }
    }
}

/// Flattened position closest to a document-relative cell, for pointer
/// clicks. Clicking the right half of a cell places the caret after it.
pub fn point_at(layout: &LayoutSnapshot, line: usize, column: usize) -> Option<TextPoint> {
    let line = line as i32;
    let column = column as i32;
    for (index, block) in layout.blocks.iter().enumerate() {
        let mut line_end = None;
        let mut after_break = None;
        for (offset, cell) in block.cells.iter().enumerate() {
            if cell.line_break && cell.rect.bottom() == line {
                after_break = Some(offset + 1);
            }
            if cell.rect.y != line {
                continue;
            }
            if cell.line_break || column < cell.rect.x + (cell.rect.width + 1) / 2 {
                return Some(TextPoint::new(index, offset));
            }
            line_end = Some(offset + 1);
        }
        if let Some(offset) = line_end.or(after_break) {
            return Some(TextPoint::new(index, offset));
        }
        if block.cells.is_empty() && block.origin.top == line {
            return Some(TextPoint::new(index, 0));
        }
    }
    None
}

/// Where the terminal cursor goes for `offset`. A position starting a wrapped
/// line sits at that line's start, anything else right after the previous
/// cell.
fn cursor_position(geometry: &BlockGeometry, offset: usize) -> CursorVisualPosition {
    let at = |top: i32, left: i32| CursorVisualPosition {
        line: top.max(0) as usize,
        column: left.clamp(0, i32::from(u16::MAX)) as u16,
    };
    if let Some(next) = geometry.cells.get(offset) {
        if offset == 0 || next.rect.x == 0 {
            return at(next.rect.y, next.rect.x);
        }
    }
    match offset.checked_sub(1).and_then(|prev| geometry.cells.get(prev)) {
        Some(prev) if prev.line_break => at(prev.rect.bottom(), geometry.origin.left),
        Some(prev) => at(prev.rect.y, prev.rect.right()),
        None => at(geometry.origin.top, geometry.origin.left),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

/// A flattened position inside a fragment.
#[derive(Clone, Copy, Debug)]
struct FragmentCell {
    offset: usize,
    column: usize,
    width: usize,
}

#[derive(Clone, Debug)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    cells: Vec<FragmentCell>,
}

#[derive(Clone, Debug)]
enum FragmentItem {
    Text(Fragment),
    LineBreak(usize),
}

fn collect_fragments(block: &Block, cursor_offset: Option<usize>, theme: &Theme) -> Vec<FragmentItem> {
    let mut fragments = Vec::new();
    let mut offset = 0;
    for inline in block.inlines() {
        match inline {
            Inline::Text(text) => tokenize_text(text, offset, Style::default(), &mut fragments),
            Inline::Token(token) => {
                let text = chip_label(token.name());
                let width = visible_width(&text);
                let focused = cursor_offset == Some(offset);
                fragments.push(FragmentItem::Text(Fragment {
                    text,
                    style: theme.token_style(focused),
                    kind: FragmentKind::Word,
                    width,
                    cells: vec![FragmentCell {
                        offset,
                        column: 0,
                        width,
                    }],
                }));
            }
        }
        offset += inline.len();
    }
    fragments
}

fn tokenize_text(text: &str, base_offset: usize, style: Style, fragments: &mut Vec<FragmentItem>) {
    let mut builder: Option<FragmentBuilder> = None;
    for (idx, ch) in text.chars().enumerate() {
        let offset = base_offset + idx;
        if ch == '\n' {
            if let Some(fragment) = builder.take() {
                fragments.push(FragmentItem::Text(fragment.finish()));
            }
            fragments.push(FragmentItem::LineBreak(offset));
            continue;
        }

        let is_whitespace = ch.is_whitespace();
        if !builder
            .as_ref()
            .is_some_and(|existing| existing.kind_matches(is_whitespace))
        {
            if let Some(existing) = builder.take() {
                fragments.push(FragmentItem::Text(existing.finish()));
            }
            builder = Some(FragmentBuilder::new(style, is_whitespace));
        }
        if let Some(current) = builder.as_mut() {
            current.push_char(offset, ch);
        }
    }

    if let Some(fragment) = builder {
        fragments.push(FragmentItem::Text(fragment.finish()));
    }
}

struct FragmentBuilder {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    cells: Vec<FragmentCell>,
}

impl FragmentBuilder {
    fn new(style: Style, is_whitespace: bool) -> Self {
        Self {
            text: String::new(),
            style,
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            cells: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn push_char(&mut self, offset: usize, ch: char) {
        let width = if ch == '\t' {
            self.text.extend(std::iter::repeat_n(' ', TAB_WIDTH));
            TAB_WIDTH
        } else if ch.is_control() {
            0
        } else {
            self.text.push(ch);
            UnicodeWidthChar::width(ch).unwrap_or(0)
        };
        self.cells.push(FragmentCell {
            offset,
            column: self.width,
            width,
        });
        self.width += width;
    }

    fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            style: self.style,
            kind: self.kind,
            width: self.width,
            cells: self.cells,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PlacedCell {
    offset: usize,
    column: usize,
    width: usize,
    line_break: bool,
}

struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    segments: Vec<LineSegment>,
    cells: Vec<PlacedCell>,
}

fn wrap_fragments(fragments: &[FragmentItem], width: usize) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new();
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak(offset) => {
                builder.consume_pending(&mut pending_whitespace);
                builder.push_line_break(*offset);
                outputs.push(builder.build_line());
                builder = LineBuilder::new();
            }
            FragmentItem::Text(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.current_width() > 0
                        && builder.current_width() + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new();
                    }

                    builder.append_with_pending(token.clone(), &mut pending_whitespace);
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    cells: Vec<PlacedCell>,
    width: usize,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            cells: Vec::new(),
            width: 0,
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn append_with_pending(&mut self, token: Fragment, pending_whitespace: &mut Vec<Fragment>) {
        self.consume_pending(pending_whitespace);
        self.append_token(token);
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        for cell in &fragment.cells {
            self.cells.push(PlacedCell {
                offset: cell.offset,
                column: self.width + cell.column,
                width: cell.width,
                line_break: false,
            });
        }
        if !fragment.text.is_empty() {
            self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
            });
        }
        self.width += fragment.width;
    }

    fn push_line_break(&mut self, offset: usize) {
        self.cells.push(PlacedCell {
            offset,
            column: self.width,
            width: 0,
            line_break: true,
        });
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        LineOutput {
            segments: self.segments,
            cells: self.cells,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}
