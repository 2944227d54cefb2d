//! Caret locating.
//!
//! Finding where the caret sits on screen is best-effort: the answer depends
//! on how the renderer wrapped the text and on what geometry it chose to
//! report. Two strategies exist, mirroring the two kinds of information a
//! layout may offer:
//!
//! * [`CellGeometryLocator`] measures the cells covered by a selection range
//!   (with special handling for block and line starts).
//! * [`CursorMarkerLocator`] trusts the caret position the renderer tracked
//!   itself.
//!
//! One of them is picked once at startup with [`select_locator`].

use serde::{Deserialize, Serialize};

use crate::document::SelectionRange;

mod geometry;
mod marker;

pub use geometry::CellGeometryLocator;
pub use marker::CursorMarkerLocator;

/// Document-relative position in cells: `top` is the rendered line, `left`
/// the column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaretOffset {
    pub top: i32,
    pub left: i32,
}

impl CaretOffset {
    pub const fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CellRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn union(&self, other: &CellRect) -> CellRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        CellRect::new(x, y, right - x, bottom - y)
    }
}

/// Rendered geometry of one flattened position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub rect: CellRect,
    pub line_break: bool,
}

/// Where the renderer put each position of one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockGeometry {
    pub origin: CaretOffset,
    pub cells: Vec<Cell>,
}

impl BlockGeometry {
    /// Smallest rectangle covering positions `start..end`, or `None` for an
    /// empty range.
    pub fn bounding_rect(&self, start: usize, end: usize) -> Option<CellRect> {
        let end = end.min(self.cells.len());
        let start = start.min(end);
        self.cells[start..end]
            .iter()
            .map(|cell| cell.rect)
            .reduce(|acc, rect| acc.union(&rect))
    }

    pub fn is_line_break(&self, offset: usize) -> bool {
        self.cells.get(offset).is_some_and(|cell| cell.line_break)
    }
}

/// Geometry reported by a render pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub blocks: Vec<BlockGeometry>,
    pub cursor: Option<CaretOffset>,
}

impl LayoutSnapshot {
    pub fn block(&self, index: usize) -> Option<&BlockGeometry> {
        self.blocks.get(index)
    }

    pub fn has_cell_geometry(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocateRequest {
    pub range: Option<SelectionRange>,
    /// Subtracted from the result, to make it relative to another element.
    pub reference: Option<CaretOffset>,
    /// Added to the result.
    pub offset: CaretOffset,
}

impl LocateRequest {
    pub fn new(range: Option<SelectionRange>) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: CaretOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_reference(mut self, reference: CaretOffset) -> Self {
        self.reference = Some(reference);
        self
    }

    fn finish(&self, position: CaretOffset) -> CaretOffset {
        let reference = self.reference.unwrap_or_default();
        CaretOffset {
            top: position.top + self.offset.top - reference.top,
            left: position.left + self.offset.left - reference.left,
        }
    }
}

pub trait CaretLocator {
    /// `None` when there is no selection to anchor to.
    fn locate(&self, layout: &LayoutSnapshot, request: &LocateRequest) -> Option<CaretOffset>;

    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorChoice {
    #[default]
    Auto,
    CellGeometry,
    CursorMarker,
}

/// Picks the locator for the session. `Auto` prefers cell geometry when the
/// renderer reports it.
pub fn select_locator(choice: LocatorChoice, renderer_reports_cells: bool) -> Box<dyn CaretLocator> {
    match choice {
        LocatorChoice::CellGeometry => Box::new(CellGeometryLocator::default()),
        LocatorChoice::CursorMarker => Box::new(CursorMarkerLocator),
        LocatorChoice::Auto if renderer_reports_cells => Box::new(CellGeometryLocator::default()),
        LocatorChoice::Auto => Box::new(CursorMarkerLocator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both_rects() {
        let a = CellRect::new(2, 0, 1, 1);
        let b = CellRect::new(0, 1, 3, 1);
        assert_eq!(a.union(&b), CellRect::new(0, 0, 3, 2));
    }

    #[test]
    fn bounding_rect_of_empty_range_is_none() {
        let block = BlockGeometry::default();
        assert_eq!(block.bounding_rect(0, 0), None);
    }

    #[test]
    fn request_applies_offset_and_reference() {
        let request = LocateRequest::new(None)
            .with_offset(CaretOffset::new(1, 2))
            .with_reference(CaretOffset::new(3, 4));
        assert_eq!(request.finish(CaretOffset::new(10, 10)), CaretOffset::new(8, 8));
    }

    #[test]
    fn auto_selection_depends_on_renderer() {
        assert_eq!(select_locator(LocatorChoice::Auto, true).name(), "cell-geometry");
        assert_eq!(select_locator(LocatorChoice::Auto, false).name(), "cursor-marker");
        assert_eq!(
            select_locator(LocatorChoice::CursorMarker, true).name(),
            "cursor-marker"
        );
    }
}
