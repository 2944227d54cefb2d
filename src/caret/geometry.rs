use super::{CaretLocator, CaretOffset, CursorMarkerLocator, LayoutSnapshot, LocateRequest};

/// Measures the cells a selection range covers.
///
/// The range start is pulled back by one position so there is always a
/// glyph to measure; the caret then sits on that glyph's right edge. Two
/// places have no such glyph and are handled apart:
///
/// * an empty range at the very start of a block resolves to the block
///   origin;
/// * right after a hard line break the glyph before the caret belongs to the
///   previous line, so the range is widened to the block start and the
///   caret goes to the bottom edge, at the block's left edge.
///
/// Layouts without cell geometry fall back to the renderer's cursor.
#[derive(Clone, Copy, Debug, Default)]
pub struct CellGeometryLocator {
    fallback: CursorMarkerLocator,
}

impl CaretLocator for CellGeometryLocator {
    fn locate(&self, layout: &LayoutSnapshot, request: &LocateRequest) -> Option<CaretOffset> {
        let range = request.range?;
        if !layout.has_cell_geometry() {
            return self.fallback.locate(layout, request);
        }
        let block = layout.block(range.block)?;

        let end = range.end.min(block.cells.len());
        // At the block start there is nothing to pull back into.
        let start = range.start.min(end).saturating_sub(1);

        let position = match block.bounding_rect(start, end) {
            None => block.origin,
            Some(_) if block.is_line_break(end - 1) => {
                let expanded = block.bounding_rect(0, end)?;
                CaretOffset::new(expanded.bottom(), block.origin.left)
            }
            Some(rect) => CaretOffset::new(rect.y, rect.right()),
        };
        Some(request.finish(position))
    }

    fn name(&self) -> &'static str {
        "cell-geometry"
    }
}
