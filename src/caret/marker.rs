use super::{CaretLocator, CaretOffset, LayoutSnapshot, LocateRequest};

/// Uses the caret position the renderer tracked while laying out the
/// document. Coarser than cell geometry but needs nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct CursorMarkerLocator;

impl CaretLocator for CursorMarkerLocator {
    fn locate(&self, layout: &LayoutSnapshot, request: &LocateRequest) -> Option<CaretOffset> {
        request.range?;
        let cursor = layout.cursor?;
        Some(request.finish(cursor))
    }

    fn name(&self) -> &'static str {
        "cursor-marker"
    }
}
