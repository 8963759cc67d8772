use clearbomb_core::{BoardGeometry, CellRange, Coord, Point, SelectionRect, map_selection_to_cells};

/// Pointer drag in progress. Purely local: nothing here touches the board.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SelectionTracker {
    drag: Option<SelectionRect>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new drag at `point`, dropping any unfinished one.
    pub fn begin(&mut self, point: Point) {
        self.drag = Some(SelectionRect::new(point, point));
    }

    /// Moves the free corner. Ignored when no drag is in progress.
    pub fn update(&mut self, point: Point) {
        if let Some(drag) = &mut self.drag {
            drag.end = point;
        }
    }

    /// Finishes the drag at `point` and hands back the rectangle.
    pub fn end(&mut self, point: Point) -> Option<SelectionRect> {
        self.update(point);
        self.drag.take()
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }

    pub fn current(&self) -> Option<SelectionRect> {
        self.drag
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Cells under the current drag, for highlighting.
    pub fn cells(&self, geometry: BoardGeometry, rows: Coord, columns: Coord) -> CellRange {
        self.drag.map_or(CellRange::EMPTY, |rect| {
            map_selection_to_cells(rect, geometry.cell_size, geometry.origin, rows, columns)
        })
    }
}
