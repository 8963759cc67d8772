use serde::{Deserialize, Serialize};

use crate::*;

/// A point in the pointer coordinate space the board is rendered in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle spanned by a pointer drag; the corners come in any order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub start: Point,
    pub end: Point,
}

impl SelectionRect {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Returns `(min, max)` corners.
    pub fn normalized(&self) -> (Point, Point) {
        (
            Point::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y)),
            Point::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y)),
        )
    }
}

/// Where the board sits in pointer space and how large each square cell is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardGeometry {
    pub cell_size: f64,
    pub origin: Point,
}

/// Inclusive rectangle of cells. Empty whenever a begin exceeds its end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub row_begin: Coord,
    pub row_end: Coord,
    pub col_begin: Coord,
    pub col_end: Coord,
}

impl CellRange {
    pub const EMPTY: Self = Self {
        row_begin: 1,
        row_end: 0,
        col_begin: 1,
        col_end: 0,
    };

    /// Range covering both corners, given in any order.
    pub fn spanning(a: Coord2, b: Coord2) -> Self {
        Self {
            row_begin: a.0.min(b.0),
            row_end: a.0.max(b.0),
            col_begin: a.1.min(b.1),
            col_end: a.1.max(b.1),
        }
    }

    pub fn single(coords: Coord2) -> Self {
        Self::spanning(coords, coords)
    }

    pub const fn is_empty(&self) -> bool {
        self.row_begin > self.row_end || self.col_begin > self.col_end
    }

    pub fn contains(&self, (row, column): Coord2) -> bool {
        !self.is_empty()
            && (self.row_begin..=self.row_end).contains(&row)
            && (self.col_begin..=self.col_end).contains(&column)
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (usize::from(self.row_end - self.row_begin) + 1)
                * (usize::from(self.col_end - self.col_begin) + 1)
        }
    }

    /// Cuts the range down to a board of `size`.
    pub fn clamped(&self, (rows, columns): Coord2) -> Self {
        if self.is_empty() || rows == 0 || columns == 0 {
            return Self::EMPTY;
        }
        if self.row_begin >= rows || self.col_begin >= columns {
            return Self::EMPTY;
        }
        Self {
            row_end: self.row_end.min(rows - 1),
            col_end: self.col_end.min(columns - 1),
            ..*self
        }
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Coord2> + use<> {
        let range = *self;
        let rows = if range.is_empty() {
            1..=0
        } else {
            range.row_begin..=range.row_end
        };
        rows.flat_map(move |row| (range.col_begin..=range.col_end).map(move |column| (row, column)))
    }
}

/// Maps a pointer-drag rectangle to the inclusive range of cells it touches.
///
/// The low edge of each axis is floored and the high edge ceiled minus one, so a drag ending exactly on a grid
/// line does not pick up the next cell. An axis without extent maps to the cell under the pointer. A rectangle
/// wholly off the board gives [`CellRange::EMPTY`].
pub fn map_selection_to_cells(
    rect: SelectionRect,
    cell_size: f64,
    origin: Point,
    rows: Coord,
    columns: Coord,
) -> CellRange {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        log::warn!("ignoring selection with invalid cell size {}", cell_size);
        return CellRange::EMPTY;
    }

    let (min, max) = rect.normalized();
    let row_span = axis_span(min.y - origin.y, max.y - origin.y, cell_size, rows);
    let col_span = axis_span(min.x - origin.x, max.x - origin.x, cell_size, columns);

    match (row_span, col_span) {
        (Some((row_begin, row_end)), Some((col_begin, col_end))) => CellRange {
            row_begin,
            row_end,
            col_begin,
            col_end,
        },
        _ => CellRange::EMPTY,
    }
}

fn axis_span(low: f64, high: f64, cell_size: f64, cells: Coord) -> Option<(Coord, Coord)> {
    if !(low.is_finite() && high.is_finite()) || cells == 0 {
        return None;
    }

    // Float-to-int casts saturate, which is enough for pixel math.
    let first = libm::floor(low / cell_size) as i64;
    let last = if high > low {
        libm::ceil(high / cell_size) as i64 - 1
    } else {
        first
    };

    let limit = i64::from(cells) - 1;
    if last < 0 || first > limit {
        return None;
    }

    // Both are within `0..=limit` after clamping, which fits `Coord`.
    Some((first.clamp(0, limit) as Coord, last.clamp(0, limit) as Coord))
}
