// Screen geometry of the grid: cell rectangles, cell centers, and the
// pointer -> continuous grid index mapping used while dragging.

use crate::grid::{GridCoord, GridRect, GridSize};

/// A rectangle in screen units (terminal cells for the TUI).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        ScreenRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Uniform cell layout of a grid inside a screen area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    area: ScreenRect,
    size: GridSize,
    spacing: f64,
    cell_width: f64,
    cell_height: f64,
}

impl GridGeometry {
    /// Split `area` into `size` equal cells separated by `spacing`.
    pub fn new(area: ScreenRect, size: GridSize, spacing: f64) -> Self {
        let cell = |extent: f64, count: usize| {
            if count == 0 {
                return extent.max(0.0);
            }
            let gaps = spacing * (count - 1) as f64;
            ((extent - gaps) / count as f64).max(0.0)
        };
        GridGeometry {
            area,
            size,
            spacing,
            cell_width: cell(area.width, size.cols),
            cell_height: cell(area.height, size.rows),
        }
    }

    pub fn area(&self) -> ScreenRect {
        self.area
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    /// Distance between the left edges of adjacent columns.
    pub fn col_pitch(&self) -> f64 {
        self.cell_width + self.spacing
    }

    /// Distance between the top edges of adjacent rows.
    pub fn row_pitch(&self) -> f64 {
        self.cell_height + self.spacing
    }

    /// Screen rectangle covered by `rect`, spacing between its own cells
    /// included. `rect` may extend past the grid (affordance cells).
    pub fn bounds_of(&self, rect: &GridRect) -> ScreenRect {
        let x = self.area.x + rect.col as f64 * self.col_pitch();
        let y = self.area.y + rect.row as f64 * self.row_pitch();
        let width = rect.col_span as f64 * self.col_pitch() - self.spacing;
        let height = rect.row_span as f64 * self.row_pitch() - self.spacing;
        ScreenRect::new(x, y, width.max(0.0), height.max(0.0))
    }

    /// X coordinate of every column center.
    pub fn col_centers(&self) -> Vec<f64> {
        (0..self.size.cols)
            .map(|c| self.area.x + c as f64 * self.col_pitch() + self.cell_width / 2.0)
            .collect()
    }

    /// Y coordinate of every row center.
    pub fn row_centers(&self) -> Vec<f64> {
        (0..self.size.rows)
            .map(|r| self.area.y + r as f64 * self.row_pitch() + self.cell_height / 2.0)
            .collect()
    }

    /// Continuous `(row, col)` index of a screen point.
    pub fn continuous_index(&self, x: f64, y: f64) -> (f64, f64) {
        (
            interpolate_index(y, &self.row_centers()),
            interpolate_index(x, &self.col_centers()),
        )
    }

    /// The cell under a screen point, including cells one step past the
    /// grid edge. Gaps between cells hit nothing.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<GridCoord> {
        if x < self.area.x || y < self.area.y || self.col_pitch() <= 0.0 || self.row_pitch() <= 0.0 {
            return None;
        }
        let col = ((x - self.area.x) / self.col_pitch()).floor() as usize;
        let row = ((y - self.area.y) / self.row_pitch()).floor() as usize;
        if col > self.size.cols || row > self.size.rows {
            return None;
        }
        let cell = self.bounds_of(&GridRect::unit(row, col));
        cell.contains(x, y).then_some(GridCoord::new(row, col))
    }
}

/// Map a position onto a continuous index along a list of ascending cell
/// centers: linear between adjacent centers, clamped to `[0, len - 1]`.
pub fn interpolate_index(pos: f64, centers: &[f64]) -> f64 {
    let (Some(first), Some(last)) = (centers.first(), centers.last()) else {
        return 0.0;
    };
    if pos <= *first {
        return 0.0;
    }
    if pos >= *last {
        return (centers.len() - 1) as f64;
    }
    for (i, pair) in centers.windows(2).enumerate() {
        let (lo, hi) = (pair[0], pair[1]);
        if pos < hi {
            let width = hi - lo;
            if width <= 0.0 {
                return i as f64;
            }
            return i as f64 + (pos - lo) / width;
        }
    }
    (centers.len() - 1) as f64
}
