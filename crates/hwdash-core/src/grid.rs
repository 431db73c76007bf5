// Occupancy grid: the authoritative cell -> card ownership map.
//
// Cards own their rects; the grid only stores card ids. Every mutation
// validates before it writes, so a rejected operation never leaves a partial
// change in the cell map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest row or column extent a layout may declare. Layout files are hand
/// edited; anything beyond this is rejected at parse time.
pub const MAX_GRID_EXTENT: usize = 256;

// ---------------------------------------------------------------------------
// Identifiers and coordinates
// ---------------------------------------------------------------------------

/// Stable identity of a card for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single grid cell. Rows grow downward, columns grow rightward.
///
/// Ordering is row-major, which is also the placement scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub fn new(row: usize, col: usize) -> Self {
        GridCoord { row, col }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub fn new(rows: usize, cols: usize) -> Self {
        GridSize { rows, cols }
    }

    /// True when the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// The smallest size that covers both `self` and `rect`.
    pub fn covering(&self, rect: &GridRect) -> GridSize {
        GridSize {
            rows: self.rows.max(rect.end_row()),
            cols: self.cols.max(rect.end_col()),
        }
    }

    /// The smallest size that covers both sizes.
    pub fn union(&self, other: GridSize) -> GridSize {
        GridSize {
            rows: self.rows.max(other.rows),
            cols: self.cols.max(other.cols),
        }
    }

    /// Whether `rect` lies entirely inside `[0, rows) x [0, cols)`.
    pub fn contains(&self, rect: &GridRect) -> bool {
        rect.has_area() && rect.end_row() <= self.rows && rect.end_col() <= self.cols
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// A rectangle of cells: `[row, row + row_span) x [col, col + col_span)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl GridRect {
    pub fn new(row: usize, col: usize, row_span: usize, col_span: usize) -> Self {
        GridRect {
            row,
            col,
            row_span,
            col_span,
        }
    }

    /// A 1x1 rect at `(row, col)`.
    pub fn unit(row: usize, col: usize) -> Self {
        GridRect::new(row, col, 1, 1)
    }

    /// Exclusive end row.
    pub fn end_row(&self) -> usize {
        self.row + self.row_span
    }

    /// Exclusive end column.
    pub fn end_col(&self) -> usize {
        self.col + self.col_span
    }

    /// A rect with a zero span covers no cells and can never be placed.
    pub fn has_area(&self) -> bool {
        self.row_span > 0 && self.col_span > 0
    }

    /// Same spans, clamped up to at least one cell on each axis.
    pub fn normalized(self) -> Self {
        GridRect {
            row_span: self.row_span.max(1),
            col_span: self.col_span.max(1),
            ..self
        }
    }

    /// Same spans at a different top-left cell.
    pub fn with_origin(self, row: usize, col: usize) -> Self {
        GridRect { row, col, ..self }
    }

    pub fn origin(&self) -> GridCoord {
        GridCoord::new(self.row, self.col)
    }

    pub fn area(&self) -> usize {
        self.row_span * self.col_span
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        (self.row..self.end_row()).contains(&coord.row)
            && (self.col..self.end_col()).contains(&coord.col)
    }

    pub fn intersects(&self, other: &GridRect) -> bool {
        self.row < other.end_row()
            && other.row < self.end_row()
            && self.col < other.end_col()
            && other.col < self.end_col()
    }

    /// Every cell of the rect in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        let (row, col, end_row, end_col) = (self.row, self.col, self.end_row(), self.end_col());
        (row..end_row).flat_map(move |r| (col..end_col).map(move |c| GridCoord::new(r, c)))
    }
}

impl fmt::Display for GridRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.row, self.col, self.row_span, self.col_span
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("rect {rect} has an empty span")]
    EmptySpan { rect: GridRect },

    #[error("cell {cell} is already owned by card {owner}")]
    Occupied { cell: GridCoord, owner: CardId },
}

// ---------------------------------------------------------------------------
// OccupancyGrid
// ---------------------------------------------------------------------------

/// Cell ownership map plus the grid bounds.
///
/// `size` always covers every occupied cell. It grows on `place`/`move_card`
/// and only shrinks through an explicit `compact`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OccupancyGrid {
    size: GridSize,
    cells: BTreeMap<GridCoord, CardId>,
}

impl OccupancyGrid {
    pub fn new(size: GridSize) -> Self {
        OccupancyGrid {
            size,
            cells: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Grow the bounds to at least `size`. Never shrinks.
    pub fn ensure_size(&mut self, size: GridSize) {
        self.size = self.size.union(size);
    }

    /// The card owning `coord`, if any.
    pub fn owner_at(&self, coord: GridCoord) -> Option<CardId> {
        self.cells.get(&coord).copied()
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// All cells owned by `id`, row-major.
    pub fn cells_of(&self, id: CardId) -> Vec<GridCoord> {
        self.cells
            .iter()
            .filter(|(_, owner)| **owner == id)
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Distinct card ids present in the cell map.
    pub fn owners(&self) -> BTreeSet<CardId> {
        self.cells.values().copied().collect()
    }

    /// Every unoccupied cell inside the bounds, row-major.
    pub fn empty_cells(&self) -> Vec<GridCoord> {
        (0..self.size.rows)
            .flat_map(|r| (0..self.size.cols).map(move |c| GridCoord::new(r, c)))
            .filter(|coord| !self.cells.contains_key(coord))
            .collect()
    }

    /// Iterate over `(cell, owner)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, CardId)> + '_ {
        self.cells.iter().map(|(coord, id)| (*coord, *id))
    }

    /// The first cell of `rect` owned by a card other than `exclude`,
    /// ignoring bounds.
    pub fn conflict(&self, rect: &GridRect, exclude: Option<CardId>) -> Option<(GridCoord, CardId)> {
        rect.cells().find_map(|cell| match self.cells.get(&cell) {
            Some(&owner) if Some(owner) != exclude => Some((cell, owner)),
            _ => None,
        })
    }

    /// Whether `rect` is inside the bounds and every cell is unowned (or
    /// owned by `exclude`). Never expands the grid.
    pub fn is_free(&self, rect: &GridRect, exclude: Option<CardId>) -> bool {
        self.size.contains(rect) && self.conflict(rect, exclude).is_none()
    }

    /// Claim every cell of `rect` for `id`, growing the bounds to fit.
    ///
    /// Cells already owned by `id` are accepted; any other owner rejects the
    /// whole placement before anything is written.
    pub fn place(&mut self, id: CardId, rect: GridRect) -> Result<(), GridError> {
        self.validate(id, &rect)?;
        self.write(id, &rect);
        Ok(())
    }

    /// Claim a fresh rect starting in the first row below the bounds. Cells
    /// past `size.rows` are never owned, so this cannot conflict.
    pub fn place_below(&mut self, id: CardId, row_span: usize, col_span: usize) -> GridRect {
        let rect = GridRect::new(self.size.rows, 0, row_span.max(1), col_span.max(1));
        self.write(id, &rect);
        rect
    }

    /// Release every cell owned by `id`. Returns the number of cells cleared.
    pub fn remove(&mut self, id: CardId) -> usize {
        let before = self.cells.len();
        self.cells.retain(|_, owner| *owner != id);
        before - self.cells.len()
    }

    /// Move `id` to `new_rect` as one step: validate, then remove and place.
    ///
    /// On error the cell map and bounds are untouched.
    pub fn move_card(&mut self, id: CardId, new_rect: GridRect) -> Result<(), GridError> {
        self.validate(id, &new_rect)?;
        self.remove(id);
        self.write(id, &new_rect);
        Ok(())
    }

    /// Shrink the bounds to the occupied bounding box, `(0, 0)` when empty.
    pub fn compact(&mut self) {
        let rows = self.cells.keys().map(|c| c.row + 1).max().unwrap_or(0);
        let cols = self.cells.keys().map(|c| c.col + 1).max().unwrap_or(0);
        self.size = GridSize::new(rows, cols);
    }

    fn validate(&self, id: CardId, rect: &GridRect) -> Result<(), GridError> {
        if !rect.has_area() {
            return Err(GridError::EmptySpan { rect: *rect });
        }
        if let Some((cell, owner)) = self.conflict(rect, Some(id)) {
            return Err(GridError::Occupied { cell, owner });
        }
        Ok(())
    }

    fn write(&mut self, id: CardId, rect: &GridRect) {
        self.size = self.size.covering(rect);
        for cell in rect.cells() {
            self.cells.insert(cell, id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
