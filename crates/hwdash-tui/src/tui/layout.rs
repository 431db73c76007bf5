// Screen layout and hit testing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Card grid (fill)                                  |
// |                                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// Grid cells are laid out with `GridGeometry` in terminal-cell units and
// rounded to whole terminal cells for drawing.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use hwdash_core::board::Board;
use hwdash_core::geometry::{GridGeometry, ScreenRect};
use hwdash_core::grid::{CardId, GridCoord, GridRect, GridSize};
use hwdash_core::interaction::Edge;

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: theme, mode, grid size, new-card template.
    pub status_bar: Rect,
    /// Everything between the bars.
    pub grid: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // grid
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        grid: vertical[1],
        help_bar: vertical[2],
    }
}

/// Number of rows and columns drawn. In edit mode one extra row and column
/// hold the "+" affordances that grow the grid.
pub fn display_size(board: &Board) -> GridSize {
    let size = board.grid().size();
    if board.edit_mode() {
        GridSize::new(size.rows + 1, size.cols + 1)
    } else {
        size
    }
}

/// Geometry of the grid drawn inside `area`.
pub fn grid_geometry(area: Rect, size: GridSize, spacing: u16) -> GridGeometry {
    GridGeometry::new(
        ScreenRect::new(
            f64::from(area.x),
            f64::from(area.y),
            f64::from(area.width),
            f64::from(area.height),
        ),
        size,
        f64::from(spacing),
    )
}

/// Round a grid rect to whole terminal cells, clipped to `clip`.
pub fn cell_rect(geometry: &GridGeometry, rect: &GridRect, clip: Rect) -> Rect {
    let bounds = geometry.bounds_of(rect);
    let x0 = bounds.x.round().max(0.0) as u16;
    let y0 = bounds.y.round().max(0.0) as u16;
    let x1 = bounds.right().round().max(0.0) as u16;
    let y1 = bounds.bottom().round().max(0.0) as u16;
    Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0)).intersection(clip)
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// Which part of a card the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardZone {
    /// Interior: drag handle in edit mode.
    Body,
    /// Border: resize handle in edit mode.
    Edge(Edge),
    /// The remove button in the top border.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Card { card: CardId, zone: CardZone },
    Affordance(GridCoord),
    Nothing,
}

/// Column of the remove button inside a card drawn at `area`.
pub fn remove_button_x(area: Rect) -> Option<u16> {
    (area.width >= 6).then(|| area.right() - 3)
}

/// Resolve the terminal cell `(column, row)` to what is drawn there.
pub fn hit_test(board: &Board, geometry: &GridGeometry, clip: Rect, column: u16, row: u16) -> HitTarget {
    for card in board.cards() {
        let area = cell_rect(geometry, &card.rect, clip);
        if !area.contains((column, row).into()) {
            continue;
        }
        let zone = card_zone(area, column, row);
        return HitTarget::Card {
            card: card.id,
            zone,
        };
    }

    let (x, y) = (f64::from(column) + 0.5, f64::from(row) + 0.5);
    match geometry.cell_at(x, y) {
        Some(coord) if board.affordance_cells().contains(&coord) => HitTarget::Affordance(coord),
        _ => HitTarget::Nothing,
    }
}

fn card_zone(area: Rect, column: u16, row: u16) -> CardZone {
    let top = area.y;
    let bottom = area.bottom().saturating_sub(1);
    let left = area.x;
    let right = area.right().saturating_sub(1);

    if row == top && remove_button_x(area).is_some_and(|x| column >= x && column < x + 2) {
        return CardZone::Remove;
    }
    if row == top {
        CardZone::Edge(Edge::Top)
    } else if row == bottom {
        CardZone::Edge(Edge::Bottom)
    } else if column == left {
        CardZone::Edge(Edge::Left)
    } else if column == right {
        CardZone::Edge(Edge::Right)
    } else {
        CardZone::Body
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
