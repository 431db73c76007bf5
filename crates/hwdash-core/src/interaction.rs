// Drag and resize gesture controllers.
//
// A single `InteractionState` slot holds the one active gesture. The
// controllers only compute previews; committing a move is left to the owner
// of the cards (the board), which re-validates against the grid.

use tracing::debug;

use crate::geometry::GridGeometry;
use crate::grid::{CardId, GridRect, GridSize, OccupancyGrid};

/// The card edge a resize gesture grabbed. The opposite edge stays pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging {
        card: CardId,
        start_rect: GridRect,
        /// Valid drop target for the latest pointer position, if any.
        candidate: Option<GridRect>,
    },
    Resizing {
        card: CardId,
        edge: Edge,
        start_rect: GridRect,
        /// Last valid resized rect. Starts at `start_rect`.
        preview: GridRect,
    },
}

/// A gesture that has just ended and what it asks the board to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub card: CardId,
    pub start_rect: GridRect,
    /// `None` when the drop target was invalid.
    pub target: Option<GridRect>,
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// The card the active gesture is working on.
    pub fn active_card(&self) -> Option<CardId> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Dragging { card, .. } | InteractionState::Resizing { card, .. } => {
                Some(*card)
            }
        }
    }

    /// The rect to draw as the live preview, if any.
    pub fn preview(&self) -> Option<GridRect> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Dragging { candidate, .. } => *candidate,
            InteractionState::Resizing { preview, .. } => Some(*preview),
        }
    }

    /// Drop any gesture without committing.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            debug!("gesture cancelled: {self:?}");
        }
        *self = InteractionState::Idle;
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    /// Start dragging `card`. Ignored (returns false) while another gesture
    /// is active.
    pub fn begin_drag(&mut self, card: CardId, start_rect: GridRect) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = InteractionState::Dragging {
            card,
            start_rect,
            candidate: None,
        };
        true
    }

    /// Update the drop candidate for a dragged-card center at `(x, y)` on
    /// screen. Returns the new preview.
    pub fn drag_to(
        &mut self,
        grid: &OccupancyGrid,
        geometry: &GridGeometry,
        x: f64,
        y: f64,
    ) -> Option<GridRect> {
        let InteractionState::Dragging {
            card,
            start_rect,
            candidate,
        } = self
        else {
            return None;
        };
        let (row_index, col_index) = geometry.continuous_index(x, y);
        let rect = drag_candidate(row_index, col_index, *start_rect, grid.size());
        *candidate = grid.is_free(&rect, Some(*card)).then_some(rect);
        *candidate
    }

    /// End a drag. Returns `None` when no drag was active.
    pub fn finish_drag(&mut self) -> Option<Release> {
        let InteractionState::Dragging {
            card,
            start_rect,
            candidate,
        } = *self
        else {
            return None;
        };
        *self = InteractionState::Idle;
        Some(Release {
            card,
            start_rect,
            target: candidate,
        })
    }

    // -----------------------------------------------------------------------
    // Resize
    // -----------------------------------------------------------------------

    /// Start resizing `card` from `edge`. Ignored while another gesture is
    /// active.
    pub fn begin_resize(&mut self, card: CardId, edge: Edge, start_rect: GridRect) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = InteractionState::Resizing {
            card,
            edge,
            start_rect,
            preview: start_rect,
        };
        true
    }

    /// Update the preview for a pointer moved `(dx, dy)` screen units from
    /// where the resize started. Returns the current preview.
    pub fn resize_by(
        &mut self,
        grid: &OccupancyGrid,
        dx: f64,
        dy: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> Option<GridRect> {
        let InteractionState::Resizing {
            card,
            edge,
            start_rect,
            preview,
        } = self
        else {
            return None;
        };
        let delta = match edge {
            Edge::Left | Edge::Right => cell_delta(dx, cell_width),
            Edge::Top | Edge::Bottom => cell_delta(dy, cell_height),
        };
        let rect = resized_rect(*start_rect, *edge, delta);
        if rect != *preview && grid.is_free(&rect, Some(*card)) {
            *preview = rect;
        }
        Some(*preview)
    }

    /// End a resize. The target is `None` when the preview never left the
    /// start rect.
    pub fn finish_resize(&mut self) -> Option<Release> {
        let InteractionState::Resizing {
            card,
            start_rect,
            preview,
            ..
        } = *self
        else {
            return None;
        };
        *self = InteractionState::Idle;
        Some(Release {
            card,
            start_rect,
            target: (preview != start_rect).then_some(preview),
        })
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Top-left for a rect with `start`'s spans centered at the continuous
/// index `(row_index, col_index)`, kept inside `size`.
pub fn drag_candidate(row_index: f64, col_index: f64, start: GridRect, size: GridSize) -> GridRect {
    let axis = |center: f64, span: usize, extent: usize| -> usize {
        let origin = (center - (span as f64 - 1.0) / 2.0).round();
        let max_origin = extent.saturating_sub(span) as f64;
        origin.clamp(0.0, max_origin) as usize
    };
    start.with_origin(
        axis(row_index, start.row_span, size.rows),
        axis(col_index, start.col_span, size.cols),
    )
}

/// Whole cells covered by a pointer delta.
pub fn cell_delta(delta: f64, cell_size: f64) -> i64 {
    if cell_size <= 0.0 {
        return 0;
    }
    (delta / cell_size).round() as i64
}

/// `start` with `edge` moved by `delta` cells. The opposite edge is pinned,
/// spans never drop below 1, and origins never go below 0.
pub fn resized_rect(start: GridRect, edge: Edge, delta: i64) -> GridRect {
    let grow = |span: usize| (span as i64 + delta).max(1) as usize;
    // Moves the leading edge while the trailing (exclusive) end stays put.
    let shift = |origin: usize, span: usize| {
        let end = (origin + span) as i64;
        let new_origin = (origin as i64 + delta).clamp(0, end - 1);
        (new_origin as usize, (end - new_origin) as usize)
    };
    match edge {
        Edge::Right => GridRect {
            col_span: grow(start.col_span),
            ..start
        },
        Edge::Bottom => GridRect {
            row_span: grow(start.row_span),
            ..start
        },
        Edge::Left => {
            let (col, col_span) = shift(start.col, start.col_span);
            GridRect {
                col,
                col_span,
                ..start
            }
        }
        Edge::Top => {
            let (row, row_span) = shift(start.row, start.row_span);
            GridRect {
                row,
                row_span,
                ..start
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenRect;

    /// 4x4 grid drawn as 10x10 cells without spacing: cell centers at 5, 15, 25, 35.
    fn geometry(size: GridSize) -> GridGeometry {
        GridGeometry::new(
            ScreenRect::new(0.0, 0.0, 10.0 * size.cols as f64, 10.0 * size.rows as f64),
            size,
            0.0,
        )
    }

    #[test]
    fn candidate_centers_span_on_pointer() {
        let size = GridSize::new(4, 4);
        let rect = GridRect::new(1, 1, 2, 2);
        assert_eq!(drag_candidate(0.5, 0.5, rect, size), GridRect::new(0, 0, 2, 2));
        assert_eq!(drag_candidate(2.5, 1.5, rect, size), GridRect::new(2, 1, 2, 2));
        assert_eq!(drag_candidate(0.0, 3.0, rect, size), GridRect::new(0, 2, 2, 2));
    }

    #[test]
    fn candidate_is_clamped_inside_grid() {
        let size = GridSize::new(3, 3);
        let rect = GridRect::new(0, 0, 1, 3);
        assert_eq!(drag_candidate(2.0, 2.0, rect, size), GridRect::new(2, 0, 1, 3));
        // A span wider than the grid pins to the origin.
        let wide = GridRect::new(0, 0, 1, 5);
        assert_eq!(drag_candidate(1.0, 2.0, wide, size), GridRect::new(1, 0, 1, 5));
    }

    #[test]
    fn drag_previews_free_target_and_commits_on_drop() {
        let size = GridSize::new(4, 4);
        let mut grid = OccupancyGrid::new(size);
        let card = CardId(1);
        let start = GridRect::new(1, 1, 2, 2);
        grid.place(card, start).unwrap();

        let mut state = InteractionState::Idle;
        assert!(state.begin_drag(card, start));
        let preview = state.drag_to(&grid, &geometry(size), 10.0, 10.0);
        assert_eq!(preview, Some(GridRect::new(0, 0, 2, 2)));
        assert_eq!(state.preview(), preview);

        let release = state.finish_drag().unwrap();
        assert!(state.is_idle());
        assert_eq!(release.target, Some(GridRect::new(0, 0, 2, 2)));
        grid.move_card(card, GridRect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(grid.owner_at(crate::grid::GridCoord::new(2, 2)), None);
        assert_eq!(grid.owner_at(crate::grid::GridCoord::new(0, 0)), Some(card));
    }

    #[test]
    fn drag_onto_neighbor_hides_preview() {
        let size = GridSize::new(2, 2);
        let mut grid = OccupancyGrid::new(size);
        grid.place(CardId(1), GridRect::unit(0, 0)).unwrap();
        grid.place(CardId(2), GridRect::unit(0, 1)).unwrap();

        let mut state = InteractionState::Idle;
        state.begin_drag(CardId(1), GridRect::unit(0, 0));
        assert_eq!(state.drag_to(&grid, &geometry(size), 5.0, 15.0), Some(GridRect::unit(1, 0)));
        assert_eq!(state.drag_to(&grid, &geometry(size), 15.0, 5.0), None);
        assert_eq!(state.preview(), None);

        let release = state.finish_drag().unwrap();
        assert_eq!(release.target, None, "last pointer position was invalid");
    }

    #[test]
    fn second_gesture_is_ignored() {
        let mut state = InteractionState::Idle;
        assert!(state.begin_drag(CardId(1), GridRect::unit(0, 0)));
        assert!(!state.begin_drag(CardId(2), GridRect::unit(1, 1)));
        assert!(!state.begin_resize(CardId(2), Edge::Right, GridRect::unit(1, 1)));
        assert_eq!(state.active_card(), Some(CardId(1)));
        state.cancel();
        assert!(state.is_idle());
        assert_eq!(state.finish_drag(), None);
    }

    #[test]
    fn cell_delta_rounds() {
        assert_eq!(cell_delta(14.0, 10.0), 1);
        assert_eq!(cell_delta(15.0, 10.0), 2);
        assert_eq!(cell_delta(-14.0, 10.0), -1);
        assert_eq!(cell_delta(3.0, 0.0), 0);
    }

    #[test]
    fn resize_keeps_opposite_edge_pinned() {
        let start = GridRect::new(2, 2, 2, 2);
        assert_eq!(resized_rect(start, Edge::Right, 1), GridRect::new(2, 2, 2, 3));
        assert_eq!(resized_rect(start, Edge::Bottom, -5), GridRect::new(2, 2, 1, 2));
        assert_eq!(resized_rect(start, Edge::Left, -1), GridRect::new(2, 1, 2, 3));
        assert_eq!(resized_rect(start, Edge::Left, 3), GridRect::new(2, 3, 2, 1));
        assert_eq!(resized_rect(start, Edge::Top, -9), GridRect::new(0, 2, 4, 2));
    }

    #[test]
    fn resize_right_grows_then_holds_last_valid_preview() {
        let size = GridSize::new(2, 4);
        let mut grid = OccupancyGrid::new(size);
        let card = CardId(1);
        grid.place(card, GridRect::unit(0, 0)).unwrap();
        grid.place(CardId(2), GridRect::unit(0, 2)).unwrap();

        let mut state = InteractionState::Idle;
        state.begin_resize(card, Edge::Right, GridRect::unit(0, 0));
        // +1.4 cell widths rounds to one more column.
        assert_eq!(state.resize_by(&grid, 14.0, 0.0, 10.0, 10.0), Some(GridRect::new(0, 0, 1, 2)));
        // Two more columns would hit the neighbor: preview is held.
        assert_eq!(state.resize_by(&grid, 21.0, 0.0, 10.0, 10.0), Some(GridRect::new(0, 0, 1, 2)));

        let release = state.finish_resize().unwrap();
        assert!(state.is_idle());
        assert_eq!(release.target, Some(GridRect::new(0, 0, 1, 2)));
    }

    #[test]
    fn resize_colliding_from_the_start_keeps_start_rect() {
        let size = GridSize::new(1, 2);
        let mut grid = OccupancyGrid::new(size);
        grid.place(CardId(1), GridRect::unit(0, 0)).unwrap();
        grid.place(CardId(2), GridRect::unit(0, 1)).unwrap();

        let mut state = InteractionState::Idle;
        state.begin_resize(CardId(1), Edge::Right, GridRect::unit(0, 0));
        assert_eq!(state.resize_by(&grid, 10.0, 0.0, 10.0, 10.0), Some(GridRect::unit(0, 0)));
        let release = state.finish_resize().unwrap();
        assert_eq!(release.target, None);
    }

    #[test]
    fn resize_past_grid_edge_is_rejected() {
        let size = GridSize::new(2, 2);
        let mut grid = OccupancyGrid::new(size);
        grid.place(CardId(1), GridRect::unit(1, 1)).unwrap();

        let mut state = InteractionState::Idle;
        state.begin_resize(CardId(1), Edge::Bottom, GridRect::unit(1, 1));
        assert_eq!(state.resize_by(&grid, 0.0, 10.0, 10.0, 10.0), Some(GridRect::unit(1, 1)));
    }
}
