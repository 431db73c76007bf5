// Placement engine: pick a free rect for a new card.

use crate::grid::{GridRect, OccupancyGrid};

/// Find where a card asking for `requested` should go.
///
/// 1. The search bounds are the grid size widened to cover `requested`.
/// 2. If `requested` is free within those bounds, it is used as is.
/// 3. Otherwise the first free origin in row-major order with the same spans.
/// 4. Otherwise a fresh row below the bounds, at column 0.
///
/// Zero spans are treated as one. The grid itself is not modified, so the
/// result is always placeable with `OccupancyGrid::place`.
pub fn find_position(grid: &OccupancyGrid, requested: GridRect) -> GridRect {
    let requested = requested.normalized();
    let bounds = grid.size().covering(&requested);
    let fits = |rect: &GridRect| bounds.contains(rect) && grid.conflict(rect, None).is_none();

    if fits(&requested) {
        return requested;
    }

    for row in 0..bounds.rows {
        for col in 0..bounds.cols {
            let candidate = requested.with_origin(row, col);
            if fits(&candidate) {
                return candidate;
            }
        }
    }

    requested.with_origin(bounds.rows, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CardId, GridSize};

    fn grid_with(size: GridSize, cards: &[(u64, GridRect)]) -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(size);
        for (id, rect) in cards {
            grid.place(CardId(*id), *rect).unwrap();
        }
        grid
    }

    #[test]
    fn free_request_is_used_as_is() {
        let grid = grid_with(GridSize::new(3, 3), &[(1, GridRect::unit(0, 0))]);
        let rect = GridRect::new(1, 1, 2, 2);
        assert_eq!(find_position(&grid, rect), rect);
    }

    #[test]
    fn collision_scans_row_major_for_first_fit() {
        let grid = grid_with(
            GridSize::new(2, 2),
            &[(1, GridRect::unit(0, 0)), (2, GridRect::unit(0, 1))],
        );
        assert_eq!(
            find_position(&grid, GridRect::unit(0, 0)),
            GridRect::unit(1, 0)
        );
    }

    #[test]
    fn wide_neighbor_pushes_unit_card_to_third_column() {
        let grid = grid_with(GridSize::new(3, 3), &[(1, GridRect::new(0, 0, 1, 2))]);
        assert_eq!(
            find_position(&grid, GridRect::unit(0, 0)),
            GridRect::unit(0, 2)
        );
    }

    #[test]
    fn full_two_by_two_grows_to_three_rows() {
        let mut grid = grid_with(
            GridSize::new(2, 2),
            &[
                (1, GridRect::unit(0, 0)),
                (2, GridRect::unit(0, 1)),
                (3, GridRect::unit(1, 0)),
                (4, GridRect::unit(1, 1)),
            ],
        );
        let rect = find_position(&grid, GridRect::unit(0, 0));
        assert_eq!(rect, GridRect::unit(2, 0));
        assert_eq!(grid.size(), GridSize::new(2, 2), "search must not mutate");
        grid.place(CardId(5), rect).unwrap();
        assert_eq!(grid.size(), GridSize::new(3, 2));
    }

    #[test]
    fn full_grid_appends_a_row() {
        let grid = grid_with(GridSize::new(1, 3), &[(1, GridRect::new(0, 0, 1, 3))]);
        assert_eq!(
            find_position(&grid, GridRect::new(0, 0, 1, 2)),
            GridRect::new(1, 0, 1, 2)
        );
    }

    #[test]
    fn request_beyond_bounds_widens_the_search() {
        let grid = grid_with(GridSize::new(2, 2), &[]);
        let rect = GridRect::new(3, 3, 1, 1);
        assert_eq!(find_position(&grid, rect), rect);
    }

    #[test]
    fn too_wide_request_still_gets_a_home() {
        let grid = grid_with(GridSize::new(2, 2), &[(1, GridRect::new(0, 0, 2, 2))]);
        let placed = find_position(&grid, GridRect::new(0, 0, 1, 4));
        assert_eq!(placed, GridRect::new(2, 0, 1, 4));
        assert!(grid.conflict(&placed, None).is_none());
    }

    #[test]
    fn zero_spans_are_normalized() {
        let grid = grid_with(GridSize::new(2, 2), &[]);
        assert_eq!(
            find_position(&grid, GridRect::new(0, 0, 0, 0)),
            GridRect::unit(0, 0)
        );
    }

    #[test]
    fn placement_never_fails_on_crowded_grids() {
        let mut grid = OccupancyGrid::new(GridSize::new(3, 3));
        let requests = [
            GridRect::new(0, 0, 2, 2),
            GridRect::new(0, 0, 1, 1),
            GridRect::new(1, 1, 2, 1),
            GridRect::new(0, 2, 3, 1),
            GridRect::new(2, 0, 1, 3),
            GridRect::new(5, 5, 1, 1),
            GridRect::new(0, 0, 2, 3),
        ];
        for (i, request) in requests.into_iter().enumerate() {
            let rect = find_position(&grid, request);
            assert_eq!((rect.row_span, rect.col_span), (request.row_span, request.col_span));
            grid.place(CardId(i as u64), rect)
                .unwrap_or_else(|e| panic!("request {i} placed at {rect}: {e}"));
        }
        let total: usize = requests.iter().map(GridRect::area).sum();
        assert_eq!(grid.occupied_count(), total);
    }
}
