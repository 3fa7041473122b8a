//! Grid placement resolver: conflict-free cell lookup by ring search.

use std::collections::HashSet;

use desktop_store_contract::{GridPosition, PixelPoint};

use crate::model::GRID_CELL_SIZE;

/// Largest Chebyshev ring searched before giving up and accepting overlap.
pub const MAX_SEARCH_RADIUS: i32 = 20;

/// Returns `target` if unoccupied, otherwise the first free cell found by
/// scanning concentric square rings outward.
///
/// Ring scan order is row-major: within ring `r`, `dy` runs from `-r` to `r`
/// and `dx` from `-r` to `r`, keeping only cells at Chebyshev distance exactly
/// `r` with both coordinates `>= 0`. For a target of `(0, 0)` the first ring
/// therefore scans `(1, 0)`, `(0, 1)`, `(1, 1)` in that order.
///
/// If every cell within [`MAX_SEARCH_RADIUS`] rings is taken, the (clamped)
/// target is returned and the overlap accepted.
pub fn find_free_cell(occupied: &HashSet<GridPosition>, target: GridPosition) -> GridPosition {
    let target = target.clamped();
    if !occupied.contains(&target) {
        return target;
    }

    for ring in 1..=MAX_SEARCH_RADIUS {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs().max(dy.abs()) != ring {
                    continue;
                }
                let cell = GridPosition {
                    x: target.x + dx,
                    y: target.y + dy,
                };
                if cell.x < 0 || cell.y < 0 {
                    continue;
                }
                if !occupied.contains(&cell) {
                    return cell;
                }
            }
        }
    }

    target
}

/// Converts a point in desktop surface pixels to the grid cell containing it.
pub fn cell_at_point(point: PixelPoint) -> GridPosition {
    GridPosition {
        x: point.x.div_euclid(GRID_CELL_SIZE),
        y: point.y.div_euclid(GRID_CELL_SIZE),
    }
    .clamped()
}

/// Top-left pixel corner of a grid cell.
pub fn cell_origin(cell: GridPosition) -> PixelPoint {
    PixelPoint {
        x: cell.x * GRID_CELL_SIZE,
        y: cell.y * GRID_CELL_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn occupied(cells: &[(i32, i32)]) -> HashSet<GridPosition> {
        cells
            .iter()
            .map(|&(x, y)| GridPosition { x, y })
            .collect()
    }

    #[test]
    fn free_target_is_returned_unchanged() {
        let taken = occupied(&[(1, 1)]);
        let cell = find_free_cell(&taken, GridPosition { x: 4, y: 2 });
        assert_eq!(cell, GridPosition { x: 4, y: 2 });
    }

    #[test]
    fn occupied_origin_resolves_to_first_ring_cell() {
        // F1 at (0,0), T1 at (0,1): ring 1 scans (1,0) first.
        let taken = occupied(&[(0, 0), (0, 1)]);
        let cell = find_free_cell(&taken, GridPosition { x: 0, y: 0 });
        assert_eq!(cell, GridPosition { x: 1, y: 0 });
    }

    #[test]
    fn fully_occupied_first_ring_falls_through_to_second() {
        let taken = occupied(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        let cell = find_free_cell(&taken, GridPosition { x: 0, y: 0 });
        assert_eq!(cell, GridPosition { x: 2, y: 0 });
    }

    #[test]
    fn negative_target_is_clamped_before_lookup() {
        let cell = find_free_cell(&HashSet::new(), GridPosition { x: -3, y: -1 });
        assert_eq!(cell, GridPosition { x: 0, y: 0 });
    }

    #[test]
    fn saturated_search_returns_target_accepting_overlap() {
        let mut taken = HashSet::new();
        for x in 0..=(MAX_SEARCH_RADIUS * 2 + 1) {
            for y in 0..=(MAX_SEARCH_RADIUS * 2 + 1) {
                taken.insert(GridPosition { x, y });
            }
        }
        let target = GridPosition {
            x: MAX_SEARCH_RADIUS,
            y: MAX_SEARCH_RADIUS,
        };
        assert_eq!(find_free_cell(&taken, target), target);
    }

    #[test]
    fn cell_at_point_floors_into_cells() {
        assert_eq!(
            cell_at_point(PixelPoint { x: 0, y: 0 }),
            GridPosition { x: 0, y: 0 }
        );
        assert_eq!(
            cell_at_point(PixelPoint { x: 99, y: 100 }),
            GridPosition { x: 0, y: 1 }
        );
        assert_eq!(
            cell_at_point(PixelPoint { x: 250, y: 310 }),
            GridPosition { x: 2, y: 3 }
        );
    }

    proptest! {
        #[test]
        fn resolver_never_returns_an_occupied_cell_when_one_is_free(
            cells in proptest::collection::hash_set((0i32..8, 0i32..8), 0..32),
            tx in 0i32..8,
            ty in 0i32..8,
        ) {
            let taken: HashSet<GridPosition> =
                cells.iter().map(|&(x, y)| GridPosition { x, y }).collect();
            let cell = find_free_cell(&taken, GridPosition { x: tx, y: ty });
            // An 8x8 occupied block can never saturate a 20-ring search.
            prop_assert!(!taken.contains(&cell));
            prop_assert!(cell.x >= 0 && cell.y >= 0);
        }

        #[test]
        fn resolver_is_deterministic(
            cells in proptest::collection::hash_set((0i32..6, 0i32..6), 0..20),
            tx in 0i32..6,
            ty in 0i32..6,
        ) {
            let taken: HashSet<GridPosition> =
                cells.iter().map(|&(x, y)| GridPosition { x, y }).collect();
            let target = GridPosition { x: tx, y: ty };
            prop_assert_eq!(find_free_cell(&taken, target), find_free_cell(&taken, target));
        }
    }
}
