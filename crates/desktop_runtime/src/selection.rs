//! Selection manager: click, marquee, and keyboard selection over one surface.

use desktop_store_contract::{GridPosition, ItemId, PixelPoint};

use crate::grid;
use crate::model::{DesktopState, ICON_BOX_SIZE};
use crate::registry::ItemRegistry;

/// Keyboard arrow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    /// Left (`x - 1`).
    Left,
    /// Right (`x + 1`).
    Right,
    /// Up (`y - 1`).
    Up,
    /// Down (`y + 1`).
    Down,
}

impl ArrowDirection {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Down => (0, 1),
        }
    }
}

/// Axis-aligned marquee rectangle in local surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarqueeRect {
    /// Left edge (inclusive).
    pub left: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl MarqueeRect {
    /// Normalizes two corner points into a rectangle.
    pub fn from_points(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Half-open interval overlap against an icon's bounding box.
    fn intersects_box(&self, origin: PixelPoint) -> bool {
        origin.x < self.right
            && self.left < origin.x + ICON_BOX_SIZE
            && origin.y < self.bottom
            && self.top < origin.y + ICON_BOX_SIZE
    }
}

/// Items under `parent` whose icon bounding boxes intersect `rect`, in
/// canonical registry order.
pub fn items_in_rect(
    registry: &ItemRegistry,
    parent: Option<&ItemId>,
    rect: MarqueeRect,
) -> Vec<ItemId> {
    registry
        .children_of(parent)
        .into_iter()
        .filter(|item| rect.intersects_box(grid::cell_origin(item.position)))
        .map(|item| item.id.clone())
        .collect()
}

/// Items under `parent` sorted by `(position.y, position.x)` — the Tab order.
pub fn tab_order(registry: &ItemRegistry, parent: Option<&ItemId>) -> Vec<ItemId> {
    let mut children = registry.children_of(parent);
    children.sort_by_key(|item| (item.position.y, item.position.x));
    children.into_iter().map(|item| item.id.clone()).collect()
}

/// Advances the Tab cycle from the current sole selection, wrapping.
///
/// With nothing (or several things) selected, the first item in Tab order is
/// chosen.
pub fn next_in_tab_order(state: &DesktopState, parent: Option<&ItemId>) -> Option<ItemId> {
    let order = tab_order(&state.items, parent);
    if order.is_empty() {
        return None;
    }
    let next_index = state
        .selection
        .sole()
        .and_then(|current| order.iter().position(|id| id == current))
        .map(|index| (index + 1) % order.len())
        .unwrap_or(0);
    Some(order[next_index].clone())
}

/// Item occupying the cell adjacent to the sole selection in `direction`, if
/// that exact cell is occupied. Empty target cells produce no movement.
pub fn adjacent_item(
    state: &DesktopState,
    parent: Option<&ItemId>,
    direction: ArrowDirection,
) -> Option<ItemId> {
    let current = state.selection.sole()?;
    let from = state.items.get(current)?.position;
    let (dx, dy) = direction.delta();
    let target = GridPosition {
        x: from.x + dx,
        y: from.y + dy,
    };
    if target.x < 0 || target.y < 0 {
        return None;
    }
    state
        .items
        .children_of(parent)
        .into_iter()
        .find(|item| item.position == target)
        .map(|item| item.id.clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use desktop_store_contract::{DesktopItem, ItemKind};

    use super::*;
    use crate::model::GRID_CELL_SIZE;

    fn state_with_grid(cells: &[(&str, i32, i32)]) -> DesktopState {
        let mut state = DesktopState::default();
        for &(id, x, y) in cells {
            state.items.insert(DesktopItem::new(
                ItemId::from(id),
                ItemKind::Text,
                id,
                None,
                GridPosition { x, y },
                1,
            ));
        }
        state
    }

    #[test]
    fn marquee_collects_intersecting_boxes() {
        let state = state_with_grid(&[("a", 0, 0), ("b", 0, 1), ("c", 3, 3)]);
        let rect = MarqueeRect::from_points(
            PixelPoint { x: 10, y: 10 },
            PixelPoint {
                x: 40,
                y: GRID_CELL_SIZE + 20,
            },
        );
        let hit = items_in_rect(&state.items, None, rect);
        assert_eq!(hit, vec![ItemId::from("a"), ItemId::from("b")]);
    }

    #[test]
    fn marquee_edge_touch_is_exclusive() {
        let state = state_with_grid(&[("a", 1, 0)]);
        // Icon box starts at x = 100; a rect ending exactly there misses.
        let rect =
            MarqueeRect::from_points(PixelPoint { x: 0, y: 0 }, PixelPoint { x: 100, y: 50 });
        assert_eq!(items_in_rect(&state.items, None, rect), Vec::<ItemId>::new());

        let rect =
            MarqueeRect::from_points(PixelPoint { x: 0, y: 0 }, PixelPoint { x: 101, y: 50 });
        assert_eq!(items_in_rect(&state.items, None, rect), vec![ItemId::from("a")]);
    }

    #[test]
    fn tab_order_sorts_by_row_then_column_and_wraps() {
        let mut state = state_with_grid(&[("a", 2, 0), ("b", 0, 0), ("c", 1, 1)]);
        assert_eq!(
            tab_order(&state.items, None),
            vec![ItemId::from("b"), ItemId::from("a"), ItemId::from("c")]
        );

        state.selection.select_only(ItemId::from("c"));
        assert_eq!(next_in_tab_order(&state, None), Some(ItemId::from("b")));

        state.selection.clear();
        assert_eq!(next_in_tab_order(&state, None), Some(ItemId::from("b")));
    }

    #[test]
    fn arrow_moves_only_to_occupied_adjacent_cells() {
        let mut state = state_with_grid(&[("a", 0, 0), ("b", 1, 0)]);
        state.selection.select_only(ItemId::from("a"));

        assert_eq!(
            adjacent_item(&state, None, ArrowDirection::Right),
            Some(ItemId::from("b"))
        );
        assert_eq!(adjacent_item(&state, None, ArrowDirection::Down), None);
        assert_eq!(adjacent_item(&state, None, ArrowDirection::Left), None);
    }
}
