//! Window stack transition helpers used by the desktop reducer.

use desktop_store_contract::{
    PixelPoint, PixelSize, WindowBounds, WindowContent, WindowState,
};

use crate::model::{
    DesktopState, Viewport, MENU_BAR_HEIGHT, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
    WINDOW_MIN_VISIBLE, WINDOW_SNAP_THRESHOLD,
};

/// Opens a window, deduplicated by id: an already-open id is focused and
/// un-collapsed instead of duplicated.
///
/// Returns `true` when a new window was created.
pub fn open_window(
    state: &mut DesktopState,
    id: &str,
    title: &str,
    content: WindowContent,
    position: PixelPoint,
    size: PixelSize,
) -> bool {
    if state.window(id).is_some() {
        if let Some(window) = state.window_mut(id) {
            window.collapsed = false;
            window.minimized = false;
        }
        focus_window(state, id);
        return false;
    }

    let z_index = next_z(state);
    state.windows.push(WindowState {
        id: id.to_string(),
        title: title.to_string(),
        position,
        size: PixelSize {
            width: size.width.max(MIN_WINDOW_WIDTH),
            height: size.height.max(MIN_WINDOW_HEIGHT),
        },
        z_index,
        minimized: false,
        maximized: false,
        collapsed: false,
        restore_bounds: None,
        content,
    });
    true
}

/// Raises a window to the top of the stack.
///
/// Idempotent: focusing the window that already holds the maximum z-index does
/// not consume a counter value. Returns `true` when the z-index changed.
pub fn focus_window(state: &mut DesktopState, id: &str) -> bool {
    let Some(current) = state.window(id).map(|w| w.z_index) else {
        return false;
    };
    if state.top_z() == Some(current) {
        if let Some(window) = state.window_mut(id) {
            window.minimized = false;
        }
        return false;
    }
    let z_index = next_z(state);
    if let Some(window) = state.window_mut(id) {
        window.z_index = z_index;
        window.minimized = false;
    }
    true
}

/// Removes a window from the stack. Returns `true` when it existed.
pub fn close_window(state: &mut DesktopState, id: &str) -> bool {
    let before = state.windows.len();
    state.windows.retain(|w| w.id != id);
    state.windows.len() != before
}

/// Hides a window until its next focus.
pub fn minimize_window(state: &mut DesktopState, id: &str) -> bool {
    match state.window_mut(id) {
        Some(window) => {
            window.minimized = true;
            true
        }
        None => false,
    }
}

/// Toggles window-shade collapse: content and resize handle hidden, title bar
/// shown.
pub fn toggle_collapse(state: &mut DesktopState, id: &str) -> bool {
    match state.window_mut(id) {
        Some(window) => {
            window.collapsed = !window.collapsed;
            true
        }
        None => false,
    }
}

/// Maximizes into the work area below the menu bar, or restores the snapshot
/// taken when maximizing.
///
/// The snapshot is only taken on the un-maximized -> maximized transition, so
/// repeated toggling always restores the original geometry.
pub fn toggle_maximize(state: &mut DesktopState, id: &str, viewport: Viewport) -> bool {
    let Some(window) = state.window_mut(id) else {
        return false;
    };
    if window.maximized {
        if let Some(bounds) = window.restore_bounds.take() {
            window.position = bounds.position;
            window.size = bounds.size;
        }
        window.maximized = false;
    } else {
        window.restore_bounds = Some(WindowBounds {
            position: window.position,
            size: window.size,
        });
        window.position = PixelPoint {
            x: 0,
            y: MENU_BAR_HEIGHT,
        };
        window.size = PixelSize {
            width: viewport.width,
            height: viewport.height - MENU_BAR_HEIGHT,
        };
        window.maximized = true;
        window.collapsed = false;
    }
    true
}

/// Clamps a candidate window position so at least [`WINDOW_MIN_VISIBLE`]
/// pixels stay on-screen horizontally and the title bar stays below the menu
/// bar, then snaps edges within [`WINDOW_SNAP_THRESHOLD`] flush to the
/// viewport bounds.
pub fn clamp_and_snap(position: PixelPoint, size: PixelSize, viewport: Viewport) -> PixelPoint {
    let mut x = position
        .x
        .max(WINDOW_MIN_VISIBLE - size.width)
        .min(viewport.width - WINDOW_MIN_VISIBLE);
    let mut y = position.y.max(MENU_BAR_HEIGHT);

    if x.abs() <= WINDOW_SNAP_THRESHOLD {
        x = 0;
    } else if (x + size.width - viewport.width).abs() <= WINDOW_SNAP_THRESHOLD {
        x = viewport.width - size.width;
    }
    if (y - MENU_BAR_HEIGHT).abs() <= WINDOW_SNAP_THRESHOLD {
        y = MENU_BAR_HEIGHT;
    } else if (y + size.height - viewport.height).abs() <= WINDOW_SNAP_THRESHOLD {
        y = viewport.height - size.height;
    }

    PixelPoint { x, y }
}

/// Applies a clamped, snapped move to a window. Maximized windows do not move.
pub fn apply_move(
    state: &mut DesktopState,
    id: &str,
    position: PixelPoint,
    viewport: Viewport,
) -> bool {
    let Some(window) = state.window_mut(id) else {
        return false;
    };
    if window.maximized {
        return false;
    }
    let size = window.size;
    window.position = clamp_and_snap(position, size, viewport);
    true
}

/// Applies a corner-handle resize, enforcing the minimum size. Collapsed and
/// maximized windows do not resize.
pub fn apply_resize(state: &mut DesktopState, id: &str, size: PixelSize) -> bool {
    let Some(window) = state.window_mut(id) else {
        return false;
    };
    if window.maximized || window.collapsed {
        return false;
    }
    window.size = PixelSize {
        width: size.width.max(MIN_WINDOW_WIDTH),
        height: size.height.max(MIN_WINDOW_HEIGHT),
    };
    true
}

fn next_z(state: &mut DesktopState) -> u32 {
    if state.next_z == 0 {
        state.next_z = 1;
    }
    let z = state.next_z;
    state.next_z = state.next_z.saturating_add(1);
    z
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1280,
        height: 800,
    };

    fn open(state: &mut DesktopState, id: &str) {
        open_window(
            state,
            id,
            id,
            WindowContent::Custom(id.to_string()),
            PixelPoint { x: 100, y: 100 },
            PixelSize {
                width: 400,
                height: 300,
            },
        );
    }

    #[test]
    fn reopening_same_id_focuses_instead_of_duplicating() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");
        open(&mut state, "w2");
        toggle_collapse(&mut state, "w1");

        open(&mut state, "w1");
        let w1_count = state.windows.iter().filter(|w| w.id == "w1").count();
        assert_eq!(w1_count, 1);
        let w1 = state.window("w1").expect("w1");
        assert!(!w1.collapsed);
        assert_eq!(state.top_z(), Some(w1.z_index));
    }

    #[test]
    fn focusing_topmost_window_never_changes_its_z() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");
        open(&mut state, "w2");
        let top = state.window("w2").expect("w2").z_index;

        assert!(!focus_window(&mut state, "w2"));
        assert_eq!(state.window("w2").expect("w2").z_index, top);

        assert!(focus_window(&mut state, "w1"));
        let raised = state.window("w1").expect("w1").z_index;
        assert!(raised > top);
        assert_eq!(state.top_z(), Some(raised));
    }

    #[test]
    fn maximize_then_restore_is_exact_and_idempotent() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");
        let before = {
            let w = state.window("w1").expect("w1");
            (w.position, w.size)
        };

        toggle_maximize(&mut state, "w1", VIEWPORT);
        {
            let w = state.window("w1").expect("w1");
            assert!(w.maximized);
            assert_eq!(w.position, PixelPoint { x: 0, y: MENU_BAR_HEIGHT });
            assert_eq!(
                w.size,
                PixelSize {
                    width: VIEWPORT.width,
                    height: VIEWPORT.height - MENU_BAR_HEIGHT,
                }
            );
        }

        toggle_maximize(&mut state, "w1", VIEWPORT);
        toggle_maximize(&mut state, "w1", VIEWPORT);
        toggle_maximize(&mut state, "w1", VIEWPORT);
        let w = state.window("w1").expect("w1");
        assert!(!w.maximized);
        assert_eq!((w.position, w.size), before);
        assert_eq!(w.restore_bounds, None);
    }

    #[test]
    fn move_clamps_horizontal_visibility_and_menu_bar() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");

        apply_move(&mut state, "w1", PixelPoint { x: -2000, y: 0 }, VIEWPORT);
        let w = state.window("w1").expect("w1");
        assert_eq!(w.position.x, WINDOW_MIN_VISIBLE - w.size.width);
        assert_eq!(w.position.y, MENU_BAR_HEIGHT);

        apply_move(&mut state, "w1", PixelPoint { x: 5000, y: 400 }, VIEWPORT);
        let w = state.window("w1").expect("w1");
        assert_eq!(w.position.x, VIEWPORT.width - WINDOW_MIN_VISIBLE);
    }

    #[test]
    fn move_snaps_edges_near_viewport_bounds() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");

        apply_move(&mut state, "w1", PixelPoint { x: 7, y: 300 }, VIEWPORT);
        assert_eq!(state.window("w1").expect("w1").position.x, 0);

        // Right edge at 1273: within 10 px of 1280.
        apply_move(&mut state, "w1", PixelPoint { x: 873, y: 300 }, VIEWPORT);
        assert_eq!(
            state.window("w1").expect("w1").position.x,
            VIEWPORT.width - 400
        );

        // Bottom edge at 795: snaps to the bottom bound.
        apply_move(&mut state, "w1", PixelPoint { x: 300, y: 495 }, VIEWPORT);
        assert_eq!(
            state.window("w1").expect("w1").position.y,
            VIEWPORT.height - 300
        );
    }

    #[test]
    fn resize_enforces_minimum_size() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");
        apply_resize(
            &mut state,
            "w1",
            PixelSize {
                width: 10,
                height: 4000,
            },
        );
        let w = state.window("w1").expect("w1");
        assert_eq!(w.size.width, MIN_WINDOW_WIDTH);
        assert_eq!(w.size.height, 4000);
    }

    #[test]
    fn collapsed_window_does_not_resize() {
        let mut state = DesktopState::default();
        open(&mut state, "w1");
        toggle_collapse(&mut state, "w1");
        let before = state.window("w1").expect("w1").size;
        assert!(!apply_resize(
            &mut state,
            "w1",
            PixelSize {
                width: 900,
                height: 900,
            }
        ));
        assert_eq!(state.window("w1").expect("w1").size, before);
    }
}
