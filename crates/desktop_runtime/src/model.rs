//! Engine-local state: desktop model, selection, clipboard, uploads, and
//! in-flight interaction sessions.

use serde::{Deserialize, Serialize};

use desktop_store_contract::{
    DesktopItem, GridPosition, ItemId, PixelPoint, Profile, WindowState,
};

use crate::drag::DropTargetIndex;
use crate::registry::ItemRegistry;

/// Schema version of the locally cached [`DesktopSnapshot`].
pub const DESKTOP_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Pixel edge length of one desktop grid cell.
pub const GRID_CELL_SIZE: i32 = 100;
/// Bounding-box edge used for marquee intersection tests.
pub const ICON_BOX_SIZE: i32 = 80;
/// Pointer travel below this is a click, not a drag or marquee.
pub const DRAG_THRESHOLD_PX: i32 = 5;
/// Height of the fixed menu bar; windows never move above it.
pub const MENU_BAR_HEIGHT: i32 = 24;
/// Minimum window width applied wherever a resize delta lands.
pub const MIN_WINDOW_WIDTH: i32 = 200;
/// Minimum window height applied wherever a resize delta lands.
pub const MIN_WINDOW_HEIGHT: i32 = 150;
/// Window edges closer than this to a viewport bound snap flush to it.
pub const WINDOW_SNAP_THRESHOLD: i32 = 10;
/// At least this much window width must stay on-screen during a move.
pub const WINDOW_MIN_VISIBLE: i32 = 50;
/// Two title-bar clicks within this interval collapse the window.
pub const DOUBLE_CLICK_MS: u64 = 300;
/// Column count used for placeholder positions inside a folder.
pub const FOLDER_COLUMNS: i32 = 4;
/// Completed upload rows are garbage-collected after this delay.
pub const UPLOAD_GC_DELAY_MS: u64 = 3000;

/// Desktop viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// Current selection: an ordered item-id set, mutually exclusive with the
/// trash region and the assistant icon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    ids: Vec<ItemId>,
    /// The trash region is selected instead of any item.
    pub trash_selected: bool,
    /// The assistant icon is selected instead of any item.
    pub assistant_selected: bool,
}

impl Selection {
    /// Selected item ids in insertion order.
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    /// Returns `true` when `id` is selected.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && !self.trash_selected && !self.assistant_selected
    }

    /// The sole selected item, if exactly one is selected.
    pub fn sole(&self) -> Option<&ItemId> {
        match self.ids.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Selects exactly `id`, clearing everything else.
    pub fn select_only(&mut self, id: ItemId) {
        self.ids.clear();
        self.ids.push(id);
        self.trash_selected = false;
        self.assistant_selected = false;
    }

    /// Adds `id` to the selection. Union-only: a second toggle does not remove.
    pub fn add(&mut self, id: ItemId) {
        self.trash_selected = false;
        self.assistant_selected = false;
        if !self.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Selects the trash region, clearing item selection.
    pub fn select_trash(&mut self) {
        self.clear();
        self.trash_selected = true;
    }

    /// Selects the assistant icon, clearing item selection.
    pub fn select_assistant(&mut self) {
        self.clear();
        self.assistant_selected = true;
    }

    /// Clears the selection entirely.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.trash_selected = false;
        self.assistant_selected = false;
    }

    /// Drops any selected ids not retained by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&ItemId) -> bool) {
        self.ids.retain(|id| keep(id));
    }
}

/// The single active clipboard payload, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipboard {
    /// Items the payload refers to.
    pub item_ids: Vec<ItemId>,
    /// Cut pastes as an id-preserving move; copy pastes as a duplicate.
    pub is_cut: bool,
    /// Parent the items lived in when the payload was taken.
    pub source_parent_id: Option<ItemId>,
}

/// Lifecycle of one tracked file upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    /// Bytes are still moving.
    InProgress,
    /// Finished; the row is garbage-collected after [`UPLOAD_GC_DELAY_MS`].
    Done {
        /// Unix ms at which the upload completed.
        completed_at: u64,
    },
    /// Failed; kept until the user dismisses it.
    Error(String),
}

/// Transient per-file upload progress row.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    /// Upload id, unique within the session.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f32,
    /// Current status.
    pub status: UploadStatus,
}

/// An in-flight icon drag. One pointer at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    /// Item under the pointer when the drag started.
    pub item_id: ItemId,
    /// Parent the dragged item started in (`None` = desktop root).
    pub source_parent_id: Option<ItemId>,
    /// Pointer position at pointer-down, in screen pixels.
    pub pointer_start: PixelPoint,
    /// Latest applied pointer position.
    pub pointer: PixelPoint,
    /// Pointer update waiting for the next animation frame.
    pub pending_pointer: Option<PixelPoint>,
    /// Start cell of every dragged member (the whole multi-selection when the
    /// grabbed item was part of one).
    pub members: Vec<(ItemId, GridPosition)>,
    /// Whether pointer travel has exceeded [`DRAG_THRESHOLD_PX`].
    pub active: bool,
}

impl DragSession {
    /// Ids of every dragged member, in drag order.
    pub fn member_ids(&self) -> Vec<ItemId> {
        self.members.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// An in-flight window title-bar move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMoveSession {
    /// Window being dragged.
    pub window_id: String,
    /// Pointer position at drag start.
    pub pointer_start: PixelPoint,
    /// Window position at drag start.
    pub position_start: PixelPoint,
}

/// An in-flight corner-handle window resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowResizeSession {
    /// Window being resized.
    pub window_id: String,
    /// Pointer position at resize start.
    pub pointer_start: PixelPoint,
    /// Window size at resize start.
    pub size_start: desktop_store_contract::PixelSize,
}

/// An in-flight marquee (rectangle) selection on the desktop background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarqueeSession {
    /// Pointer-down origin in local surface coordinates.
    pub origin: PixelPoint,
    /// Latest pointer position.
    pub pointer: PixelPoint,
    /// Shift held: prior selection is preserved instead of replaced.
    pub additive: bool,
}

/// Non-persisted interaction bookkeeping. At most one drag, one resize, and
/// one marquee may be active at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionState {
    /// Active icon drag.
    pub item_drag: Option<DragSession>,
    /// Active window title-bar move.
    pub window_move: Option<WindowMoveSession>,
    /// Active window resize.
    pub window_resize: Option<WindowResizeSession>,
    /// Active marquee selection.
    pub marquee: Option<MarqueeSession>,
    /// Last title-bar pointer-down, for double-click collapse detection.
    pub last_title_click: Option<(String, u64)>,
    /// Registered drop-target bounding boxes.
    pub drop_targets: DropTargetIndex,
}

/// Authoritative local desktop state. Always rendered as-is, regardless of
/// backend availability.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesktopState {
    /// Canonical ordered item collection.
    pub items: ItemRegistry,
    /// Open windows.
    pub windows: Vec<WindowState>,
    /// Monotonic z-index counter; the next opened or raised window gets
    /// `next_z` and the counter advances.
    pub next_z: u32,
    /// Current selection.
    pub selection: Selection,
    /// Active clipboard payload.
    pub clipboard: Option<Clipboard>,
    /// Tracked uploads.
    pub uploads: Vec<UploadProgress>,
    /// Owner profile, when known.
    pub profile: Option<Profile>,
}

impl DesktopState {
    /// Highest z-index currently assigned, if any window is open.
    pub fn top_z(&self) -> Option<u32> {
        self.windows.iter().map(|w| w.z_index).max()
    }

    /// Window lookup by id.
    pub fn window(&self, id: &str) -> Option<&WindowState> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Mutable window lookup by id.
    pub fn window_mut(&mut self, id: &str) -> Option<&mut WindowState> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// Builds the local cache payload.
    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            schema_version: DESKTOP_SNAPSHOT_SCHEMA_VERSION,
            items: self.items.all().to_vec(),
            windows: self.windows.clone(),
        }
    }

    /// Rebuilds state from a cached snapshot. Interaction state, selection,
    /// clipboard, and uploads start fresh.
    pub fn from_snapshot(snapshot: DesktopSnapshot) -> Self {
        let mut state = Self::default();
        state.items = ItemRegistry::from_items(snapshot.items);
        state.windows = snapshot.windows;
        state.next_z = state.top_z().map_or(1, |z| z.saturating_add(1));
        state
    }
}

/// Versioned full-state payload cached locally between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    /// Cache schema version; mismatches are discarded at load.
    pub schema_version: u32,
    /// All items, trashed included.
    pub items: Vec<DesktopItem>,
    /// All window state.
    pub windows: Vec<WindowState>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn selection_toggle_is_union_only() {
        let mut selection = Selection::default();
        selection.add(ItemId::from("a"));
        selection.add(ItemId::from("b"));
        selection.add(ItemId::from("a"));
        assert_eq!(selection.len(), 2);
        assert!(selection.contains(&ItemId::from("a")));
    }

    #[test]
    fn trash_selection_excludes_item_selection() {
        let mut selection = Selection::default();
        selection.select_only(ItemId::from("a"));
        selection.select_trash();
        assert!(selection.trash_selected);
        assert_eq!(selection.ids(), &[] as &[ItemId]);

        selection.add(ItemId::from("b"));
        assert!(!selection.trash_selected);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn snapshot_round_trip_restores_items_and_windows() {
        let mut state = DesktopState::default();
        state.items.insert(DesktopItem::new(
            ItemId::from("a"),
            desktop_store_contract::ItemKind::Text,
            "a",
            None,
            GridPosition { x: 0, y: 0 },
            1,
        ));
        state.next_z = 5;

        let restored = DesktopState::from_snapshot(state.snapshot());
        assert_eq!(restored.items.all(), state.items.all());
        assert_eq!(restored.windows, state.windows);
        assert!(restored.selection.is_empty());
    }
}
