//! Drag/drop orchestration: the drop-target spatial index and the typed
//! cross-surface drag event bus.
//!
//! Drop targets are registered bounding boxes with priority tags, queried by
//! pointer coordinate; nothing here knows how a target is rendered. The bus
//! lets folder windows and the desktop surface follow a drag that crosses
//! component boundaries without holding references to each other.

use desktop_store_contract::{GridPosition, ItemId, PixelPoint, WindowState};

use crate::model::FOLDER_COLUMNS;

/// Height of the title-bar strip that keeps occluding the desktop while a
/// window is collapsed.
pub const TITLE_BAR_HEIGHT: i32 = 28;

/// Axis-aligned bounding box in desktop pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelRect {
    /// Half-open containment test.
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// What a registered drop region represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTargetKind {
    /// The trash region; dropped items are soft-deleted.
    Trash,
    /// An open folder window for the referenced folder.
    FolderWindow(ItemId),
    /// A folder icon on the desktop surface.
    FolderIcon(ItemId),
    /// The desktop surface itself.
    DesktopSurface,
}

impl DropTargetKind {
    fn priority(&self) -> u8 {
        match self {
            Self::Trash => 3,
            Self::FolderWindow(_) => 2,
            Self::FolderIcon(_) => 1,
            Self::DesktopSurface => 0,
        }
    }

    /// Folder that would receive the drop, when the target is one.
    pub fn folder_id(&self) -> Option<&ItemId> {
        match self {
            Self::FolderWindow(id) | Self::FolderIcon(id) => Some(id),
            _ => None,
        }
    }
}

/// One registered drop region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    /// Stable registration key; re-registering replaces the previous rect.
    pub region_id: String,
    /// Target semantics.
    pub kind: DropTargetKind,
    /// Current bounding box.
    pub rect: PixelRect,
    /// Stacking hint for overlapping window targets; higher wins within the
    /// same priority tier.
    pub z: u32,
}

/// Registered drop-target bounding boxes, queried by coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropTargetIndex {
    targets: Vec<DropTarget>,
}

impl DropTargetIndex {
    /// Registers a target, replacing any previous registration for the same
    /// `region_id`.
    pub fn register(&mut self, target: DropTarget) {
        self.unregister(&target.region_id);
        self.targets.push(target);
    }

    /// Removes a registration. Unknown ids are ignored.
    pub fn unregister(&mut self, region_id: &str) {
        self.targets.retain(|t| t.region_id != region_id);
    }

    /// Currently registered targets.
    pub fn targets(&self) -> &[DropTarget] {
        &self.targets
    }

    /// Resolves the topmost eligible drop target under `point`.
    ///
    /// Priority: trash, then folder windows, then folder icons, then the
    /// desktop surface. Folder targets are excluded when the folder is among
    /// the dragged items (a folder can never be dropped into itself or its own
    /// open view) or is the drag's source folder. The desktop surface only
    /// wins when no non-minimized window occludes the pointer.
    pub fn resolve(
        &self,
        point: PixelPoint,
        dragged: &[ItemId],
        source_folder: Option<&ItemId>,
        windows: &[WindowState],
    ) -> Option<DropTargetKind> {
        self.targets
            .iter()
            .filter(|target| target.rect.contains(point))
            .filter(|target| match target.kind.folder_id() {
                Some(folder) => !dragged.contains(folder) && Some(folder) != source_folder,
                None => true,
            })
            .filter(|target| {
                target.kind != DropTargetKind::DesktopSurface
                    || !window_occludes(windows, point)
            })
            .max_by_key(|target| (target.kind.priority(), target.z))
            .map(|target| target.kind.clone())
    }
}

fn window_occludes(windows: &[WindowState], point: PixelPoint) -> bool {
    windows.iter().any(|window| {
        if window.minimized {
            return false;
        }
        let height = if window.collapsed {
            TITLE_BAR_HEIGHT
        } else {
            window.size.height
        };
        PixelRect {
            x: window.position.x,
            y: window.position.y,
            width: window.size.width,
            height,
        }
        .contains(point)
    })
}

/// Phase of a cross-surface drag notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Pointer travel crossed the drag threshold.
    Start,
    /// Frame-throttled pointer movement.
    Move,
    /// Pointer released (or the drag was cancelled).
    End,
}

/// Cross-surface drag notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEvent {
    /// Notification phase.
    pub phase: DragPhase,
    /// Item under the pointer when the drag started.
    pub item_id: ItemId,
    /// Folder the drag originated in (`None` = desktop root).
    pub source_folder_id: Option<ItemId>,
    /// Current pointer position in screen pixels.
    pub pointer: PixelPoint,
}

/// Token returned by [`DragBus::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Typed publish/subscribe channel for drag notifications.
#[derive(Default)]
pub struct DragBus {
    next_id: u64,
    subscribers: Vec<(u64, Box<dyn FnMut(&DragEvent)>)>,
}

impl std::fmt::Debug for DragBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl DragBus {
    /// Registers a subscriber and returns its unsubscribe token.
    pub fn subscribe(&mut self, callback: impl FnMut(&DragEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        self.subscribers.push((self.next_id, Box::new(callback)));
        SubscriptionId(self.next_id)
    }

    /// Removes a subscriber. Unknown tokens are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id.0);
    }

    /// Delivers `event` to every subscriber in registration order.
    pub fn publish(&mut self, event: &DragEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }
}

/// Sequential placeholder positions assigned when `count` items land in a
/// folder: `(index % columns, index / columns)`.
pub fn folder_drop_positions(count: usize) -> Vec<GridPosition> {
    (0..count as i32)
        .map(|index| GridPosition {
            x: index % FOLDER_COLUMNS,
            y: index / FOLDER_COLUMNS,
        })
        .collect()
}
