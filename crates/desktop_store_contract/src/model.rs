//! Persisted data model for desktop items, windows, and account snapshots.

use serde::{Deserialize, Serialize};

/// Stable identifier for a desktop item. Server-assignable, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the account owning a desktop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Integer grid cell in desktop-root coordinates. Both axes are kept `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl GridPosition {
    /// Clamps both coordinates to the non-negative quadrant.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.max(0),
            y: self.y.max(0),
        }
    }

    /// Offsets the cell by a signed delta, clamping the result to `>= 0`.
    pub fn offset_clamped(self, dx: i32, dy: i32) -> Self {
        Self {
            x: (self.x + dx).max(0),
            y: (self.y + dy).max(0),
        }
    }
}

/// Content category of a desktop item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Container for other items.
    Folder,
    /// Plain-text document.
    Text,
    /// Image file.
    Image,
    /// Video file.
    Video,
    /// Audio file.
    Audio,
    /// PDF document.
    Pdf,
    /// External hyperlink.
    Link,
    /// Embedded widget with typed configuration.
    Widget,
}

/// Per-widget configuration, dispatched exhaustively by widget type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetConfig {
    /// Clock face.
    Clock {
        /// Whether the seconds hand/digits are shown.
        show_seconds: bool,
    },
    /// Weather tile.
    Weather {
        /// Free-form location query.
        location: String,
    },
    /// Sticky note.
    StickyNote {
        /// Background color token.
        color: String,
    },
}

/// Type-specific payload carried alongside the common item fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemPayload {
    /// Document body for text items.
    #[serde(default)]
    pub text_content: Option<String>,
    /// Destination for link items.
    #[serde(default)]
    pub url: Option<String>,
    /// Configuration for widget items.
    #[serde(default)]
    pub widget_config: Option<WidgetConfig>,
    /// Opaque reference into the external file store for media items.
    #[serde(default)]
    pub file_ref: Option<String>,
}

/// One item placed on the desktop or inside a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopItem {
    /// Unique, stable id.
    pub id: ItemId,
    /// Content category.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// Owning folder; `None` means the desktop root. Exactly one parent, acyclic.
    pub parent_id: Option<ItemId>,
    /// Grid cell, meaningful only among siblings sharing `parent_id`.
    pub position: GridPosition,
    /// Whether the item is visible to visitor sessions.
    pub is_public: bool,
    /// Soft-delete flag.
    pub is_trashed: bool,
    /// Unix ms at which the item was trashed.
    pub trashed_at: Option<u64>,
    /// Unix ms creation timestamp.
    pub created_at: u64,
    /// Unix ms of the latest mutation; monotonic per item.
    pub updated_at: u64,
    /// Type-specific payload.
    #[serde(default)]
    pub payload: ItemPayload,
}

impl DesktopItem {
    /// Creates a fresh, non-trashed, private item stamped with `now_ms`.
    pub fn new(
        id: ItemId,
        kind: ItemKind,
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        position: GridPosition,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            parent_id,
            position: position.clamped(),
            is_public: false,
            is_trashed: false,
            trashed_at: None,
            created_at: now_ms,
            updated_at: now_ms,
            payload: ItemPayload::default(),
        }
    }
}

/// Partial update for one item. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemUpdates {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New parent (`Some(None)` moves the item to the desktop root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<ItemId>>,
    /// New grid cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    /// New visibility flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// New trash flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_trashed: Option<bool>,
    /// New trashed-at stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed_at: Option<Option<u64>>,
    /// New text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// New link destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// New widget configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<WidgetConfig>,
}

impl ItemUpdates {
    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the set fields to `item`, leaving everything else untouched.
    ///
    /// The caller is responsible for stamping `updated_at`.
    pub fn apply_to(&self, item: &mut DesktopItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            item.parent_id = parent_id.clone();
        }
        if let Some(position) = self.position {
            item.position = position.clamped();
        }
        if let Some(is_public) = self.is_public {
            item.is_public = is_public;
        }
        if let Some(is_trashed) = self.is_trashed {
            item.is_trashed = is_trashed;
        }
        if let Some(trashed_at) = self.trashed_at {
            item.trashed_at = trashed_at;
        }
        if let Some(text_content) = &self.text_content {
            item.payload.text_content = Some(text_content.clone());
        }
        if let Some(url) = &self.url {
            item.payload.url = Some(url.clone());
        }
        if let Some(widget_config) = &self.widget_config {
            item.payload.widget_config = Some(widget_config.clone());
        }
    }

    /// Merges `later` into `self`, with `later` winning on overlap.
    pub fn merge(&mut self, later: ItemUpdates) {
        macro_rules! take {
            ($field:ident) => {
                if later.$field.is_some() {
                    self.$field = later.$field;
                }
            };
        }
        take!(name);
        take!(parent_id);
        take!(position);
        take!(is_public);
        take!(is_trashed);
        take!(trashed_at);
        take!(text_content);
        take!(url);
        take!(widget_config);
    }
}

/// An `{id, updates}` pair as accepted by the remote patch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// Target item.
    pub id: ItemId,
    /// Fields to change.
    pub updates: ItemUpdates,
}

/// A point in desktop pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal offset from the viewport origin.
    pub x: i32,
    /// Vertical offset from the viewport origin.
    pub y: i32,
}

/// A size in desktop pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// Saved geometry used to restore a window after maximize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    /// Top-left corner.
    pub position: PixelPoint,
    /// Outer size.
    pub size: PixelSize,
}

/// What an open window displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowContent {
    /// Folder view over the referenced folder item.
    Folder(ItemId),
    /// Text editor over the referenced text item.
    TextEditor(ItemId),
    /// Media viewer over the referenced media item.
    MediaViewer(ItemId),
    /// Engine-external content keyed by an opaque tag.
    Custom(String),
}

impl WindowContent {
    /// Item backing this window, when there is one.
    pub fn content_id(&self) -> Option<&ItemId> {
        match self {
            Self::Folder(id) | Self::TextEditor(id) | Self::MediaViewer(id) => Some(id),
            Self::Custom(_) => None,
        }
    }
}

/// Geometry and stacking state of one open window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    /// Dedup key: opening an id that is already open re-focuses it.
    pub id: String,
    /// Title-bar text.
    pub title: String,
    /// Top-left corner in pixel space.
    pub position: PixelPoint,
    /// Outer size in pixel space.
    pub size: PixelSize,
    /// Stacking order; higher draws on top. Assigned by a monotonic counter.
    pub z_index: u32,
    /// Hidden until next focus.
    pub minimized: bool,
    /// Filling the work area; `restore_bounds` holds the prior geometry.
    pub maximized: bool,
    /// Window-shade state: only the title bar is shown.
    pub collapsed: bool,
    /// Geometry snapshot taken when maximizing.
    pub restore_bounds: Option<WindowBounds>,
    /// Displayed content.
    pub content: WindowContent,
}

/// Public profile data pushed to visitor sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning account.
    pub account_id: AccountId,
    /// Display name shown in the menu bar.
    pub display_name: String,
    /// Whether the desktop is browsable by visitors.
    pub is_public: bool,
}

/// Full item + window + profile snapshot for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// All items, trashed included.
    pub items: Vec<DesktopItem>,
    /// All persisted window state.
    pub windows: Vec<WindowState>,
    /// Owner profile.
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn widget_config_serializes_as_tagged_union() {
        let config = WidgetConfig::Weather {
            location: "Lisbon".to_string(),
        };
        let value = serde_json::to_value(&config).expect("serialize widget config");
        assert_eq!(value, json!({"widget": "weather", "location": "Lisbon"}));

        let clock: WidgetConfig =
            serde_json::from_value(json!({"widget": "clock", "show_seconds": true}))
                .expect("deserialize clock");
        assert_eq!(clock, WidgetConfig::Clock { show_seconds: true });
    }

    #[test]
    fn item_updates_merge_prefers_later_fields() {
        let mut first = ItemUpdates {
            name: Some("a".to_string()),
            position: Some(GridPosition { x: 1, y: 1 }),
            ..Default::default()
        };
        let second = ItemUpdates {
            position: Some(GridPosition { x: 2, y: 0 }),
            is_public: Some(true),
            ..Default::default()
        };
        first.merge(second);
        assert_eq!(first.name.as_deref(), Some("a"));
        assert_eq!(first.position, Some(GridPosition { x: 2, y: 0 }));
        assert_eq!(first.is_public, Some(true));
    }

    #[test]
    fn item_updates_parent_id_distinguishes_root_from_untouched() {
        let to_root = ItemUpdates {
            parent_id: Some(None),
            ..Default::default()
        };
        let untouched = ItemUpdates::default();
        assert!(!to_root.is_empty());
        assert!(untouched.is_empty());

        let value = serde_json::to_value(&to_root).expect("serialize");
        assert_eq!(value, json!({"parent_id": null}));
    }

    #[test]
    fn grid_position_offset_clamps_to_origin() {
        let pos = GridPosition { x: 1, y: 0 };
        assert_eq!(pos.offset_clamped(-5, 3), GridPosition { x: 0, y: 3 });
    }

    #[test]
    fn desktop_item_round_trips_through_json() {
        let mut item = DesktopItem::new(
            ItemId::from("w1"),
            ItemKind::Widget,
            "clock",
            Some(ItemId::from("folder-1")),
            GridPosition { x: 2, y: 3 },
            42,
        );
        item.payload.widget_config = Some(WidgetConfig::Clock { show_seconds: false });

        let value = serde_json::to_value(&item).expect("serialize item");
        let back: DesktopItem = serde_json::from_value(value).expect("deserialize item");
        assert_eq!(back, item);
    }
}
