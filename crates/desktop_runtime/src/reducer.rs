//! Reducer actions, side-effect intents, and transition logic for the desktop
//! engine.
//!
//! Every input event becomes a [`DesktopAction`]; [`reduce`] applies it to the
//! local state synchronously (optimistic mutation) and returns the
//! [`RuntimeEffect`]s the host must carry out asynchronously. Local state is
//! authoritative for rendering no matter what happens to those effects.

use thiserror::Error;

use desktop_store_contract::{
    AccountSnapshot, DesktopItem, GridPosition, ItemId, ItemKind, ItemPatch, ItemUpdates,
    PixelPoint, PixelSize, PushMessage, WidgetConfig, WindowContent,
};

use crate::drag::{DragEvent, DragPhase, DropTargetKind};
use crate::grid;
use crate::model::{
    Clipboard, DesktopSnapshot, DesktopState, DragSession, InteractionState, MarqueeSession,
    UploadProgress, UploadStatus, Viewport, WindowMoveSession, WindowResizeSession,
    DOUBLE_CLICK_MS, DRAG_THRESHOLD_PX, UPLOAD_GC_DELAY_MS,
};
use crate::registry::RegistryError;
use crate::selection::{self, ArrowDirection, MarqueeRect};
use crate::window_manager;

/// One external file landing on the desktop from the host OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFile {
    /// Original filename; becomes the item name.
    pub filename: String,
    /// Item kind the host inferred from the file type.
    pub kind: ItemKind,
}

/// Actions accepted by [`reduce`] to mutate [`DesktopState`].
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopAction {
    // Items.
    /// Create a new item near `target` under `parent`.
    CreateItem {
        /// Content category.
        kind: ItemKind,
        /// Display name.
        name: String,
        /// Destination parent (`None` = desktop root).
        parent: Option<ItemId>,
        /// Requested grid cell; conflicts are resolved outward.
        target: GridPosition,
    },
    /// Rename an item.
    RenameItem {
        /// Target item.
        id: ItemId,
        /// New display name.
        name: String,
    },
    /// Change an item's visitor visibility.
    SetItemPublic {
        /// Target item.
        id: ItemId,
        /// New flag value.
        is_public: bool,
    },
    /// Replace the text body of a text item.
    EditTextContent {
        /// Target item.
        id: ItemId,
        /// New body.
        text: String,
    },
    /// Replace the destination of a link item.
    SetItemUrl {
        /// Target item.
        id: ItemId,
        /// New destination.
        url: String,
    },
    /// Replace a widget item's typed configuration.
    SetWidgetConfig {
        /// Target item.
        id: ItemId,
        /// New configuration.
        config: WidgetConfig,
    },
    /// Move an item to a grid cell within its current parent.
    MoveItem {
        /// Target item.
        id: ItemId,
        /// Destination cell, taken as-is.
        cell: GridPosition,
    },
    /// Soft-delete a set of items.
    TrashItems {
        /// Items to trash.
        ids: Vec<ItemId>,
    },
    /// Restore a trashed item to a free cell near its old position.
    RestoreItem {
        /// Item to restore.
        id: ItemId,
    },
    /// Remove one item permanently.
    DeleteItemPermanently {
        /// Item to delete.
        id: ItemId,
    },
    /// Remove every trashed item permanently.
    EmptyTrash,
    /// Re-pack the desktop root into sequential cells, row-major.
    CleanUpDesktop {
        /// Number of grid columns currently visible.
        columns: i32,
    },
    /// Files dragged in from the host OS: creates one item per file, offset a
    /// row apart, plus an upload-progress row each.
    DropExternalFiles {
        /// Dropped files in drop order.
        files: Vec<ExternalFile>,
        /// Drop point in desktop surface pixels.
        point: PixelPoint,
    },

    // Clipboard.
    /// Record a cut clipboard payload.
    CutItems {
        /// Items to cut.
        ids: Vec<ItemId>,
    },
    /// Record a copy clipboard payload.
    CopyItems {
        /// Items to copy.
        ids: Vec<ItemId>,
    },
    /// Paste the clipboard under `parent` near `target`.
    Paste {
        /// Destination parent (`None` = desktop root).
        parent: Option<ItemId>,
        /// Cell the paste aims at.
        target: GridPosition,
    },

    // Selection.
    /// Plain click: select exactly one item.
    SelectItem {
        /// Item to select.
        id: ItemId,
    },
    /// Shift/Ctrl/Cmd click: add to the selection (union-only).
    ToggleSelectItem {
        /// Item to add.
        id: ItemId,
    },
    /// Select the trash region.
    SelectTrash,
    /// Select the assistant icon.
    SelectAssistant,
    /// Background click, Escape, or context-menu dismissal.
    ClearSelection,
    /// Pointer-down on empty desktop background: begin a marquee.
    BeginMarquee {
        /// Origin in local surface pixels.
        origin: PixelPoint,
        /// Shift held: preserve the prior selection.
        additive: bool,
    },
    /// Marquee pointer movement.
    UpdateMarquee {
        /// Current pointer position.
        pointer: PixelPoint,
    },
    /// Marquee pointer release.
    EndMarquee,
    /// Tab: cycle the selection through items by `(y, x)`.
    TabCycle,
    /// Arrow key: move the selection to the adjacent occupied cell.
    ArrowSelect {
        /// Direction pressed.
        direction: ArrowDirection,
    },
    /// Enter: open the sole selected item.
    ActivateSelection,
    /// Delete/Backspace: trash the full selection.
    TrashSelection,

    // Icon drag.
    /// Pointer-down on a draggable icon.
    BeginItemDrag {
        /// Grabbed item.
        item_id: ItemId,
        /// Pointer position in screen pixels.
        pointer: PixelPoint,
    },
    /// Raw pointer movement; coalesced until the next frame tick.
    DragPointerMoved {
        /// Current pointer position.
        pointer: PixelPoint,
    },
    /// Animation-frame tick: applies the latest coalesced pointer update.
    DragFrameTick,
    /// Pointer release: resolve the drop target and apply the outcome.
    EndItemDrag {
        /// Release position in screen pixels.
        pointer: PixelPoint,
    },
    /// Abort the active drag without dropping.
    CancelItemDrag,

    // Windows.
    /// Open (or re-focus) a window.
    OpenWindow {
        /// Dedup key.
        id: String,
        /// Title-bar text.
        title: String,
        /// Displayed content.
        content: WindowContent,
        /// Initial top-left corner.
        position: PixelPoint,
        /// Initial outer size.
        size: PixelSize,
    },
    /// Close a window.
    CloseWindow {
        /// Window to close.
        window_id: String,
    },
    /// Focus (raise) a window.
    FocusWindow {
        /// Window to focus.
        window_id: String,
    },
    /// Pointer-down on a title bar: second click within the double-click
    /// window toggles collapse, otherwise a move begins.
    TitlePointerDown {
        /// Window under the pointer.
        window_id: String,
        /// Pointer position in screen pixels.
        pointer: PixelPoint,
    },
    /// Title-bar drag movement.
    UpdateWindowMove {
        /// Current pointer position.
        pointer: PixelPoint,
        /// Current viewport, for clamping and edge snapping.
        viewport: Viewport,
    },
    /// Title-bar drag release.
    EndWindowMove,
    /// Pointer-down on the corner resize handle.
    BeginWindowResize {
        /// Window being resized.
        window_id: String,
        /// Pointer position at resize start.
        pointer: PixelPoint,
    },
    /// Resize drag movement.
    UpdateWindowResize {
        /// Current pointer position.
        pointer: PixelPoint,
    },
    /// Resize drag release.
    EndWindowResize,
    /// Maximize into the work area, or restore the pre-maximize geometry.
    ToggleMaximize {
        /// Target window.
        window_id: String,
        /// Current viewport.
        viewport: Viewport,
    },
    /// Hide a window until its next focus.
    MinimizeWindow {
        /// Target window.
        window_id: String,
    },
    /// Toggle window-shade collapse.
    ToggleCollapse {
        /// Target window.
        window_id: String,
    },

    // Uploads.
    /// A tracked upload began.
    UploadStarted {
        /// Upload id.
        id: String,
        /// Original filename.
        filename: String,
    },
    /// Upload progress changed.
    UploadProgressed {
        /// Upload id.
        id: String,
        /// Completed fraction in `0.0..=1.0`.
        progress: f32,
    },
    /// Upload finished successfully.
    UploadCompleted {
        /// Upload id.
        id: String,
    },
    /// Upload failed; the row stays until dismissed.
    UploadFailed {
        /// Upload id.
        id: String,
        /// Human-readable failure message.
        message: String,
    },
    /// User dismissed an upload row.
    DismissUpload {
        /// Upload id.
        id: String,
    },
    /// Periodic sweep removing completed upload rows past the GC delay.
    GcUploads,

    // Boot and sync.
    /// Hydrate from the locally cached snapshot.
    HydrateSnapshot {
        /// Cached payload.
        snapshot: DesktopSnapshot,
    },
    /// Replace state from a freshly fetched remote snapshot.
    ApplyRemoteSnapshot {
        /// Remote payload.
        snapshot: AccountSnapshot,
    },
    /// Apply a realtime push message (visitor sessions).
    ApplyPushMessage {
        /// Pushed payload.
        message: PushMessage,
    },
}

/// Side-effect intents emitted by [`reduce`] for the host to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEffect {
    /// Persist a newly created item immediately.
    SyncItemCreated(DesktopItem),
    /// Delete an item remotely immediately.
    SyncItemDeleted(ItemId),
    /// Persist an item position (per-id debounced downstream).
    SyncItemPosition {
        /// Moved item.
        id: ItemId,
        /// Final position.
        position: GridPosition,
    },
    /// Persist item metadata (coalesced per id downstream).
    SyncItemMetadata {
        /// Edited item.
        id: ItemId,
        /// Changed fields.
        updates: ItemUpdates,
    },
    /// Persist a batch of patches in one remote call, immediately.
    SyncItemBatch(Vec<ItemPatch>),
    /// Persist window state (debounced downstream, skipped for visitors).
    SyncWindows,
    /// Refresh the local full-state cache (debounced downstream).
    CacheSnapshot,
    /// Publish a cross-surface drag notification.
    PublishDrag(DragEvent),
    /// Open the referenced item (the host decides the window shape).
    OpenItem(ItemId),
    /// Surface a user-facing notification.
    Notify(String),
}

impl RuntimeEffect {
    fn is_sync(&self) -> bool {
        matches!(
            self,
            Self::SyncItemCreated(_)
                | Self::SyncItemDeleted(_)
                | Self::SyncItemPosition { .. }
                | Self::SyncItemMetadata { .. }
                | Self::SyncItemBatch(_)
                | Self::SyncWindows
        )
    }
}

/// Reducer errors for actions referencing missing state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReducerError {
    /// Item-level failure from the registry.
    #[error(transparent)]
    Item(#[from] RegistryError),
    /// The target window id was not found.
    #[error("window not found")]
    WindowNotFound,
    /// A drag/move/resize update arrived with no active session.
    #[error("no active interaction session")]
    NoActiveSession,
}

/// Applies a [`DesktopAction`] to the desktop state and collects the resulting
/// side effects.
///
/// # Errors
///
/// Returns [`ReducerError`] when an action references an item or window that
/// is not present, or a session that is not active.
pub fn reduce(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
    now_ms: u64,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::CreateItem {
            kind,
            name,
            parent,
            target,
        } => {
            let item = state.items.create(kind, name, parent, target, now_ms);
            effects.push(RuntimeEffect::SyncItemCreated(item));
        }
        DesktopAction::RenameItem { id, name } => {
            state.items.rename(&id, &name, now_ms)?;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    name: Some(name),
                    ..Default::default()
                },
            });
        }
        DesktopAction::SetItemPublic { id, is_public } => {
            state.items.set_public(&id, is_public, now_ms)?;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    is_public: Some(is_public),
                    ..Default::default()
                },
            });
        }
        DesktopAction::EditTextContent { id, text } => {
            state.items.set_text_content(&id, &text, now_ms)?;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    text_content: Some(text),
                    ..Default::default()
                },
            });
        }
        DesktopAction::SetItemUrl { id, url } => {
            state.items.set_url(&id, &url, now_ms)?;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    url: Some(url),
                    ..Default::default()
                },
            });
        }
        DesktopAction::SetWidgetConfig { id, config } => {
            state.items.set_widget_config(&id, config.clone(), now_ms)?;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    widget_config: Some(config),
                    ..Default::default()
                },
            });
        }
        DesktopAction::MoveItem { id, cell } => {
            let position = state.items.move_to_cell(&id, cell, now_ms)?;
            effects.push(RuntimeEffect::SyncItemPosition { id, position });
        }
        DesktopAction::TrashItems { ids } => {
            trash_items(state, &ids, now_ms, &mut effects)?;
        }
        DesktopAction::RestoreItem { id } => {
            state.items.restore(&id, now_ms)?;
            let position = state
                .items
                .get(&id)
                .ok_or(RegistryError::ItemNotFound)?
                .position;
            effects.push(RuntimeEffect::SyncItemMetadata {
                id,
                updates: ItemUpdates {
                    is_trashed: Some(false),
                    trashed_at: Some(None),
                    position: Some(position),
                    ..Default::default()
                },
            });
        }
        DesktopAction::DeleteItemPermanently { id } => {
            state.items.remove(&id)?;
            state.selection.retain(|selected| selected != &id);
            effects.push(RuntimeEffect::SyncItemDeleted(id));
        }
        DesktopAction::EmptyTrash => {
            let trashed: Vec<ItemId> =
                state.items.trashed().into_iter().map(|i| i.id.clone()).collect();
            for id in trashed {
                state.items.remove(&id)?;
                effects.push(RuntimeEffect::SyncItemDeleted(id));
            }
        }
        DesktopAction::CleanUpDesktop { columns } => {
            let columns = columns.max(1);
            let ordered = selection::tab_order(&state.items, None);
            let mut patches = Vec::with_capacity(ordered.len());
            for (index, id) in ordered.into_iter().enumerate() {
                let cell = GridPosition {
                    x: index as i32 % columns,
                    y: index as i32 / columns,
                };
                let position = state.items.move_to_cell(&id, cell, now_ms)?;
                patches.push(ItemPatch {
                    id,
                    updates: ItemUpdates {
                        position: Some(position),
                        ..Default::default()
                    },
                });
            }
            if !patches.is_empty() {
                effects.push(RuntimeEffect::SyncItemBatch(patches));
            }
        }
        DesktopAction::DropExternalFiles { files, point } => {
            let base = grid::cell_at_point(point);
            for (index, file) in files.into_iter().enumerate() {
                let target = GridPosition {
                    x: base.x,
                    y: base.y + index as i32,
                };
                let item =
                    state
                        .items
                        .create(file.kind, file.filename.clone(), None, target, now_ms);
                state.uploads.push(UploadProgress {
                    id: format!("upload-{}", item.id),
                    filename: file.filename,
                    progress: 0.0,
                    status: UploadStatus::InProgress,
                });
                effects.push(RuntimeEffect::SyncItemCreated(item));
            }
        }

        DesktopAction::CutItems { ids } => {
            set_clipboard(state, ids, true);
        }
        DesktopAction::CopyItems { ids } => {
            set_clipboard(state, ids, false);
        }
        DesktopAction::Paste { parent, target } => {
            let Some(clipboard) = state.clipboard.clone() else {
                return Ok(effects);
            };
            if clipboard.is_cut {
                // Ids that can no longer land in the destination are skipped
                // up front (deleted since the cut, the destination folder
                // itself, or an ancestor of it); the rest of the payload
                // still pastes. Nothing mutates unless it will succeed.
                let mut movable = clipboard.item_ids.clone();
                movable.retain(|id| state.items.get(id).is_some());
                if let Some(folder) = &parent {
                    let folder_ok = state
                        .items
                        .get(folder)
                        .is_some_and(|dest| dest.kind == ItemKind::Folder);
                    if folder_ok {
                        movable.retain(|id| id != folder && !state.items.is_ancestor(id, folder));
                    } else {
                        movable.clear();
                    }
                }
                let mut patches = Vec::with_capacity(movable.len());
                for id in &movable {
                    let position =
                        state
                            .items
                            .place(parent.as_ref(), target, std::slice::from_ref(id));
                    state.items.reparent(id, parent.clone(), position, now_ms)?;
                    patches.push(ItemPatch {
                        id: id.clone(),
                        updates: ItemUpdates {
                            parent_id: Some(parent.clone()),
                            position: Some(position),
                            ..Default::default()
                        },
                    });
                }
                state.clipboard = None;
                if !patches.is_empty() {
                    effects.push(RuntimeEffect::SyncItemBatch(patches));
                }
            } else {
                for id in &clipboard.item_ids {
                    let copy = state.items.duplicate(id, parent.clone(), target, now_ms)?;
                    effects.push(RuntimeEffect::SyncItemCreated(copy));
                }
            }
        }

        DesktopAction::SelectItem { id } => {
            if state.items.get(&id).is_none() {
                return Err(RegistryError::ItemNotFound.into());
            }
            state.selection.select_only(id);
        }
        DesktopAction::ToggleSelectItem { id } => {
            if state.items.get(&id).is_none() {
                return Err(RegistryError::ItemNotFound.into());
            }
            state.selection.add(id);
        }
        DesktopAction::SelectTrash => {
            state.selection.select_trash();
        }
        DesktopAction::SelectAssistant => {
            state.selection.select_assistant();
        }
        DesktopAction::ClearSelection => {
            state.selection.clear();
        }
        DesktopAction::BeginMarquee { origin, additive } => {
            interaction.marquee = Some(MarqueeSession {
                origin,
                pointer: origin,
                additive,
            });
        }
        DesktopAction::UpdateMarquee { pointer } => {
            let session = interaction.marquee.as_mut().ok_or(ReducerError::NoActiveSession)?;
            session.pointer = pointer;
        }
        DesktopAction::EndMarquee => {
            let session = interaction.marquee.take().ok_or(ReducerError::NoActiveSession)?;
            if !past_threshold(session.origin, session.pointer) {
                // An accidental click on the background clears the selection.
                state.selection.clear();
                return Ok(effects);
            }
            let rect = MarqueeRect::from_points(session.origin, session.pointer);
            let hits = selection::items_in_rect(&state.items, None, rect);
            if !session.additive {
                state.selection.clear();
            }
            for id in hits {
                state.selection.add(id);
            }
        }
        DesktopAction::TabCycle => {
            if let Some(next) = selection::next_in_tab_order(state, None) {
                state.selection.select_only(next);
            }
        }
        DesktopAction::ArrowSelect { direction } => {
            if let Some(next) = selection::adjacent_item(state, None, direction) {
                state.selection.select_only(next);
            }
        }
        DesktopAction::ActivateSelection => {
            if let Some(id) = state.selection.sole() {
                effects.push(RuntimeEffect::OpenItem(id.clone()));
            }
        }
        DesktopAction::TrashSelection => {
            let ids = state.selection.ids().to_vec();
            if !ids.is_empty() {
                trash_items(state, &ids, now_ms, &mut effects)?;
                state.selection.clear();
            }
        }

        DesktopAction::BeginItemDrag { item_id, pointer } => {
            let item = state.items.get(&item_id).ok_or(RegistryError::ItemNotFound)?;
            let source_parent_id = item.parent_id.clone();
            if !state.selection.contains(&item_id) {
                state.selection.select_only(item_id.clone());
            }
            let member_ids: Vec<ItemId> = if state.selection.len() > 1 {
                state.selection.ids().to_vec()
            } else {
                vec![item_id.clone()]
            };
            let members = member_ids
                .into_iter()
                .filter_map(|id| state.items.get(&id).map(|i| (id, i.position)))
                .collect();
            interaction.item_drag = Some(DragSession {
                item_id,
                source_parent_id,
                pointer_start: pointer,
                pointer,
                pending_pointer: None,
                members,
                active: false,
            });
        }
        DesktopAction::DragPointerMoved { pointer } => {
            let session = interaction.item_drag.as_mut().ok_or(ReducerError::NoActiveSession)?;
            session.pending_pointer = Some(pointer);
        }
        DesktopAction::DragFrameTick => {
            let session = interaction.item_drag.as_mut().ok_or(ReducerError::NoActiveSession)?;
            let Some(pointer) = session.pending_pointer.take() else {
                return Ok(effects);
            };
            session.pointer = pointer;
            if !session.active && past_threshold(session.pointer_start, pointer) {
                session.active = true;
                effects.push(RuntimeEffect::PublishDrag(DragEvent {
                    phase: DragPhase::Start,
                    item_id: session.item_id.clone(),
                    source_folder_id: session.source_parent_id.clone(),
                    pointer,
                }));
            } else if session.active {
                effects.push(RuntimeEffect::PublishDrag(DragEvent {
                    phase: DragPhase::Move,
                    item_id: session.item_id.clone(),
                    source_folder_id: session.source_parent_id.clone(),
                    pointer,
                }));
            }
        }
        DesktopAction::EndItemDrag { pointer } => {
            let session = interaction.item_drag.take().ok_or(ReducerError::NoActiveSession)?;
            let active = session.active || past_threshold(session.pointer_start, pointer);
            if !active {
                // Below the threshold this was a click; selection already
                // happened on pointer-down.
                return Ok(effects);
            }
            let member_ids = session.member_ids();
            let target = interaction.drop_targets.resolve(
                pointer,
                &member_ids,
                session.source_parent_id.as_ref(),
                &state.windows,
            );
            match target {
                Some(DropTargetKind::Trash) => {
                    trash_items(state, &member_ids, now_ms, &mut effects)?;
                    state.selection.clear();
                }
                Some(DropTargetKind::FolderWindow(folder)) | Some(DropTargetKind::FolderIcon(folder)) => {
                    let positions = crate::drag::folder_drop_positions(member_ids.len());
                    let mut patches = Vec::with_capacity(member_ids.len());
                    for (id, position) in member_ids.iter().zip(positions) {
                        state
                            .items
                            .reparent(id, Some(folder.clone()), position, now_ms)?;
                        patches.push(ItemPatch {
                            id: id.clone(),
                            updates: ItemUpdates {
                                parent_id: Some(Some(folder.clone())),
                                position: Some(position),
                                ..Default::default()
                            },
                        });
                    }
                    effects.push(RuntimeEffect::SyncItemBatch(patches));
                }
                Some(DropTargetKind::DesktopSurface) => {
                    let drop_cell = grid::cell_at_point(pointer);
                    if let [(id, _)] = session.members.as_slice() {
                        let resolved =
                            state
                                .items
                                .place(None, drop_cell, std::slice::from_ref(id));
                        let position = state.items.move_to_cell(id, resolved, now_ms)?;
                        effects.push(RuntimeEffect::SyncItemPosition {
                            id: id.clone(),
                            position,
                        });
                    } else {
                        let anchor = session
                            .members
                            .iter()
                            .find(|(id, _)| id == &session.item_id)
                            .map(|(_, start)| *start)
                            .unwrap_or(drop_cell);
                        let dx = drop_cell.x - anchor.x;
                        let dy = drop_cell.y - anchor.y;
                        for (id, start) in &session.members {
                            let position = state
                                .items
                                .move_to_cell(id, start.offset_clamped(dx, dy), now_ms)?;
                            effects.push(RuntimeEffect::SyncItemPosition {
                                id: id.clone(),
                                position,
                            });
                        }
                    }
                }
                None => {}
            }
            effects.push(RuntimeEffect::PublishDrag(DragEvent {
                phase: DragPhase::End,
                item_id: session.item_id,
                source_folder_id: session.source_parent_id,
                pointer,
            }));
        }
        DesktopAction::CancelItemDrag => {
            if let Some(session) = interaction.item_drag.take() {
                if session.active {
                    effects.push(RuntimeEffect::PublishDrag(DragEvent {
                        phase: DragPhase::End,
                        item_id: session.item_id,
                        source_folder_id: session.source_parent_id,
                        pointer: session.pointer,
                    }));
                }
            }
        }

        DesktopAction::OpenWindow {
            id,
            title,
            content,
            position,
            size,
        } => {
            window_manager::open_window(state, &id, &title, content, position, size);
            effects.push(RuntimeEffect::SyncWindows);
        }
        DesktopAction::CloseWindow { window_id } => {
            if !window_manager::close_window(state, &window_id) {
                return Err(ReducerError::WindowNotFound);
            }
            effects.push(RuntimeEffect::SyncWindows);
        }
        DesktopAction::FocusWindow { window_id } => {
            if state.window(&window_id).is_none() {
                return Err(ReducerError::WindowNotFound);
            }
            if window_manager::focus_window(state, &window_id) {
                effects.push(RuntimeEffect::SyncWindows);
            }
        }
        DesktopAction::TitlePointerDown { window_id, pointer } => {
            let window = state.window(&window_id).ok_or(ReducerError::WindowNotFound)?;
            let position_start = window.position;
            let double_click = matches!(
                &interaction.last_title_click,
                Some((id, at)) if id == &window_id && now_ms.saturating_sub(*at) <= DOUBLE_CLICK_MS
            );
            if double_click {
                interaction.last_title_click = None;
                interaction.window_move = None;
                window_manager::toggle_collapse(state, &window_id);
                effects.push(RuntimeEffect::SyncWindows);
            } else {
                interaction.last_title_click = Some((window_id.clone(), now_ms));
                window_manager::focus_window(state, &window_id);
                interaction.window_move = Some(WindowMoveSession {
                    window_id,
                    pointer_start: pointer,
                    position_start,
                });
            }
        }
        DesktopAction::UpdateWindowMove { pointer, viewport } => {
            let session = interaction.window_move.as_ref().ok_or(ReducerError::NoActiveSession)?;
            let candidate = PixelPoint {
                x: session.position_start.x + (pointer.x - session.pointer_start.x),
                y: session.position_start.y + (pointer.y - session.pointer_start.y),
            };
            window_manager::apply_move(state, &session.window_id, candidate, viewport);
        }
        DesktopAction::EndWindowMove => {
            if interaction.window_move.take().is_some() {
                effects.push(RuntimeEffect::SyncWindows);
            }
        }
        DesktopAction::BeginWindowResize { window_id, pointer } => {
            let window = state.window(&window_id).ok_or(ReducerError::WindowNotFound)?;
            interaction.window_resize = Some(WindowResizeSession {
                window_id,
                pointer_start: pointer,
                size_start: window.size,
            });
        }
        DesktopAction::UpdateWindowResize { pointer } => {
            let session = interaction.window_resize.as_ref().ok_or(ReducerError::NoActiveSession)?;
            let size = PixelSize {
                width: session.size_start.width + (pointer.x - session.pointer_start.x),
                height: session.size_start.height + (pointer.y - session.pointer_start.y),
            };
            window_manager::apply_resize(state, &session.window_id, size);
        }
        DesktopAction::EndWindowResize => {
            if interaction.window_resize.take().is_some() {
                effects.push(RuntimeEffect::SyncWindows);
            }
        }
        DesktopAction::ToggleMaximize { window_id, viewport } => {
            if !window_manager::toggle_maximize(state, &window_id, viewport) {
                return Err(ReducerError::WindowNotFound);
            }
            effects.push(RuntimeEffect::SyncWindows);
        }
        DesktopAction::MinimizeWindow { window_id } => {
            if !window_manager::minimize_window(state, &window_id) {
                return Err(ReducerError::WindowNotFound);
            }
            effects.push(RuntimeEffect::SyncWindows);
        }
        DesktopAction::ToggleCollapse { window_id } => {
            if !window_manager::toggle_collapse(state, &window_id) {
                return Err(ReducerError::WindowNotFound);
            }
            effects.push(RuntimeEffect::SyncWindows);
        }

        DesktopAction::UploadStarted { id, filename } => {
            state.uploads.push(UploadProgress {
                id,
                filename,
                progress: 0.0,
                status: UploadStatus::InProgress,
            });
        }
        DesktopAction::UploadProgressed { id, progress } => {
            if let Some(upload) = state.uploads.iter_mut().find(|u| u.id == id) {
                upload.progress = progress.clamp(0.0, 1.0);
            }
        }
        DesktopAction::UploadCompleted { id } => {
            if let Some(upload) = state.uploads.iter_mut().find(|u| u.id == id) {
                upload.progress = 1.0;
                upload.status = UploadStatus::Done { completed_at: now_ms };
            }
        }
        DesktopAction::UploadFailed { id, message } => {
            if let Some(upload) = state.uploads.iter_mut().find(|u| u.id == id) {
                upload.status = UploadStatus::Error(message.clone());
            }
            effects.push(RuntimeEffect::Notify(message));
        }
        DesktopAction::DismissUpload { id } => {
            state.uploads.retain(|u| u.id != id);
        }
        DesktopAction::GcUploads => {
            state.uploads.retain(|u| match u.status {
                UploadStatus::Done { completed_at } => {
                    now_ms < completed_at.saturating_add(UPLOAD_GC_DELAY_MS)
                }
                _ => true,
            });
        }

        DesktopAction::HydrateSnapshot { snapshot } => {
            *state = DesktopState::from_snapshot(snapshot);
        }
        DesktopAction::ApplyRemoteSnapshot { snapshot } => {
            state.items.replace_all(snapshot.items);
            state.windows = snapshot.windows;
            state.profile = Some(snapshot.profile);
            state.next_z = state.top_z().map_or(1, |z| z.saturating_add(1));
            state.selection.clear();
        }
        DesktopAction::ApplyPushMessage { message } => match message {
            PushMessage::Snapshot(snapshot) => {
                state.items.replace_all(snapshot.items);
                state.windows = snapshot.windows;
                state.profile = Some(snapshot.profile);
                state.next_z = state.top_z().map_or(1, |z| z.saturating_add(1));
            }
            PushMessage::Items(items) => {
                for item in items {
                    state.items.upsert(item);
                }
            }
            PushMessage::Windows(windows) => {
                state.windows = windows;
                state.next_z = state.top_z().map_or(1, |z| z.saturating_add(1));
            }
            PushMessage::Profile(profile) => {
                state.profile = Some(profile);
            }
        },
    }

    if effects.iter().any(RuntimeEffect::is_sync) {
        effects.push(RuntimeEffect::CacheSnapshot);
    }
    Ok(effects)
}

fn set_clipboard(state: &mut DesktopState, ids: Vec<ItemId>, is_cut: bool) {
    if ids.is_empty() {
        return;
    }
    let source_parent_id = state
        .items
        .get(&ids[0])
        .and_then(|item| item.parent_id.clone());
    state.clipboard = Some(Clipboard {
        item_ids: ids,
        is_cut,
        source_parent_id,
    });
}

fn trash_items(
    state: &mut DesktopState,
    ids: &[ItemId],
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    let mut patches = Vec::with_capacity(ids.len());
    for id in ids {
        state.items.trash(id, now_ms)?;
        let trashed_at = state.items.get(id).and_then(|i| i.trashed_at);
        patches.push(ItemPatch {
            id: id.clone(),
            updates: ItemUpdates {
                is_trashed: Some(true),
                trashed_at: Some(trashed_at),
                ..Default::default()
            },
        });
    }
    if !patches.is_empty() {
        effects.push(RuntimeEffect::SyncItemBatch(patches));
    }
    Ok(())
}

fn past_threshold(start: PixelPoint, current: PixelPoint) -> bool {
    let dx = (current.x - start.x) as i64;
    let dy = (current.y - start.y) as i64;
    dx * dx + dy * dy > (DRAG_THRESHOLD_PX as i64).pow(2)
}
