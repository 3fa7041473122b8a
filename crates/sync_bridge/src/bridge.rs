//! Write scheduling between the reducer's effect intents and the remote store.
//!
//! Creates, deletes, and structural batches (trash, restore, reparent) go out
//! immediately. Position and metadata edits are debounced per item id so a
//! drag or a burst of edits collapses into one remote patch carrying the final
//! value. Window geometry and the local snapshot cache get their own slower
//! tiers. The bridge is sans-IO: callers feed it the clock and execute the
//! [`SyncCommand`]s it emits.

use desktop_runtime::model::DesktopState;
use desktop_runtime::reducer::RuntimeEffect;
use desktop_store_contract::{DesktopItem, ItemId, ItemPatch, ItemUpdates, WindowState};

use crate::debounce::KeyedDebounce;

/// Quiet period before a per-item position or metadata patch goes remote.
pub const ITEM_POSITION_DEBOUNCE_MS: u64 = 500;
/// Quiet period before the local full-state cache is rewritten.
pub const SNAPSHOT_CACHE_DEBOUNCE_MS: u64 = 1000;
/// Quiet period before window geometry is written to the local cache.
pub const WINDOW_CACHE_DEBOUNCE_MS: u64 = 300;
/// Quiet period before window geometry is written to the remote store.
pub const WINDOW_REMOTE_DEBOUNCE_MS: u64 = 2000;

/// Who is driving this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The account owner; every write tier is active.
    Owner,
    /// A visitor viewing a public desktop; window geometry is never
    /// persisted, locally or remotely.
    Visitor,
}

/// A write for the host to execute. Remote commands map onto
/// [`desktop_store_contract::RemoteItemStore`] calls; cache commands target
/// local storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    /// Persist a new item remotely.
    CreateItem(DesktopItem),
    /// Delete an item remotely.
    DeleteItem(ItemId),
    /// Apply partial updates remotely in one call.
    PatchItems(Vec<ItemPatch>),
    /// Replace the account's window list remotely.
    PutWindows(Vec<WindowState>),
    /// Write window geometry to the local cache.
    CacheWindows(Vec<WindowState>),
    /// Rewrite the local full-state snapshot cache from current state.
    CacheSnapshot,
}

/// User-facing notice that a background write failed. The local edit is kept;
/// the write is dropped, not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotification {
    /// Human-readable message.
    pub message: String,
}

/// Debounced write scheduler for one session.
#[derive(Debug)]
pub struct SyncBridge {
    mode: SessionMode,
    item_updates: KeyedDebounce<ItemId, ItemUpdates>,
    window_cache: KeyedDebounce<(), Vec<WindowState>>,
    window_remote: KeyedDebounce<(), Vec<WindowState>>,
    snapshot: KeyedDebounce<(), ()>,
    notifications: Vec<SyncNotification>,
}

impl SyncBridge {
    /// Creates a bridge for the given session mode.
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            item_updates: KeyedDebounce::new(ITEM_POSITION_DEBOUNCE_MS),
            window_cache: KeyedDebounce::new(WINDOW_CACHE_DEBOUNCE_MS),
            window_remote: KeyedDebounce::new(WINDOW_REMOTE_DEBOUNCE_MS),
            snapshot: KeyedDebounce::new(SNAPSHOT_CACHE_DEBOUNCE_MS),
            notifications: Vec::new(),
        }
    }

    /// Session mode this bridge was created with.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// A new item exists locally; persist it immediately.
    pub fn note_created(&mut self, item: DesktopItem) -> Vec<SyncCommand> {
        vec![SyncCommand::CreateItem(item)]
    }

    /// An item was removed locally; any pending patch for it is dropped and
    /// the delete goes out immediately.
    pub fn note_deleted(&mut self, id: ItemId) -> Vec<SyncCommand> {
        self.item_updates.cancel(&id);
        vec![SyncCommand::DeleteItem(id)]
    }

    /// A structural batch (trash, restore, reparent, clean-up) goes out
    /// immediately in one call.
    pub fn note_batch(&mut self, patches: Vec<ItemPatch>) -> Vec<SyncCommand> {
        if patches.is_empty() {
            return Vec::new();
        }
        vec![SyncCommand::PatchItems(patches)]
    }

    /// An item moved; its patch fires after the position tier's quiet period,
    /// carrying only the final value.
    pub fn note_position(
        &mut self,
        id: ItemId,
        position: desktop_store_contract::GridPosition,
        now_ms: u64,
    ) {
        let updates = ItemUpdates {
            position: Some(position),
            ..Default::default()
        };
        self.item_updates
            .arm_merge(id, updates, now_ms, ItemUpdates::merge);
    }

    /// Item metadata changed; coalesced per id with any pending updates.
    pub fn note_metadata(&mut self, id: ItemId, updates: ItemUpdates, now_ms: u64) {
        if updates.is_empty() {
            return;
        }
        self.item_updates
            .arm_merge(id, updates, now_ms, ItemUpdates::merge);
    }

    /// Window geometry changed. Both window tiers arm for owners; visitor
    /// sessions never persist window geometry anywhere.
    pub fn note_windows(&mut self, windows: &[WindowState], now_ms: u64) {
        if self.mode == SessionMode::Visitor {
            return;
        }
        self.window_cache.arm((), windows.to_vec(), now_ms);
        self.window_remote.arm((), windows.to_vec(), now_ms);
    }

    /// Local state changed in a way worth re-caching.
    pub fn note_snapshot(&mut self, now_ms: u64) {
        self.snapshot.arm((), (), now_ms);
    }

    /// Routes one reducer effect into the appropriate tier. Effects that are
    /// not sync concerns (drag notifications, open-item, user notices) emit
    /// nothing; the host dispatches those itself.
    pub fn absorb_effect(
        &mut self,
        effect: &RuntimeEffect,
        state: &DesktopState,
        now_ms: u64,
    ) -> Vec<SyncCommand> {
        match effect {
            RuntimeEffect::SyncItemCreated(item) => self.note_created(item.clone()),
            RuntimeEffect::SyncItemDeleted(id) => self.note_deleted(id.clone()),
            RuntimeEffect::SyncItemPosition { id, position } => {
                self.note_position(id.clone(), *position, now_ms);
                Vec::new()
            }
            RuntimeEffect::SyncItemMetadata { id, updates } => {
                self.note_metadata(id.clone(), updates.clone(), now_ms);
                Vec::new()
            }
            RuntimeEffect::SyncItemBatch(patches) => self.note_batch(patches.clone()),
            RuntimeEffect::SyncWindows => {
                self.note_windows(&state.windows, now_ms);
                Vec::new()
            }
            RuntimeEffect::CacheSnapshot => {
                self.note_snapshot(now_ms);
                Vec::new()
            }
            RuntimeEffect::PublishDrag(_)
            | RuntimeEffect::OpenItem(_)
            | RuntimeEffect::Notify(_) => Vec::new(),
        }
    }

    /// Emits every command whose quiet period has elapsed. Due item patches
    /// are combined into one batch.
    pub fn poll(&mut self, now_ms: u64) -> Vec<SyncCommand> {
        let mut commands = Vec::new();
        let patches: Vec<ItemPatch> = self
            .item_updates
            .poll(now_ms)
            .into_iter()
            .map(|(id, updates)| ItemPatch { id, updates })
            .collect();
        if !patches.is_empty() {
            commands.push(SyncCommand::PatchItems(patches));
        }
        if let Some(((), windows)) = self.window_cache.poll(now_ms).pop() {
            commands.push(SyncCommand::CacheWindows(windows));
        }
        if let Some(((), windows)) = self.window_remote.poll(now_ms).pop() {
            commands.push(SyncCommand::PutWindows(windows));
        }
        if self.snapshot.poll(now_ms).pop().is_some() {
            commands.push(SyncCommand::CacheSnapshot);
        }
        commands
    }

    /// Emits everything pending regardless of quiet periods. Called on
    /// session teardown so trailing edits are not lost.
    pub fn drain(&mut self) -> Vec<SyncCommand> {
        let mut commands = Vec::new();
        let patches: Vec<ItemPatch> = self
            .item_updates
            .flush()
            .into_iter()
            .map(|(id, updates)| ItemPatch { id, updates })
            .collect();
        if !patches.is_empty() {
            commands.push(SyncCommand::PatchItems(patches));
        }
        if let Some(((), windows)) = self.window_cache.flush().pop() {
            commands.push(SyncCommand::CacheWindows(windows));
        }
        if let Some(((), windows)) = self.window_remote.flush().pop() {
            commands.push(SyncCommand::PutWindows(windows));
        }
        if self.snapshot.flush().pop().is_some() {
            commands.push(SyncCommand::CacheSnapshot);
        }
        commands
    }

    /// Records a failed command. The optimistic local edit stands; the write
    /// is logged, surfaced once, and never retried.
    pub fn report_failure(&mut self, command: &SyncCommand, error: &str) {
        tracing::warn!(?command, error, "remote sync failed, keeping local state");
        self.notifications.push(SyncNotification {
            message: format!("Changes could not be saved: {error}"),
        });
    }

    /// Drains notifications produced by failed commands.
    pub fn take_notifications(&mut self) -> Vec<SyncNotification> {
        std::mem::take(&mut self.notifications)
    }
}
