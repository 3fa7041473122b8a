//! Item registry: the canonical ordered collection of desktop items.
//!
//! All item mutation funnels through here so parent/position/timestamp
//! bookkeeping stays in one place. Mutators take `now_ms` and stamp
//! `updated_at` monotonically per item.

use std::collections::HashSet;

use thiserror::Error;

use desktop_store_contract::{
    DesktopItem, GridPosition, ItemId, ItemKind, ItemUpdates, WidgetConfig,
};

use crate::grid;

/// Item-level failures. Cyclic reparents are rejected here as a last line of
/// defense; drop-target resolution already excludes them structurally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The referenced item does not exist.
    #[error("item not found")]
    ItemNotFound,
    /// The destination would make a folder its own ancestor.
    #[error("folder cannot be moved into itself or a descendant")]
    CyclicReparent,
    /// The destination parent is not a folder.
    #[error("destination is not a folder")]
    NotAFolder,
}

/// Ordered item collection with parent/position bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemRegistry {
    items: Vec<DesktopItem>,
    next_local_id: u64,
}

impl ItemRegistry {
    /// Builds a registry from a persisted item list.
    pub fn from_items(items: Vec<DesktopItem>) -> Self {
        Self {
            next_local_id: items.len() as u64,
            items,
        }
    }

    /// All items in canonical order, trashed included.
    pub fn all(&self) -> &[DesktopItem] {
        &self.items
    }

    /// Item lookup by id.
    pub fn get(&self, id: &ItemId) -> Option<&DesktopItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    fn get_mut(&mut self, id: &ItemId) -> Result<&mut DesktopItem, RegistryError> {
        self.items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or(RegistryError::ItemNotFound)
    }

    /// Mints an id unused by any current item. The remote store may later
    /// assign its own; local ids stay stable for this session.
    pub fn mint_id(&mut self) -> ItemId {
        loop {
            self.next_local_id += 1;
            let candidate = ItemId(format!("item-{}", self.next_local_id));
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Appends an item as-is. Used for hydration and remote echoes.
    pub fn insert(&mut self, item: DesktopItem) {
        self.items.push(item);
    }

    /// Replaces the item with the same id, or appends when absent. Push-channel
    /// partial updates land here.
    pub fn upsert(&mut self, item: DesktopItem) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    /// Replaces the whole collection (push-channel full snapshot).
    pub fn replace_all(&mut self, items: Vec<DesktopItem>) {
        self.next_local_id = self.next_local_id.max(items.len() as u64);
        self.items = items;
    }

    /// Non-trashed items under `parent` (`None` = desktop root).
    pub fn children_of(&self, parent: Option<&ItemId>) -> Vec<&DesktopItem> {
        self.items
            .iter()
            .filter(|i| !i.is_trashed && i.parent_id.as_ref() == parent)
            .collect()
    }

    /// Trashed items, newest first.
    pub fn trashed(&self) -> Vec<&DesktopItem> {
        let mut items: Vec<&DesktopItem> = self.items.iter().filter(|i| i.is_trashed).collect();
        items.sort_by(|a, b| b.trashed_at.cmp(&a.trashed_at));
        items
    }

    /// Cells taken by non-trashed items under `parent`, minus `exclude`.
    pub fn occupied_cells(
        &self,
        parent: Option<&ItemId>,
        exclude: &[ItemId],
    ) -> HashSet<GridPosition> {
        self.items
            .iter()
            .filter(|i| !i.is_trashed && i.parent_id.as_ref() == parent)
            .filter(|i| !exclude.contains(&i.id))
            .map(|i| i.position)
            .collect()
    }

    /// Resolves a conflict-free cell near `target` among the siblings of
    /// `parent`, ignoring `exclude`.
    pub fn place(
        &self,
        parent: Option<&ItemId>,
        target: GridPosition,
        exclude: &[ItemId],
    ) -> GridPosition {
        grid::find_free_cell(&self.occupied_cells(parent, exclude), target)
    }

    /// Creates a fresh item at a resolved free cell and returns it.
    pub fn create(
        &mut self,
        kind: ItemKind,
        name: impl Into<String>,
        parent: Option<ItemId>,
        target: GridPosition,
        now_ms: u64,
    ) -> DesktopItem {
        let position = self.place(parent.as_ref(), target, &[]);
        let id = self.mint_id();
        let item = DesktopItem::new(id, kind, name, parent, position, now_ms);
        self.items.push(item.clone());
        item
    }

    /// Returns `true` when `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &ItemId, id: &ItemId) -> bool {
        let mut cursor = self.get(id).and_then(|i| i.parent_id.clone());
        // Parent chains are acyclic by construction; bound the walk anyway.
        for _ in 0..self.items.len() {
            match cursor {
                Some(parent) if &parent == ancestor => return true,
                Some(parent) => cursor = self.get(&parent).and_then(|i| i.parent_id.clone()),
                None => return false,
            }
        }
        false
    }

    fn touch(item: &mut DesktopItem, now_ms: u64) {
        item.updated_at = now_ms.max(item.updated_at.saturating_add(1));
    }

    /// Renames an item.
    pub fn rename(&mut self, id: &ItemId, name: &str, now_ms: u64) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.name = name.to_string();
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Sets the visitor-visibility flag.
    pub fn set_public(
        &mut self,
        id: &ItemId,
        is_public: bool,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.is_public = is_public;
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Replaces the text body of a text item.
    pub fn set_text_content(
        &mut self,
        id: &ItemId,
        text: &str,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.payload.text_content = Some(text.to_string());
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Replaces the destination of a link item.
    pub fn set_url(&mut self, id: &ItemId, url: &str, now_ms: u64) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.payload.url = Some(url.to_string());
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Replaces the typed widget configuration of a widget item.
    pub fn set_widget_config(
        &mut self,
        id: &ItemId,
        config: WidgetConfig,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.payload.widget_config = Some(config);
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Moves an item to `cell` within its current parent. The cell is taken
    /// as-is; conflict resolution happens at drop time.
    pub fn move_to_cell(
        &mut self,
        id: &ItemId,
        cell: GridPosition,
        now_ms: u64,
    ) -> Result<GridPosition, RegistryError> {
        let item = self.get_mut(id)?;
        item.position = cell.clamped();
        Self::touch(item, now_ms);
        Ok(item.position)
    }

    /// Re-parents an item, rejecting destinations that are not folders or that
    /// would make a folder its own ancestor.
    pub fn reparent(
        &mut self,
        id: &ItemId,
        parent: Option<ItemId>,
        position: GridPosition,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        if let Some(parent_id) = &parent {
            let dest = self.get(parent_id).ok_or(RegistryError::ItemNotFound)?;
            if dest.kind != ItemKind::Folder {
                return Err(RegistryError::NotAFolder);
            }
            if parent_id == id || self.is_ancestor(id, parent_id) {
                return Err(RegistryError::CyclicReparent);
            }
        }
        let item = self.get_mut(id)?;
        item.parent_id = parent;
        item.position = position.clamped();
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Soft-deletes an item.
    pub fn trash(&mut self, id: &ItemId, now_ms: u64) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        item.is_trashed = true;
        item.trashed_at = Some(now_ms);
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Restores a trashed item, re-resolving a free cell near its old position.
    pub fn restore(&mut self, id: &ItemId, now_ms: u64) -> Result<(), RegistryError> {
        let (parent, old_position) = {
            let item = self.get(id).ok_or(RegistryError::ItemNotFound)?;
            (item.parent_id.clone(), item.position)
        };
        let position = self.place(parent.as_ref(), old_position, &[id.clone()]);
        let item = self.get_mut(id)?;
        item.is_trashed = false;
        item.trashed_at = None;
        item.position = position;
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Removes an item permanently.
    pub fn remove(&mut self, id: &ItemId) -> Result<DesktopItem, RegistryError> {
        let index = self
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or(RegistryError::ItemNotFound)?;
        Ok(self.items.remove(index))
    }

    /// Applies a partial update, stamping `updated_at`.
    pub fn apply_updates(
        &mut self,
        id: &ItemId,
        updates: &ItemUpdates,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let item = self.get_mut(id)?;
        updates.apply_to(item);
        Self::touch(item, now_ms);
        Ok(())
    }

    /// Duplicates `source` into `parent` with a `" copy"` name suffix and a
    /// fresh id, placed near `target`. Returns the new item.
    pub fn duplicate(
        &mut self,
        source: &ItemId,
        parent: Option<ItemId>,
        target: GridPosition,
        now_ms: u64,
    ) -> Result<DesktopItem, RegistryError> {
        let original = self.get(source).ok_or(RegistryError::ItemNotFound)?.clone();
        let position = self.place(parent.as_ref(), target, &[]);
        let id = self.mint_id();
        let mut copy = DesktopItem::new(
            id,
            original.kind,
            format!("{} copy", original.name),
            parent,
            position,
            now_ms,
        );
        copy.payload = original.payload;
        copy.is_public = original.is_public;
        self.items.push(copy.clone());
        Ok(copy)
    }
}
