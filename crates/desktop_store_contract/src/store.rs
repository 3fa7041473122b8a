//! Remote item-store contract and baseline implementations.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use thiserror::Error;

use crate::model::{
    AccountId, AccountSnapshot, DesktopItem, ItemId, ItemPatch, Profile, WindowState,
};

/// Errors surfaced by remote-store calls.
///
/// The engine interprets only [`StoreError::NotFound`]; everything else is
/// treated as an opaque failure carrying a human-readable message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested account or item does not exist remotely.
    #[error("not found")]
    NotFound,
    /// Any other remote failure (non-2xx, transport, serialization).
    #[error("remote store error: {0}")]
    Remote(String),
}

/// Object-safe boxed future used by [`RemoteItemStore`] async methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// CRUD-like contract the remote item store must satisfy.
///
/// Last write wins on concurrent edits; the store performs no version checks.
pub trait RemoteItemStore {
    /// Fetches the full item + window + profile snapshot for an account.
    fn fetch_snapshot<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> StoreFuture<'a, Result<AccountSnapshot, StoreError>>;

    /// Creates one item, echoing back the persisted record including any
    /// server-assigned fields.
    fn create_item<'a>(
        &'a self,
        item: &'a DesktopItem,
    ) -> StoreFuture<'a, Result<DesktopItem, StoreError>>;

    /// Applies a list of `{id, updates}` pairs in one call.
    fn patch_items<'a>(
        &'a self,
        patches: &'a [ItemPatch],
    ) -> StoreFuture<'a, Result<(), StoreError>>;

    /// Deletes one item by id.
    fn delete_item<'a>(&'a self, id: &'a ItemId) -> StoreFuture<'a, Result<(), StoreError>>;

    /// Replaces the persisted window-state list wholesale.
    fn put_windows<'a>(
        &'a self,
        account: &'a AccountId,
        windows: &'a [WindowState],
    ) -> StoreFuture<'a, Result<(), StoreError>>;
}

/// No-op store for baseline tests and sessions without a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemoteStore;

impl RemoteItemStore for NoopRemoteStore {
    fn fetch_snapshot<'a>(
        &'a self,
        _account: &'a AccountId,
    ) -> StoreFuture<'a, Result<AccountSnapshot, StoreError>> {
        Box::pin(async { Err(StoreError::NotFound) })
    }

    fn create_item<'a>(
        &'a self,
        item: &'a DesktopItem,
    ) -> StoreFuture<'a, Result<DesktopItem, StoreError>> {
        Box::pin(async move { Ok(item.clone()) })
    }

    fn patch_items<'a>(
        &'a self,
        _patches: &'a [ItemPatch],
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_item<'a>(&'a self, _id: &'a ItemId) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn put_windows<'a>(
        &'a self,
        _account: &'a AccountId,
        _windows: &'a [WindowState],
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    items: HashMap<ItemId, DesktopItem>,
    windows: Vec<WindowState>,
    profiles: HashMap<AccountId, Profile>,
}

/// In-memory store used by tests and local-only sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    inner: Rc<RefCell<MemoryStoreState>>,
}

impl MemoryRemoteStore {
    /// Registers a profile so `fetch_snapshot` succeeds for the account.
    pub fn insert_profile(&self, profile: Profile) {
        let mut state = self.inner.borrow_mut();
        state.profiles.insert(profile.account_id.clone(), profile);
    }

    /// Returns the stored item for `id`, if present.
    pub fn item(&self, id: &ItemId) -> Option<DesktopItem> {
        self.inner.borrow().items.get(id).cloned()
    }

    /// Returns the currently persisted window list.
    pub fn windows(&self) -> Vec<WindowState> {
        self.inner.borrow().windows.clone()
    }
}

impl RemoteItemStore for MemoryRemoteStore {
    fn fetch_snapshot<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> StoreFuture<'a, Result<AccountSnapshot, StoreError>> {
        Box::pin(async move {
            let state = self.inner.borrow();
            let profile = state.profiles.get(account).cloned().ok_or(StoreError::NotFound)?;
            let mut items = state.items.values().cloned().collect::<Vec<_>>();
            items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(AccountSnapshot {
                items,
                windows: state.windows.clone(),
                profile,
            })
        })
    }

    fn create_item<'a>(
        &'a self,
        item: &'a DesktopItem,
    ) -> StoreFuture<'a, Result<DesktopItem, StoreError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .items
                .insert(item.id.clone(), item.clone());
            Ok(item.clone())
        })
    }

    fn patch_items<'a>(
        &'a self,
        patches: &'a [ItemPatch],
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            for patch in patches {
                let item = state.items.get_mut(&patch.id).ok_or(StoreError::NotFound)?;
                patch.updates.apply_to(item);
            }
            Ok(())
        })
    }

    fn delete_item<'a>(&'a self, id: &'a ItemId) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .items
                .remove(id)
                .map(|_| ())
                .ok_or(StoreError::NotFound)
        })
    }

    fn put_windows<'a>(
        &'a self,
        _account: &'a AccountId,
        windows: &'a [WindowState],
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner.borrow_mut().windows = windows.to_vec();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{GridPosition, ItemKind, ItemUpdates};

    fn profile() -> Profile {
        Profile {
            account_id: AccountId::from("acct-1"),
            display_name: "Ada".to_string(),
            is_public: true,
        }
    }

    fn item(id: &str, created_at: u64) -> DesktopItem {
        DesktopItem::new(
            ItemId::from(id),
            ItemKind::Text,
            id,
            None,
            GridPosition { x: 0, y: 0 },
            created_at,
        )
    }

    #[test]
    fn memory_store_create_patch_delete_round_trip() {
        let store = MemoryRemoteStore::default();
        let store_obj: &dyn RemoteItemStore = &store;

        let created = block_on(store_obj.create_item(&item("a", 1))).expect("create");
        assert_eq!(created.id, ItemId::from("a"));

        let patch = ItemPatch {
            id: ItemId::from("a"),
            updates: ItemUpdates {
                name: Some("renamed".to_string()),
                position: Some(GridPosition { x: 3, y: 1 }),
                ..Default::default()
            },
        };
        block_on(store_obj.patch_items(std::slice::from_ref(&patch))).expect("patch");
        let stored = store.item(&ItemId::from("a")).expect("stored item");
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.position, GridPosition { x: 3, y: 1 });

        block_on(store_obj.delete_item(&ItemId::from("a"))).expect("delete");
        assert_eq!(
            block_on(store_obj.delete_item(&ItemId::from("a"))),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn memory_store_snapshot_requires_known_account() {
        let store = MemoryRemoteStore::default();
        let store_obj: &dyn RemoteItemStore = &store;
        assert_eq!(
            block_on(store_obj.fetch_snapshot(&AccountId::from("missing"))),
            Err(StoreError::NotFound)
        );

        store.insert_profile(profile());
        block_on(store_obj.create_item(&item("b", 2))).expect("create b");
        block_on(store_obj.create_item(&item("a", 1))).expect("create a");

        let snapshot =
            block_on(store_obj.fetch_snapshot(&AccountId::from("acct-1"))).expect("snapshot");
        let ids = snapshot.items.iter().map(|i| i.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.profile.display_name, "Ada");
    }

    #[test]
    fn memory_store_put_windows_replaces_wholesale() {
        let store = MemoryRemoteStore::default();
        let store_obj: &dyn RemoteItemStore = &store;
        let account = AccountId::from("acct-1");

        let window = WindowState {
            id: "w1".to_string(),
            title: "Folder".to_string(),
            position: crate::model::PixelPoint { x: 10, y: 40 },
            size: crate::model::PixelSize { width: 400, height: 300 },
            z_index: 1,
            minimized: false,
            maximized: false,
            collapsed: false,
            restore_bounds: None,
            content: crate::model::WindowContent::Custom("about".to_string()),
        };
        block_on(store_obj.put_windows(&account, std::slice::from_ref(&window))).expect("put");
        assert_eq!(store.windows().len(), 1);

        block_on(store_obj.put_windows(&account, &[])).expect("clear");
        assert_eq!(store.windows(), Vec::new());
    }
}
