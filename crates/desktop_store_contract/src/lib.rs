//! Wire model and remote-store contracts shared by the desktop engine and sync bridge.
//!
//! This crate defines the persisted shape of desktop items and window state, the
//! CRUD-like contract a remote item store must satisfy, and the typed messages a
//! read-only push channel may deliver. It deliberately knows nothing about
//! rendering, transport, or scheduling.
//!
//! # Example
//!
//! ```rust
//! use desktop_store_contract::{DesktopItem, GridPosition, ItemId, ItemKind};
//!
//! let item = DesktopItem::new(
//!     ItemId::from("doc-1"),
//!     ItemKind::Text,
//!     "notes.txt",
//!     None,
//!     GridPosition { x: 0, y: 0 },
//!     1_700_000_000_000,
//! );
//! assert_eq!(item.parent_id, None);
//! assert!(!item.is_trashed);
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod model;
mod push;
mod store;
mod time;

pub use model::{
    AccountId, AccountSnapshot, DesktopItem, GridPosition, ItemId, ItemKind, ItemPatch,
    ItemPayload, ItemUpdates, PixelPoint, PixelSize, Profile, WidgetConfig, WindowBounds,
    WindowContent, WindowState,
};
pub use push::{
    MemoryPushTransport, NoopPushTransport, PushHandler, PushMessage, PushTransport,
};
pub use store::{
    MemoryRemoteStore, NoopRemoteStore, RemoteItemStore, StoreError, StoreFuture,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
