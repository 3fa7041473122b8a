//! Eventual-consistency bridge between the local desktop state and the
//! remote store.
//!
//! The reducer mutates local state synchronously and emits effect intents;
//! this crate turns those intents into debounced, coalesced sync commands the
//! host executes against a [`desktop_store_contract::RemoteItemStore`]. Local
//! state is never rolled back: failures are logged and surfaced as
//! notifications, and the affected write is dropped.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bridge;
pub mod debounce;
pub mod realtime;

pub use bridge::{
    SessionMode, SyncBridge, SyncCommand, SyncNotification, ITEM_POSITION_DEBOUNCE_MS,
    SNAPSHOT_CACHE_DEBOUNCE_MS, WINDOW_CACHE_DEBOUNCE_MS, WINDOW_REMOTE_DEBOUNCE_MS,
};
pub use debounce::KeyedDebounce;
pub use realtime::{ChannelStatus, RealtimeChannel, BACKOFF_INITIAL_MS, BACKOFF_MAX_MS};
