//! Typed messages and the transport seam for the read-only realtime push
//! channel.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::model::{AccountId, AccountSnapshot, DesktopItem, Profile, WindowState};
use crate::store::{StoreError, StoreFuture};

/// One message pushed to a subscribed visitor session.
///
/// `Snapshot` replaces the consumer's entire model; the partial variants are
/// applied incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    /// Full items + windows + profile replacement.
    Snapshot(AccountSnapshot),
    /// Partial item replacement: each entry replaces the item with the same id.
    Items(Vec<DesktopItem>),
    /// Wholesale window-state replacement.
    Windows(Vec<WindowState>),
    /// Profile update.
    Profile(Profile),
}

/// Callback invoked once per message delivered on a subscription.
pub type PushHandler = Box<dyn FnMut(PushMessage)>;

/// Transport the realtime channel subscribes through, keyed by account.
///
/// Implementations own the wire protocol; consumers only see the typed
/// [`PushMessage`] stream. Dropped connections surface to the caller as a
/// failed `subscribe`, not through the handler.
pub trait PushTransport {
    /// Subscribes to pushes for `account`, delivering every message to
    /// `handler` until the connection drops.
    fn subscribe<'a>(
        &'a self,
        account: &'a AccountId,
        handler: PushHandler,
    ) -> StoreFuture<'a, Result<(), StoreError>>;
}

/// No-op transport: subscriptions succeed and nothing is ever delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPushTransport;

impl PushTransport for NoopPushTransport {
    fn subscribe<'a>(
        &'a self,
        _account: &'a AccountId,
        _handler: PushHandler,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}

/// In-memory transport used by tests: messages pushed via
/// [`MemoryPushTransport::push`] fan out to every handler subscribed for the
/// account.
#[derive(Clone, Default)]
pub struct MemoryPushTransport {
    handlers: Rc<RefCell<HashMap<AccountId, Vec<PushHandler>>>>,
}

impl std::fmt::Debug for MemoryPushTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPushTransport")
            .field("accounts", &self.handlers.borrow().len())
            .finish()
    }
}

impl MemoryPushTransport {
    /// Delivers `message` to every handler subscribed for `account`.
    pub fn push(&self, account: &AccountId, message: PushMessage) {
        let mut handlers = self.handlers.borrow_mut();
        for handler in handlers.get_mut(account).into_iter().flatten() {
            handler(message.clone());
        }
    }

    /// Number of live subscriptions for `account`.
    pub fn subscriber_count(&self, account: &AccountId) -> usize {
        self.handlers
            .borrow()
            .get(account)
            .map_or(0, |handlers| handlers.len())
    }
}

impl PushTransport for MemoryPushTransport {
    fn subscribe<'a>(
        &'a self,
        account: &'a AccountId,
        handler: PushHandler,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.handlers
                .borrow_mut()
                .entry(account.clone())
                .or_default()
                .push(handler);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{AccountId, Profile};

    fn profile_message(name: &str) -> PushMessage {
        PushMessage::Profile(Profile {
            account_id: AccountId::from("acct-1"),
            display_name: name.to_string(),
            is_public: true,
        })
    }

    #[test]
    fn push_message_uses_tagged_wire_shape() {
        let message = profile_message("Ada");
        let value = serde_json::to_value(&message).expect("serialize push message");
        assert_eq!(
            value,
            json!({
                "type": "profile",
                "data": {
                    "account_id": "acct-1",
                    "display_name": "Ada",
                    "is_public": true,
                }
            })
        );
    }

    #[test]
    fn empty_items_partial_round_trips() {
        let message = PushMessage::Items(Vec::new());
        let raw = serde_json::to_string(&message).expect("serialize");
        let back: PushMessage = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, message);
    }

    #[test]
    fn memory_transport_fans_out_per_account() {
        let transport = MemoryPushTransport::default();
        let seen: Rc<RefCell<Vec<PushMessage>>> = Rc::default();

        let handler = {
            let seen = Rc::clone(&seen);
            Box::new(move |message| seen.borrow_mut().push(message))
        };
        block_on(transport.subscribe(&AccountId::from("acct-1"), handler)).expect("subscribe");
        assert_eq!(transport.subscriber_count(&AccountId::from("acct-1")), 1);

        transport.push(&AccountId::from("acct-1"), profile_message("Ada"));
        // Unsubscribed accounts never hear anything.
        transport.push(&AccountId::from("acct-2"), profile_message("Eve"));

        assert_eq!(*seen.borrow(), vec![profile_message("Ada")]);
    }
}
