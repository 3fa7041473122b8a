//! Reconnect policy for the realtime push channel.
//!
//! Subscriptions go through the [`PushTransport`] seam; this tracks
//! connection status and tells the host when to attempt the next reconnect.
//! Backoff doubles per consecutive failure up to a cap and resets on a
//! successful connect.

use desktop_store_contract::{
    AccountId, PushHandler, PushTransport, StoreError, StoreFuture,
};

/// First reconnect delay after a drop.
pub const BACKOFF_INITIAL_MS: u64 = 1000;
/// Backoff ceiling.
pub const BACKOFF_MAX_MS: u64 = 30_000;

/// Connection status of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Connected and receiving pushes.
    Connected,
    /// Dropped; a reconnect is scheduled.
    Reconnecting {
        /// Consecutive failed attempts since the last successful connect.
        attempt: u32,
        /// Unix ms at which the next attempt is due.
        retry_at_ms: u64,
    },
    /// Torn down deliberately; no further reconnects.
    Closed,
}

/// Push-channel reconnect state machine, polled with the host clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeChannel {
    status: ChannelStatus,
    next_delay_ms: u64,
}

impl Default for RealtimeChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeChannel {
    /// Starts in the connected state with backoff at its initial value.
    pub fn new() -> Self {
        Self {
            status: ChannelStatus::Connected,
            next_delay_ms: BACKOFF_INITIAL_MS,
        }
    }

    /// Current status.
    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    /// Subscribes for `account` through `transport`, folding the outcome into
    /// the channel status: success resets backoff, failure schedules the next
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`StoreError`] on a failed subscribe, or
    /// [`StoreError::Remote`] when the channel was already closed.
    pub fn connect<'a>(
        &'a mut self,
        transport: &'a dyn PushTransport,
        account: &'a AccountId,
        handler: PushHandler,
        now_ms: u64,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if self.status == ChannelStatus::Closed {
                return Err(StoreError::Remote("push channel is closed".to_string()));
            }
            match transport.subscribe(account, handler).await {
                Ok(()) => {
                    self.on_connected();
                    Ok(())
                }
                Err(error) => {
                    self.on_disconnected(now_ms);
                    Err(error)
                }
            }
        })
    }

    /// The transport connected (or reconnected). Backoff resets.
    pub fn on_connected(&mut self) {
        if self.status == ChannelStatus::Closed {
            return;
        }
        self.status = ChannelStatus::Connected;
        self.next_delay_ms = BACKOFF_INITIAL_MS;
    }

    /// The transport dropped or a connect attempt failed. Schedules the next
    /// attempt and doubles the delay, capped at [`BACKOFF_MAX_MS`].
    pub fn on_disconnected(&mut self, now_ms: u64) {
        if self.status == ChannelStatus::Closed {
            return;
        }
        let attempt = match self.status {
            ChannelStatus::Reconnecting { attempt, .. } => attempt.saturating_add(1),
            _ => 1,
        };
        let delay = self.next_delay_ms;
        self.status = ChannelStatus::Reconnecting {
            attempt,
            retry_at_ms: now_ms.saturating_add(delay),
        };
        self.next_delay_ms = (delay.saturating_mul(2)).min(BACKOFF_MAX_MS);
        tracing::debug!(attempt, delay_ms = delay, "push channel dropped, reconnect scheduled");
    }

    /// Returns `true` when a reconnect attempt is due.
    pub fn should_reconnect(&self, now_ms: u64) -> bool {
        matches!(
            self.status,
            ChannelStatus::Reconnecting { retry_at_ms, .. } if now_ms >= retry_at_ms
        )
    }

    /// Tears the channel down permanently. Later connect or disconnect
    /// signals are ignored.
    pub fn close(&mut self) {
        self.status = ChannelStatus::Closed;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use desktop_store_contract::{MemoryPushTransport, NoopPushTransport, Profile, PushMessage};

    use super::*;

    struct FailingTransport;

    impl PushTransport for FailingTransport {
        fn subscribe<'a>(
            &'a self,
            _account: &'a AccountId,
            _handler: PushHandler,
        ) -> StoreFuture<'a, Result<(), StoreError>> {
            Box::pin(async { Err(StoreError::Remote("gateway timeout".to_string())) })
        }
    }

    #[test]
    fn backoff_doubles_per_failure_up_to_the_cap() {
        let mut channel = RealtimeChannel::new();
        let mut now = 0;
        let mut observed = Vec::new();
        for _ in 0..7 {
            channel.on_disconnected(now);
            let ChannelStatus::Reconnecting { retry_at_ms, .. } = channel.status() else {
                panic!("expected reconnecting");
            };
            observed.push(retry_at_ms - now);
            now = retry_at_ms;
        }
        assert_eq!(observed, vec![1000, 2000, 4000, 8000, 16_000, 30_000, 30_000]);
    }

    #[test]
    fn successful_connect_resets_backoff_and_attempts() {
        let mut channel = RealtimeChannel::new();
        channel.on_disconnected(0);
        channel.on_disconnected(1000);
        channel.on_connected();
        assert_eq!(channel.status(), ChannelStatus::Connected);

        channel.on_disconnected(60_000);
        assert_eq!(
            channel.status(),
            ChannelStatus::Reconnecting {
                attempt: 1,
                retry_at_ms: 60_000 + BACKOFF_INITIAL_MS,
            }
        );
    }

    #[test]
    fn reconnect_is_due_only_after_the_delay() {
        let mut channel = RealtimeChannel::new();
        channel.on_disconnected(100);
        assert!(!channel.should_reconnect(100 + BACKOFF_INITIAL_MS - 1));
        assert!(channel.should_reconnect(100 + BACKOFF_INITIAL_MS));
    }

    #[test]
    fn connect_subscribes_and_resets_backoff() {
        let transport = MemoryPushTransport::default();
        let account = AccountId::from("acct-1");
        let seen: Rc<RefCell<Vec<PushMessage>>> = Rc::default();

        let mut channel = RealtimeChannel::new();
        channel.on_disconnected(0);
        channel.on_disconnected(1000);

        let handler = {
            let seen = Rc::clone(&seen);
            Box::new(move |message| seen.borrow_mut().push(message))
        };
        block_on(channel.connect(&transport, &account, handler, 3000)).expect("connect");
        assert_eq!(channel.status(), ChannelStatus::Connected);
        assert_eq!(transport.subscriber_count(&account), 1);

        let message = PushMessage::Profile(Profile {
            account_id: account.clone(),
            display_name: "Ada".to_string(),
            is_public: true,
        });
        transport.push(&account, message.clone());
        assert_eq!(*seen.borrow(), vec![message]);

        // Backoff restarted from the initial delay.
        channel.on_disconnected(10_000);
        assert_eq!(
            channel.status(),
            ChannelStatus::Reconnecting {
                attempt: 1,
                retry_at_ms: 10_000 + BACKOFF_INITIAL_MS,
            }
        );
    }

    #[test]
    fn failed_connect_schedules_the_next_attempt() {
        let mut channel = RealtimeChannel::new();
        let account = AccountId::from("acct-1");

        let result = block_on(channel.connect(&FailingTransport, &account, Box::new(|_| {}), 500));
        assert_eq!(result, Err(StoreError::Remote("gateway timeout".to_string())));
        assert_eq!(
            channel.status(),
            ChannelStatus::Reconnecting {
                attempt: 1,
                retry_at_ms: 500 + BACKOFF_INITIAL_MS,
            }
        );
    }

    #[test]
    fn closed_channel_refuses_to_connect() {
        let mut channel = RealtimeChannel::new();
        channel.close();
        let account = AccountId::from("acct-1");
        let result =
            block_on(channel.connect(&NoopPushTransport, &account, Box::new(|_| {}), 0));
        assert!(result.is_err());
        assert_eq!(channel.status(), ChannelStatus::Closed);
    }

    #[test]
    fn close_is_permanent() {
        let mut channel = RealtimeChannel::new();
        channel.close();
        channel.on_disconnected(0);
        channel.on_connected();
        assert_eq!(channel.status(), ChannelStatus::Closed);
        assert!(!channel.should_reconnect(u64::MAX));
    }
}
