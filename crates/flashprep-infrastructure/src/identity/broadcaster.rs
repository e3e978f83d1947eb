use std::sync::{Mutex, MutexGuard};

use flashprep_core::session::{ProviderSession, SessionChanges};
use tokio::sync::mpsc;

/// Current session plus the open change subscriptions.
///
/// Senders whose receiver was dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct SessionBroadcaster {
    inner: Mutex<BroadcasterState>,
}

#[derive(Debug, Default)]
struct BroadcasterState {
    current: Option<ProviderSession>,
    subscribers: Vec<mpsc::UnboundedSender<Option<ProviderSession>>>,
}

impl SessionBroadcaster {
    pub fn new(current: Option<ProviderSession>) -> Self {
        Self {
            inner: Mutex::new(BroadcasterState {
                current,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BroadcasterState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> Option<ProviderSession> {
        self.lock().current.clone()
    }

    /// Replaces the current session and notifies every live subscriber.
    pub fn publish(&self, session: Option<ProviderSession>) {
        let mut state = self.lock();
        state.current = session.clone();
        state
            .subscribers
            .retain(|tx| tx.send(session.clone()).is_ok());
        tracing::debug!(
            "[SessionBroadcaster] published {} to {} subscriber(s)",
            if session.is_some() { "session" } else { "session loss" },
            state.subscribers.len()
        );
    }

    /// Replaces the current session without notifying anyone.
    pub fn set_silently(&self, session: Option<ProviderSession>) {
        self.lock().current = session;
    }

    pub fn subscribe(&self) -> SessionChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Number of subscriptions whose receiver is still alive.
    pub fn active_subscribers(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashprep_core::user::User;

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let broadcaster = SessionBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        let session = ProviderSession::new(User::new("u1", "a@b.c"), "tok");
        broadcaster.publish(Some(session.clone()));
        broadcaster.publish(None);

        assert_eq!(rx.try_recv().unwrap(), Some(session.clone()));
        assert_eq!(rx.try_recv().unwrap(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(broadcaster.current(), None);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let broadcaster = SessionBroadcaster::default();
        let rx = broadcaster.subscribe();
        let _kept = broadcaster.subscribe();
        assert_eq!(broadcaster.active_subscribers(), 2);

        drop(rx);
        assert_eq!(broadcaster.active_subscribers(), 1);
    }
}
