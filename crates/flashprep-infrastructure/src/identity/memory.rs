//! In-process identity provider.

use async_trait::async_trait;
use flashprep_core::error::{FlashprepError, Result};
use flashprep_core::session::{IdentityProvider, ProviderSession, SessionChanges};

use super::broadcaster::SessionBroadcaster;

/// Identity provider whose session is set by the host application.
///
/// Useful when the credential comes from somewhere the core does not manage
/// (an environment variable, an embedding app) and for tests.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    sessions: SessionBroadcaster,
    unreachable: Option<String>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: ProviderSession) -> Self {
        Self {
            sessions: SessionBroadcaster::new(Some(session)),
            unreachable: None,
        }
    }

    /// A provider whose session query always fails with `reason`.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            sessions: SessionBroadcaster::default(),
            unreachable: Some(reason.into()),
        }
    }

    /// Starts a session and notifies subscribers.
    pub fn sign_in(&self, session: ProviderSession) {
        self.sessions.publish(Some(session));
    }

    /// Drops the session and notifies subscribers, as an expiry would.
    pub fn expire(&self) {
        self.sessions.publish(None);
    }

    pub fn active_subscribers(&self) -> usize {
        self.sessions.active_subscribers()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>> {
        if let Some(reason) = &self.unreachable {
            return Err(FlashprepError::transport(reason.clone()));
        }
        Ok(self.sessions.current())
    }

    async fn sign_out(&self) -> Result<()> {
        self.sessions.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> SessionChanges {
        self.sessions.subscribe()
    }
}
