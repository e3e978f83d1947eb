//! Identity provider seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::user::User;

/// A session as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub user: User,
    pub access_token: String,
}

impl ProviderSession {
    pub fn new(user: User, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }
}

/// Receiving end of a provider's session-change notifications.
///
/// Each message is a complete snapshot: `Some` for a live session, `None`
/// for session loss. Dropping the receiver releases the subscription.
pub type SessionChanges = mpsc::UnboundedReceiver<Option<ProviderSession>>;

/// External service owning the authentication session lifecycle.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Queries the current session, if any.
    async fn get_session(&self) -> Result<Option<ProviderSession>>;

    /// Asks the provider to end the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Opens a new change-notification subscription.
    fn subscribe(&self) -> SessionChanges;
}
