use crate::user::{User, UserPatch};

use super::provider::ProviderSession;

/// Inputs to the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The initial session query answered. `None` means no session exists.
    Bootstrapped(Option<ProviderSession>),
    /// The initial session query failed, errored or timed out.
    BootstrapFailed(String),
    /// Explicit login with caller-supplied credentials.
    Login { user: User, token: String },
    /// Local state clear after a sign-out request.
    Logout,
    /// A snapshot from the provider's change-notification channel.
    ProviderChanged(Option<ProviderSession>),
    /// Shallow merge into the current user.
    UpdateUser(UserPatch),
}

impl SessionEvent {
    /// Short name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrapped(_) => "bootstrapped",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::ProviderChanged(_) => "provider_changed",
            Self::UpdateUser(_) => "update_user",
        }
    }
}
