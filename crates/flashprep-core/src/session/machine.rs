//! Session transition table.

use super::event::SessionEvent;
use super::model::AuthState;
use super::provider::ProviderSession;

fn from_provider(session: Option<ProviderSession>) -> AuthState {
    match session {
        Some(ProviderSession { user, access_token }) => AuthState::Authenticated {
            user,
            token: access_token,
        },
        None => AuthState::Unauthenticated,
    }
}

/// Computes the state that follows `state` after `event`.
///
/// - `Bootstrapping` leaves on `Bootstrapped`/`BootstrapFailed`, or on
///   `Logout`, which settles it as `Unauthenticated`. Every other event is
///   held back by the store and ignored here.
/// - Bootstrap results arriving after bootstrap are ignored, so a query
///   answering after a logout cannot sign the user back in.
/// - `UpdateUser` outside `Authenticated` is a no-op and never touches the token.
pub fn transition(state: &AuthState, event: SessionEvent) -> AuthState {
    match (state, event) {
        (AuthState::Bootstrapping, SessionEvent::Bootstrapped(session)) => from_provider(session),
        (AuthState::Bootstrapping, SessionEvent::BootstrapFailed(_)) => AuthState::Unauthenticated,
        (AuthState::Bootstrapping, SessionEvent::Logout) => AuthState::Unauthenticated,
        (AuthState::Bootstrapping, _) => AuthState::Bootstrapping,

        (_, SessionEvent::Bootstrapped(_)) | (_, SessionEvent::BootstrapFailed(_)) => state.clone(),

        (_, SessionEvent::Login { user, token }) => AuthState::Authenticated { user, token },
        (_, SessionEvent::Logout) => AuthState::Unauthenticated,
        (_, SessionEvent::ProviderChanged(session)) => from_provider(session),

        (AuthState::Authenticated { user, token }, SessionEvent::UpdateUser(patch)) => {
            AuthState::Authenticated {
                user: user.apply(&patch),
                token: token.clone(),
            }
        }
        (AuthState::Unauthenticated, SessionEvent::UpdateUser(_)) => AuthState::Unauthenticated,
    }
}
