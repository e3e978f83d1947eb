//! Guarded navigation gate.
//!
//! A pure decision over session state; callers apply the decision to their
//! own navigation layer.

use serde::Serialize;

use crate::session::AuthState;

pub const LOGIN_PATH: &str = "/login";
/// Where a successful login lands when no destination was preserved.
pub const DEFAULT_AFTER_LOGIN: &str = "/dashboard";

/// Outcome of evaluating the gate for a protected view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Session is still bootstrapping; show a neutral waiting indicator.
    Pending,
    /// Send the user to `to`, remembering `from` for the post-login return.
    Redirect { to: String, from: String },
    Allow,
}

impl GateDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `intended` (a protected path) may be shown.
pub fn evaluate(state: &AuthState, intended: &str) -> GateDecision {
    match state {
        AuthState::Bootstrapping => GateDecision::Pending,
        AuthState::Unauthenticated => GateDecision::Redirect {
            to: LOGIN_PATH.to_string(),
            from: intended.to_string(),
        },
        AuthState::Authenticated { .. } => GateDecision::Allow,
    }
}

/// Where to go after a successful login.
///
/// Returns the preserved destination unless it is missing, empty, or the
/// login page itself.
pub fn post_login_destination(from: Option<&str>) -> &str {
    match from {
        Some(path) if !path.is_empty() && path != LOGIN_PATH => path,
        _ => DEFAULT_AFTER_LOGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    #[test]
    fn test_bootstrapping_is_pending() {
        assert_eq!(
            evaluate(&AuthState::Bootstrapping, "/dashboard"),
            GateDecision::Pending
        );
    }

    #[test]
    fn test_unauthenticated_redirects_preserving_destination() {
        assert_eq!(
            evaluate(&AuthState::Unauthenticated, "/edit/42"),
            GateDecision::Redirect {
                to: "/login".to_string(),
                from: "/edit/42".to_string(),
            }
        );
    }

    #[test]
    fn test_authenticated_is_allowed() {
        let state = AuthState::Authenticated {
            user: User::new("u1", "a@b.c"),
            token: "tok".to_string(),
        };
        assert!(evaluate(&state, "/public").is_allow());
    }

    #[test]
    fn test_post_login_destination() {
        assert_eq!(post_login_destination(Some("/edit/42")), "/edit/42");
        assert_eq!(post_login_destination(Some("/login")), DEFAULT_AFTER_LOGIN);
        assert_eq!(post_login_destination(Some("")), DEFAULT_AFTER_LOGIN);
        assert_eq!(post_login_destination(None), DEFAULT_AFTER_LOGIN);
    }
}
