use serde::Serialize;

use crate::user::User;

/// Authentication state machine states.
///
/// User and token exist only together, inside `Authenticated`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Waiting for the identity provider's initial session query.
    #[default]
    Bootstrapping,
    Authenticated {
        user: User,
        token: String,
    },
    Unauthenticated,
}

impl AuthState {
    pub fn is_bootstrapping(&self) -> bool {
        matches!(self, Self::Bootstrapping)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Short name used in log lines. Never includes the token.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::Authenticated { .. } => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

/// Flattened session record handed to consumers.
///
/// Always built from an [`AuthState`], so `is_authenticated` holds exactly
/// when both `user` and `token` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub loading: bool,
}

impl From<&AuthState> for Session {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Bootstrapping => Self {
                is_authenticated: false,
                user: None,
                token: None,
                loading: true,
            },
            AuthState::Authenticated { user, token } => Self {
                is_authenticated: true,
                user: Some(user.clone()),
                token: Some(token.clone()),
                loading: false,
            },
            AuthState::Unauthenticated => Self {
                is_authenticated: false,
                user: None,
                token: None,
                loading: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flags_follow_state() {
        let boot = Session::from(&AuthState::Bootstrapping);
        assert!(boot.loading);
        assert!(!boot.is_authenticated);

        let auth = Session::from(&AuthState::Authenticated {
            user: User::new("u1", "a@b.c"),
            token: "tok".to_string(),
        });
        assert!(auth.is_authenticated);
        assert!(!auth.loading);
        assert_eq!(auth.token.as_deref(), Some("tok"));

        let anon = Session::from(&AuthState::Unauthenticated);
        assert!(!anon.is_authenticated && !anon.loading);
        assert!(anon.user.is_none() && anon.token.is_none());
    }

    #[test]
    fn test_serialized_session_omits_token() {
        let auth = Session::from(&AuthState::Authenticated {
            user: User::new("u1", "a@b.c"),
            token: "secret".to_string(),
        });
        let json = serde_json::to_string(&auth).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"isAuthenticated\":true"));
    }
}
