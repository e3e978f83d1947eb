//! User domain model.

use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the identity provider.
///
/// Only changed through [`User::apply`], which performs a shallow merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            created_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns a copy of this user with every field present in `patch` overwritten.
    ///
    /// Fields absent from the patch keep their current value. The id is never
    /// part of a patch.
    pub fn apply(&self, patch: &UserPatch) -> Self {
        Self {
            id: self.id.clone(),
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            name: patch.name.clone().or_else(|| self.name.clone()),
            created_at: patch
                .created_at
                .clone()
                .or_else(|| self.created_at.clone()),
        }
    }

    /// Name to show in greetings: the display name, or the email when unset.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Partial user update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.created_at.is_none()
    }
}
