//! Error types for Flashprep.

use serde::Serialize;
use thiserror::Error;

/// Generic message used when a failed response carries no readable `message`.
pub const GENERIC_REQUEST_FAILURE: &str = "API request failed";

/// A shared error type for every Flashprep crate.
///
/// Variants are typed and structured; conversions from the common
/// library error types are provided through `From`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FlashprepError {
    /// The backend answered with a non-success status.
    ///
    /// `message` is the server-provided `message` field when it could be
    /// read, otherwise [`GENERIC_REQUEST_FAILURE`].
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The request never produced a usable response (connect, DNS, body decode).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The identity provider failed or never answered the initial session query.
    #[error("Session bootstrap failed: {0}")]
    SessionBootstrap(String),

    /// Caller-supplied input was rejected before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An action for the same record is still running.
    #[error("An action for '{id}' is already in progress")]
    InFlight { id: String },

    /// A record or entity is not part of the current collection.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation needed an authenticated session and none was available.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlashprepError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Request error from a status code and message.
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn bootstrap(message: impl Into<String>) -> Self {
        Self::SessionBootstrap(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn in_flight(id: impl Into<String>) -> Self {
        Self::InFlight { id: id.into() }
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a non-success HTTP outcome
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status of a failed request, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 responses, which usually mean the token is no longer valid.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Human-readable text suitable for a transient notification.
    ///
    /// Request errors show the server message verbatim; everything else
    /// uses its `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for FlashprepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FlashprepError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FlashprepError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<anyhow::Error> for FlashprepError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, FlashprepError>`.
pub type Result<T> = std::result::Result<T, FlashprepError>;
