//! Infrastructure adapters for Flashprep: HTTP transport, backend endpoints,
//! configuration loading and identity providers.

pub mod api_client;
pub mod config_service;
pub mod identity;
pub mod question_api;

pub use crate::api_client::ApiClient;
pub use crate::config_service::{AppConfig, AuthConfig, ConfigService};
pub use crate::identity::{GoTrueIdentityProvider, MemoryIdentityProvider, SessionBroadcaster};
pub use crate::question_api::HttpQuestionRepository;
