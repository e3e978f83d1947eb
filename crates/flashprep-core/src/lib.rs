//! Flashprep domain core.
//!
//! Domain models, the session state machine, collection filtering, the
//! navigation gate and the seams (identity provider, question repository)
//! the outer layers implement.

pub mod config;
pub mod error;
pub mod navigation;
pub mod question;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::{FlashprepError, Result};
