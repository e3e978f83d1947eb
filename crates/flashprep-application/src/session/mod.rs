//! Session application services.
//!
//! This module owns the live authentication session: bootstrap against the
//! identity provider, the change-notification listener, and the explicit
//! login/logout/update actions.

mod store;

pub use store::SessionStore;
