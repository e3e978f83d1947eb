//! Authentication session domain.
//!
//! # Module Structure
//!
//! - `model`: the three-state [`AuthState`] and its flattened [`Session`] view
//! - `event`: inputs to the state machine
//! - `machine`: the pure transition function
//! - `provider`: the identity provider seam

mod event;
mod machine;
mod model;
mod provider;

pub use event::SessionEvent;
pub use machine::transition;
pub use model::{AuthState, Session};
pub use provider::{IdentityProvider, ProviderSession, SessionChanges};
