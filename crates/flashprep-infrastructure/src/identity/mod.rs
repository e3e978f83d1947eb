//! Identity provider implementations.
//!
//! - `memory`: in-process provider driven by the host application (tests, embedding)
//! - `gotrue`: GoTrue-compatible auth server over HTTP

mod broadcaster;
mod gotrue;
mod memory;

pub use broadcaster::SessionBroadcaster;
pub use gotrue::GoTrueIdentityProvider;
pub use memory::MemoryIdentityProvider;
