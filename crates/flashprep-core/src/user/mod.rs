//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: authenticated user record and partial-update patch

mod model;

pub use model::{User, UserPatch};
