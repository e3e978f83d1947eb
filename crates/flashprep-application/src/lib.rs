//! Application layer for Flashprep.
//!
//! This crate coordinates the domain types in `flashprep-core` with the
//! backend adapters in `flashprep-infrastructure`: the live session store,
//! memoized collection views, and page-level question boards.

pub mod app;
pub mod board;
pub mod notification;
pub mod session;
pub mod view_model;

pub use app::FlashprepApp;
pub use board::QuestionBoard;
pub use notification::{Notification, NotificationLevel, Notifier};
pub use session::SessionStore;
pub use view_model::{CollectionViewModel, EmptyState, ViewSnapshot};
