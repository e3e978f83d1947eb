//! Question domain module.
//!
//! # Module Structure
//!
//! - `model`: question record, draft and known categories
//! - `filter`: filter criteria and the derived-view functions over a collection
//! - `card`: per-card controls and preview text
//! - `repository`: backend access trait for question collections
//!
//! # Usage
//!
//! ```ignore
//! use flashprep_core::question::{FilterCriteria, Question, filter_questions, available_tags};
//! ```

mod card;
mod filter;
mod model;
mod repository;

pub use card::{ANSWER_PREVIEW_LEN, CardControls, CardView, QUESTION_PREVIEW_LEN, truncate_text};
pub use filter::{FilterCriteria, available_tags, filter_questions};
pub use model::{CATEGORIES, Question, QuestionDraft};
pub use repository::{QuestionRepository, QuestionScope};
