//! Question repository trait.

use async_trait::async_trait;

use super::model::{Question, QuestionDraft};
use crate::error::Result;

/// Which backend collection a view is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionScope {
    /// The authenticated user's own questions. Requires a token.
    Mine,
    /// The shared public pool. A token is attached when available.
    Public,
}

impl QuestionScope {
    /// Whether records in this scope may be edited and deleted by the viewer.
    pub fn is_owned(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub fn requires_token(self) -> bool {
        matches!(self, Self::Mine)
    }
}

/// Backend access for question collections.
///
/// Every method is a single request; no caching or retry happens here.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetches the full collection for `scope`.
    async fn list(&self, scope: QuestionScope, token: Option<&str>) -> Result<Vec<Question>>;

    /// Creates a question. Returns the stored record when the backend echoes it.
    async fn create(&self, draft: &QuestionDraft, token: &str) -> Result<Option<Question>>;

    /// Replaces the content of question `id`. Returns the stored record when echoed.
    async fn update(&self, id: &str, draft: &QuestionDraft, token: &str)
    -> Result<Option<Question>>;

    async fn delete(&self, id: &str, token: &str) -> Result<()>;

    /// Requests audio synthesis for question `id` and returns the resulting audio key.
    async fn generate_audio(&self, id: &str, token: &str) -> Result<String>;
}
