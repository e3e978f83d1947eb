//! Question record and draft models.

use serde::{Deserialize, Serialize};

use crate::error::{FlashprepError, Result};

/// Categories offered by question pickers.
///
/// Filtering accepts any category string; this list only seeds selection UIs.
pub const CATEGORIES: &[&str] = &[
    "Technical",
    "Behavioral",
    "System Design",
    "Coding",
    "Leadership",
    "Culture Fit",
    "Product",
    "Strategy",
];

/// A question/answer flashcard owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tag order carries no meaning; duplicates are tolerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category: None,
            tags: None,
            is_public: None,
            audio_key: None,
            has_audio: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }

    /// Playable audio key, if one exists and is non-empty.
    pub fn playable_audio(&self) -> Option<&str> {
        self.audio_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio.unwrap_or(false) || self.playable_audio().is_some()
    }

    pub fn is_public(&self) -> bool {
        self.is_public.unwrap_or(false)
    }

    /// Records that audio now exists for this question under `audio_key`.
    pub fn mark_audio(&mut self, audio_key: impl Into<String>) {
        self.audio_key = Some(audio_key.into());
        self.has_audio = Some(true);
    }

    /// Overwrites the editable content with `draft`, keeping id and audio state.
    pub fn apply_draft(&mut self, draft: &QuestionDraft) {
        self.question = draft.question.clone();
        self.answer = draft.answer.clone();
        self.category = draft.category.clone();
        self.tags = Some(draft.tags.clone());
        self.is_public = Some(draft.is_public);
    }
}

/// Caller-supplied content for creating or editing a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl QuestionDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }

    /// Checks required fields and normalizes the draft for submission.
    ///
    /// Question and answer must be non-blank. Tags are trimmed, blank tags are
    /// dropped, and duplicates removed keeping the first occurrence. A blank
    /// category becomes `None`.
    pub fn validated(self) -> Result<Self> {
        let question = self.question.trim().to_string();
        let answer = self.answer.trim().to_string();
        if question.is_empty() {
            return Err(FlashprepError::validation("question text is required"));
        }
        if answer.is_empty() {
            return Err(FlashprepError::validation("answer text is required"));
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            question,
            answer,
            category,
            tags,
            is_public: self.is_public,
        })
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        Self {
            question: question.question.clone(),
            answer: question.answer.clone(),
            category: question.category.clone(),
            tags: question.tags().to_vec(),
            is_public: question.is_public(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "id": "q1",
            "question": "Tell me about yourself",
            "answer": "I build things",
            "category": "Behavioral",
            "tags": ["intro", "background"],
            "isPublic": true,
            "hasAudio": false,
            "createdAt": "2024-01-15"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.category.as_deref(), Some("Behavioral"));
        assert_eq!(q.tags(), ["intro", "background"]);
        assert!(q.is_public());
        assert!(!q.has_audio());
        assert!(q.audio_key.is_none());
    }

    #[test]
    fn test_missing_optional_fields_default_to_none() {
        let q: Question =
            serde_json::from_str(r#"{"id":"q1","question":"Q","answer":"A"}"#).unwrap();
        assert!(q.tags().is_empty());
        assert!(!q.is_public());
        assert!(q.playable_audio().is_none());
    }

    #[test]
    fn test_mark_audio_sets_key_and_flag() {
        let mut q = Question::new("q1", "Q", "A");
        q.mark_audio("audio/q1.mp3");
        assert_eq!(q.playable_audio(), Some("audio/q1.mp3"));
        assert_eq!(q.has_audio, Some(true));
    }

    #[test]
    fn test_empty_audio_key_is_not_playable() {
        let mut q = Question::new("q1", "Q", "A");
        q.audio_key = Some(String::new());
        assert!(q.playable_audio().is_none());
    }

    #[test]
    fn test_draft_validation_rejects_blank_fields() {
        let err = QuestionDraft::new("   ", "answer").validated().unwrap_err();
        assert!(err.is_validation());
        let err = QuestionDraft::new("question", "").validated().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_draft_validation_normalizes_tags_and_category() {
        let draft = QuestionDraft {
            question: " What is Rust? ".to_string(),
            answer: "A language".to_string(),
            category: Some("  ".to_string()),
            tags: vec![
                "rust".to_string(),
                " ".to_string(),
                " rust ".to_string(),
                "memory".to_string(),
            ],
            is_public: true,
        };
        let draft = draft.validated().unwrap();
        assert_eq!(draft.question, "What is Rust?");
        assert_eq!(draft.tags, vec!["rust", "memory"]);
        assert!(draft.category.is_none());
        assert!(draft.is_public);
    }

    #[test]
    fn test_apply_draft_keeps_id_and_audio() {
        let mut q = Question::new("q1", "Old", "Old answer").with_tags(["stale"]);
        q.mark_audio("audio/q1.mp3");

        let draft = QuestionDraft {
            category: Some("Coding".to_string()),
            tags: vec!["fresh".to_string()],
            is_public: true,
            ..QuestionDraft::new("New", "New answer")
        };
        q.apply_draft(&draft);

        assert_eq!(q.id, "q1");
        assert_eq!(q.question, "New");
        assert_eq!(q.tags(), ["fresh"]);
        assert!(q.is_public());
        assert_eq!(q.playable_audio(), Some("audio/q1.mp3"));
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let draft = QuestionDraft::new("Q", "A");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["isPublic"], serde_json::json!(false));
        assert!(value.get("category").is_none());
    }
}
