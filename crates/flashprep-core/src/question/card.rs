//! Card presentation model.
//!
//! Decides which per-card actions a view may offer and produces the
//! truncated preview text shown on the card.

use serde::Serialize;

use super::model::Question;

pub const QUESTION_PREVIEW_LEN: usize = 120;
pub const ANSWER_PREVIEW_LEN: usize = 150;

/// Shortens `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Actions available on a single card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardControls {
    /// Offered while no audio exists; disabled while a request is in flight.
    pub generate_audio: bool,
    pub generate_audio_busy: bool,
    pub play_audio: bool,
    pub edit: bool,
    pub delete: bool,
}

/// Everything a card needs to render one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    pub question_preview: String,
    pub answer_preview: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub audio_key: Option<String>,
    pub controls: CardControls,
}

impl CardView {
    /// Builds the card for `question`.
    ///
    /// `owned` enables edit/delete (the user's own collection). `busy` marks
    /// an action for this record as in flight.
    pub fn build(question: &Question, owned: bool, busy: bool) -> Self {
        let audio_key = question.playable_audio().map(str::to_string);
        Self {
            id: question.id.clone(),
            question_preview: truncate_text(&question.question, QUESTION_PREVIEW_LEN),
            answer_preview: truncate_text(&question.answer, ANSWER_PREVIEW_LEN),
            category: question.category.clone(),
            tags: question.tags().to_vec(),
            is_public: question.is_public(),
            controls: CardControls {
                generate_audio: !question.has_audio(),
                generate_audio_busy: busy,
                play_audio: audio_key.is_some(),
                edit: owned,
                delete: owned,
            },
            audio_key,
        }
    }
}
