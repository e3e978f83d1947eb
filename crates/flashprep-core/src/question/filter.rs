//! Derived views over a question collection.
//!
//! Both functions are pure; memoization lives with the caller that owns the
//! collection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::Question;

/// Per-view filter state. Empty strings mean "match anything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tag: String,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.category.is_empty() && self.tag.is_empty()
    }

    /// Evaluates all three predicates against one record.
    pub fn matches(&self, question: &Question) -> bool {
        self.matches_search(question)
            && self.matches_category(question)
            && self.matches_tag(question)
    }

    fn matches_search(&self, question: &Question) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        question.question.to_lowercase().contains(&needle)
            || question.answer.to_lowercase().contains(&needle)
    }

    fn matches_category(&self, question: &Question) -> bool {
        self.category.is_empty() || question.category.as_deref() == Some(self.category.as_str())
    }

    fn matches_tag(&self, question: &Question) -> bool {
        self.tag.is_empty() || question.has_tag(&self.tag)
    }
}

/// Returns the records matching `criteria`, preserving collection order.
pub fn filter_questions(questions: &[Question], criteria: &FilterCriteria) -> Vec<Question> {
    if criteria.is_empty() {
        return questions.to_vec();
    }
    questions
        .iter()
        .filter(|q| criteria.matches(q))
        .cloned()
        .collect()
}

/// Every tag present in the collection, deduplicated and sorted.
pub fn available_tags(questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .flat_map(|q| q.tags().iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
