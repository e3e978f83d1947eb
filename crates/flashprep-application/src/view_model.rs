//! Memoized derived views over one question collection.

use std::sync::Arc;

use flashprep_core::error::{FlashprepError, Result};
use flashprep_core::question::{FilterCriteria, Question, available_tags, filter_questions};
use serde::Serialize;
use tokio::sync::watch;

/// Which empty-state message a view should show when nothing is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// The base collection itself is empty.
    NoData,
    /// Records exist but the active filters hide all of them.
    FilteredOut,
}

/// One consistent derivation of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// Increments on every base or criteria change.
    pub revision: u64,
    pub criteria: FilterCriteria,
    pub filtered: Arc<Vec<Question>>,
    pub available_tags: Arc<Vec<String>>,
    pub base_len: usize,
}

impl ViewSnapshot {
    pub fn base_is_empty(&self) -> bool {
        self.base_len == 0
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.filtered.is_empty() {
            None
        } else if self.base_is_empty() {
            Some(EmptyState::NoData)
        } else {
            Some(EmptyState::FilteredOut)
        }
    }
}

/// Holds the base collection and filter criteria for one view and derives
/// the filtered list and tag facets from them.
///
/// Derivations are cached per input revision: reading a snapshot twice
/// without an intervening change does no work, and a criteria change does not
/// recompute tags. Every change publishes the new revision on a watch channel.
pub struct CollectionViewModel {
    base: Arc<Vec<Question>>,
    criteria: FilterCriteria,
    base_revision: u64,
    criteria_revision: u64,
    filtered_cache: Option<((u64, u64), Arc<Vec<Question>>)>,
    tags_cache: Option<(u64, Arc<Vec<String>>)>,
    derivations: usize,
    revision: watch::Sender<u64>,
}

impl Default for CollectionViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionViewModel {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            base: Arc::new(Vec::new()),
            criteria: FilterCriteria::default(),
            base_revision: 0,
            criteria_revision: 0,
            filtered_cache: None,
            tags_cache: None,
            derivations: 0,
            revision,
        }
    }

    pub fn base(&self) -> &[Question] {
        &self.base
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.base.iter().find(|q| q.id == id)
    }

    pub fn revision(&self) -> u64 {
        self.base_revision + self.criteria_revision
    }

    /// Receives the revision number after every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of filter/tag recomputations performed so far.
    pub fn derivation_count(&self) -> usize {
        self.derivations
    }

    /// Makes `questions` the authoritative base collection.
    pub fn replace_base(&mut self, questions: Vec<Question>) {
        self.base = Arc::new(questions);
        self.base_changed();
    }

    /// Sets the filter criteria. Identical criteria are not a change.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.criteria = criteria;
        self.criteria_revision += 1;
        self.publish();
    }

    /// Applies `update` to the record with `id`.
    pub fn patch<F>(&mut self, id: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut Question),
    {
        let base = Arc::make_mut(&mut self.base);
        let record = base
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| FlashprepError::not_found("question", id))?;
        update(record);
        self.base_changed();
        Ok(())
    }

    /// Marks record `id` as having audio stored under `audio_key`.
    pub fn mark_audio(&mut self, id: &str, audio_key: &str) -> Result<()> {
        self.patch(id, |q| q.mark_audio(audio_key))
    }

    /// Removes record `id` and returns it.
    pub fn remove(&mut self, id: &str) -> Result<Question> {
        let index = self
            .base
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| FlashprepError::not_found("question", id))?;
        let removed = Arc::make_mut(&mut self.base).remove(index);
        self.base_changed();
        Ok(removed)
    }

    /// Replaces the record with the same id, or appends it.
    pub fn upsert(&mut self, question: Question) {
        let base = Arc::make_mut(&mut self.base);
        match base.iter_mut().find(|q| q.id == question.id) {
            Some(existing) => *existing = question,
            None => base.push(question),
        }
        self.base_changed();
    }

    /// Returns the current derivation, recomputing only stale parts.
    pub fn snapshot(&mut self) -> ViewSnapshot {
        let filtered_key = (self.base_revision, self.criteria_revision);
        let filtered = match &self.filtered_cache {
            Some((key, cached)) if *key == filtered_key => cached.clone(),
            _ => {
                let fresh = Arc::new(filter_questions(&self.base, &self.criteria));
                self.derivations += 1;
                self.filtered_cache = Some((filtered_key, fresh.clone()));
                fresh
            }
        };

        let tags = match &self.tags_cache {
            Some((key, cached)) if *key == self.base_revision => cached.clone(),
            _ => {
                let fresh = Arc::new(available_tags(&self.base));
                self.derivations += 1;
                self.tags_cache = Some((self.base_revision, fresh.clone()));
                fresh
            }
        };

        ViewSnapshot {
            revision: self.revision(),
            criteria: self.criteria.clone(),
            filtered,
            available_tags: tags,
            base_len: self.base.len(),
        }
    }

    fn base_changed(&mut self) {
        self.base_revision += 1;
        self.publish();
    }

    fn publish(&self) {
        self.revision.send_replace(self.revision());
    }
}
