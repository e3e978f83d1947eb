//! Page-level controller for one question view.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use flashprep_core::error::{FlashprepError, Result};
use flashprep_core::question::{
    CardView, FilterCriteria, Question, QuestionDraft, QuestionRepository, QuestionScope,
};
use tokio::sync::{Mutex, watch};

use crate::notification::Notifier;
use crate::view_model::{CollectionViewModel, EmptyState, ViewSnapshot};

const LOAD_FAILED: &str = "Failed to load questions";
const DELETED: &str = "Question deleted successfully!";
const DELETE_FAILED: &str = "Failed to delete question";
const AUDIO_GENERATED: &str = "Audio generated successfully";
const AUDIO_FAILED: &str = "Failed to generate audio";
const CREATED: &str = "Question created successfully!";
const CREATE_FAILED: &str = "Failed to create question";
const UPDATED: &str = "Question updated successfully!";
const UPDATE_FAILED: &str = "Failed to update question";

/// In-flight key for a create, which has no record id yet.
const CREATE_KEY: &str = "<new>";

/// Owns the cached collection of one view and drives it through the backend.
///
/// Loads replace the base collection; confirmed mutations patch it in place.
/// Outcomes are reported both as return values and as notifications.
pub struct QuestionBoard {
    scope: QuestionScope,
    repository: Arc<dyn QuestionRepository>,
    view: Mutex<CollectionViewModel>,
    loading: watch::Sender<bool>,
    pending_loads: AtomicUsize,
    loaded: AtomicBool,
    in_flight: StdMutex<HashSet<String>>,
    notifier: Notifier,
}

impl QuestionBoard {
    pub fn new(
        scope: QuestionScope,
        repository: Arc<dyn QuestionRepository>,
        notifier: Notifier,
    ) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            scope,
            repository,
            view: Mutex::new(CollectionViewModel::new()),
            loading,
            pending_loads: AtomicUsize::new(0),
            loaded: AtomicBool::new(false),
            in_flight: StdMutex::new(HashSet::new()),
            notifier,
        }
    }

    pub fn scope(&self) -> QuestionScope {
        self.scope
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Watches the loading flag.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Whether at least one load has completed successfully.
    pub fn has_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Whether an action for record `id` is currently running.
    pub fn is_busy(&self, id: &str) -> bool {
        lock(&self.in_flight).contains(id)
    }

    /// Watches the view model revision.
    pub async fn subscribe(&self) -> watch::Receiver<u64> {
        self.view.lock().await.subscribe()
    }

    /// Fetches the collection and makes it the new base.
    ///
    /// Overlapping loads are not deduplicated; the last one to finish wins.
    /// On failure the previous collection is kept.
    pub async fn load(&self, token: Option<&str>) -> Result<usize> {
        let _loading = LoadGuard::enter(self);

        let fetched = match token {
            None if self.scope.requires_token() => Err(FlashprepError::unauthenticated(
                "sign in to load your questions",
            )),
            _ => self.repository.list(self.scope, token).await,
        };

        match fetched {
            Ok(questions) => {
                let count = questions.len();
                self.view.lock().await.replace_base(questions);
                self.loaded.store(true, Ordering::SeqCst);
                tracing::info!("[QuestionBoard] {:?} loaded {} question(s)", self.scope, count);
                Ok(count)
            }
            Err(err) => {
                tracing::warn!("[QuestionBoard] {:?} load failed: {}", self.scope, err);
                self.notifier.error(failure_message(&err, LOAD_FAILED));
                Err(err)
            }
        }
    }

    /// Deletes record `id` and removes it from the collection.
    pub async fn delete(&self, id: &str, token: &str) -> Result<()> {
        let _busy = self.begin(id)?;
        let outcome = match self.ensure_owned() {
            Ok(()) => self.repository.delete(id, token).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                // Already gone locally is fine; the backend confirmed the delete.
                let _ = self.view.lock().await.remove(id);
                tracing::info!("[QuestionBoard] deleted {}", id);
                self.notifier.success(DELETED);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[QuestionBoard] delete {} failed: {}", id, err);
                self.notifier.error(failure_message(&err, DELETE_FAILED));
                Err(err)
            }
        }
    }

    /// Requests audio for record `id` and marks it playable. Returns the audio key.
    pub async fn generate_audio(&self, id: &str, token: &str) -> Result<String> {
        let _busy = self.begin(id)?;
        match self.repository.generate_audio(id, token).await {
            Ok(audio_key) => {
                if let Err(err) = self.view.lock().await.mark_audio(id, &audio_key) {
                    tracing::debug!("[QuestionBoard] audio for uncached record: {}", err);
                }
                tracing::info!("[QuestionBoard] audio ready for {}: {}", id, audio_key);
                self.notifier.success(AUDIO_GENERATED);
                Ok(audio_key)
            }
            Err(err) => {
                tracing::warn!("[QuestionBoard] audio for {} failed: {}", id, err);
                self.notifier.error(AUDIO_FAILED);
                Err(err)
            }
        }
    }

    /// Creates a question and adds it to the collection.
    ///
    /// When the backend does not echo the stored record the collection is
    /// refetched instead. Returns the echoed record, if any.
    pub async fn create(&self, draft: QuestionDraft, token: &str) -> Result<Option<Question>> {
        let _busy = self.begin(CREATE_KEY)?;
        let outcome = match self.ensure_owned().and_then(|()| draft.validated()) {
            Ok(draft) => self.repository.create(&draft, token).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(created) => {
                self.notifier.success(CREATED);
                match &created {
                    Some(question) => {
                        tracing::info!("[QuestionBoard] created {}", question.id);
                        self.view.lock().await.upsert(question.clone());
                    }
                    None => {
                        tracing::debug!("[QuestionBoard] create returned no record, refetching");
                        if let Err(err) = self.load(Some(token)).await {
                            tracing::warn!("[QuestionBoard] refetch after create failed: {}", err);
                        }
                    }
                }
                Ok(created)
            }
            Err(err) => {
                tracing::warn!("[QuestionBoard] create failed: {}", err);
                self.notifier.error(failure_message(&err, CREATE_FAILED));
                Err(err)
            }
        }
    }

    /// Replaces the content of record `id`. Returns the cached record afterwards.
    pub async fn update(
        &self,
        id: &str,
        draft: QuestionDraft,
        token: &str,
    ) -> Result<Option<Question>> {
        let _busy = self.begin(id)?;
        let outcome = match self.ensure_owned().and_then(|()| draft.validated()) {
            Ok(draft) => {
                let echoed = self.repository.update(id, &draft, token).await;
                echoed.map(|echoed| (draft, echoed))
            }
            Err(err) => Err(err),
        };

        let (draft, echoed) = match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("[QuestionBoard] update {} failed: {}", id, err);
                self.notifier.error(failure_message(&err, UPDATE_FAILED));
                return Err(err);
            }
        };

        let mut view = self.view.lock().await;
        match echoed {
            Some(question) => view.upsert(question),
            None => {
                if let Err(err) = view.patch(id, |q| q.apply_draft(&draft)) {
                    tracing::debug!("[QuestionBoard] update for uncached record: {}", err);
                }
            }
        }
        let updated = view.get(id).cloned();
        drop(view);

        tracing::info!("[QuestionBoard] updated {}", id);
        self.notifier.success(UPDATED);
        Ok(updated)
    }

    pub async fn set_filters(&self, criteria: FilterCriteria) {
        self.view.lock().await.set_criteria(criteria);
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.view.lock().await.criteria().clone()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.view.lock().await.snapshot()
    }

    pub async fn get(&self, id: &str) -> Option<Question> {
        self.view.lock().await.get(id).cloned()
    }

    /// Card models for the currently filtered records.
    pub async fn cards(&self) -> Vec<CardView> {
        let snapshot = self.snapshot().await;
        let busy = lock(&self.in_flight).clone();
        snapshot
            .filtered
            .iter()
            .map(|q| CardView::build(q, self.scope.is_owned(), busy.contains(&q.id)))
            .collect()
    }

    /// `None` while loading or when records are listed.
    pub async fn empty_state(&self) -> Option<EmptyState> {
        if self.is_loading() {
            return None;
        }
        self.snapshot().await.empty_state()
    }

    /// Drops the cached collection, e.g. after sign-out.
    pub async fn clear(&self) {
        self.view.lock().await.replace_base(Vec::new());
        self.loaded.store(false, Ordering::SeqCst);
    }

    fn ensure_owned(&self) -> Result<()> {
        if self.scope.is_owned() {
            Ok(())
        } else {
            Err(FlashprepError::validation(
                "public questions can only be edited by their owner",
            ))
        }
    }

    fn begin(&self, id: &str) -> Result<InFlightGuard<'_>> {
        if !lock(&self.in_flight).insert(id.to_string()) {
            tracing::debug!("[QuestionBoard] {} is busy, refusing action", id);
            return Err(FlashprepError::in_flight(id));
        }
        Ok(InFlightGuard {
            board: self,
            id: id.to_string(),
        })
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Server message when there is one, otherwise `fallback`.
fn failure_message(err: &FlashprepError, fallback: &str) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Keeps the loading flag raised while at least one load is running.
struct LoadGuard<'a> {
    board: &'a QuestionBoard,
}

impl<'a> LoadGuard<'a> {
    fn enter(board: &'a QuestionBoard) -> Self {
        board.pending_loads.fetch_add(1, Ordering::SeqCst);
        board.loading.send_if_modified(|loading| !std::mem::replace(loading, true));
        Self { board }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.board.pending_loads.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.board
                .loading
                .send_if_modified(|loading| std::mem::replace(loading, false));
        }
    }
}

struct InFlightGuard<'a> {
    board: &'a QuestionBoard,
    id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(&self.board.in_flight).remove(&self.id);
    }
}
