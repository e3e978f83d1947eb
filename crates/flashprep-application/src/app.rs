//! Application composition root.
//!
//! `FlashprepApp` wires the session store to the question boards so that a
//! front end only needs one handle: sign-in loads the user's questions,
//! sign-out drops them.

use std::sync::{Arc, Mutex};

use flashprep_core::config::ApiConfig;
use flashprep_core::error::Result;
use flashprep_core::question::{QuestionRepository, QuestionScope};
use flashprep_core::session::{AuthState, IdentityProvider};
use flashprep_infrastructure::{ApiClient, HttpQuestionRepository};
use tokio::task::JoinHandle;

use crate::board::QuestionBoard;
use crate::notification::Notifier;
use crate::session::SessionStore;

/// Live application state shared by every view.
///
/// # Responsibilities
///
/// - Owning the [`SessionStore`] (the single source of the auth token)
/// - Owning one [`QuestionBoard`] per view (own questions, public pool)
/// - Reloading or clearing the own-questions board when the session changes
///
/// # Thread Safety
///
/// Every component is behind an `Arc` and uses interior mutability, so the
/// app can be shared across tasks.
pub struct FlashprepApp {
    session: Arc<SessionStore>,
    mine: Arc<QuestionBoard>,
    public: Arc<QuestionBoard>,
    sync: Mutex<Option<JoinHandle<()>>>,
}

impl FlashprepApp {
    /// Builds the HTTP stack from `config` and starts the session store.
    ///
    /// # Arguments
    ///
    /// * `config` - API base URL and timeouts
    /// * `provider` - Identity provider the session store synchronizes with
    /// * `notifier` - Destination for transient user notifications
    pub fn start(
        config: ApiConfig,
        provider: Arc<dyn IdentityProvider>,
        notifier: Notifier,
    ) -> Result<Self> {
        let bootstrap_timeout = config.bootstrap_timeout();
        let repository = Arc::new(HttpQuestionRepository::new(ApiClient::new(config)?));
        Ok(Self::with_repository(
            repository,
            provider,
            bootstrap_timeout,
            notifier,
        ))
    }

    /// Same as [`FlashprepApp::start`] with an already-built repository.
    pub fn with_repository(
        repository: Arc<dyn QuestionRepository>,
        provider: Arc<dyn IdentityProvider>,
        bootstrap_timeout: std::time::Duration,
        notifier: Notifier,
    ) -> Self {
        let session = SessionStore::start(provider, bootstrap_timeout);
        let mine = Arc::new(QuestionBoard::new(
            QuestionScope::Mine,
            repository.clone(),
            notifier.clone(),
        ));
        let public = Arc::new(QuestionBoard::new(
            QuestionScope::Public,
            repository,
            notifier,
        ));
        Self {
            session,
            mine,
            public,
            sync: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Board for `scope`.
    pub fn board(&self, scope: QuestionScope) -> &Arc<QuestionBoard> {
        match scope {
            QuestionScope::Mine => &self.mine,
            QuestionScope::Public => &self.public,
        }
    }

    /// Loads the board for `scope` with the current session token.
    pub async fn load(&self, scope: QuestionScope) -> Result<usize> {
        let token = self.session.token();
        self.board(scope).load(token.as_deref()).await
    }

    /// Keeps the own-questions board in step with the session.
    ///
    /// Every transition into `Authenticated` with a new token reloads the
    /// board; leaving `Authenticated` clears it. Calling this twice replaces
    /// the previous sync task.
    pub fn spawn_session_sync(&self) {
        let mut changes = self.session.subscribe();
        let mine = self.mine.clone();

        let handle = tokio::spawn(async move {
            let mut last_token: Option<String> = None;
            loop {
                let state = changes.borrow_and_update().clone();
                match &state {
                    AuthState::Authenticated { token, .. } => {
                        if last_token.as_deref() != Some(token.as_str()) {
                            last_token = Some(token.clone());
                            // Failures are already reported through the notifier.
                            let _ = mine.load(Some(token.as_str())).await;
                        }
                    }
                    AuthState::Unauthenticated => {
                        if last_token.take().is_some() {
                            tracing::debug!("[FlashprepApp] session ended, clearing own questions");
                            mine.clear().await;
                        }
                    }
                    AuthState::Bootstrapping => {}
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });

        if let Some(previous) = lock(&self.sync).replace(handle) {
            previous.abort();
        }
    }

    /// Stops the sync task and the session listener.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.sync).take() {
            handle.abort();
        }
        self.session.shutdown();
    }
}

impl Drop for FlashprepApp {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.sync).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
