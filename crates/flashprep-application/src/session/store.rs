use std::sync::{Arc, Mutex};
use std::time::Duration;

use flashprep_core::error::FlashprepError;
use flashprep_core::navigation::{self, GateDecision};
use flashprep_core::session::{
    AuthState, IdentityProvider, ProviderSession, Session, SessionChanges, SessionEvent,
    transition,
};
use flashprep_core::user::{User, UserPatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owner of the authentication session.
///
/// Construct once at application start with [`SessionStore::start`] and pass
/// the `Arc` to consumers. The store holds exactly one subscription to the
/// provider's change channel; it is released by [`SessionStore::shutdown`]
/// or when the store is dropped.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<AuthState>>,
    bootstrap_error: Arc<Mutex<Option<FlashprepError>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Creates the store in `Bootstrapping` and starts synchronizing with `provider`.
    ///
    /// Subscribes before querying, so notifications sent during bootstrap are
    /// queued and applied in order right after the bootstrap transition. A
    /// query that errors, panics, or outlives `bootstrap_timeout` resolves to
    /// `Unauthenticated`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(provider: Arc<dyn IdentityProvider>, bootstrap_timeout: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::Bootstrapping);
        let state = Arc::new(state);
        let bootstrap_error = Arc::new(Mutex::new(None));

        let changes = provider.subscribe();
        let listener = tokio::spawn(run_listener(
            provider.clone(),
            changes,
            state.clone(),
            bootstrap_error.clone(),
            bootstrap_timeout,
        ));

        Arc::new(Self {
            provider,
            state,
            bootstrap_error,
            listener: Mutex::new(Some(listener)),
        })
    }

    /// Current state machine state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Flattened session view for consumers.
    pub fn session(&self) -> Session {
        Session::from(&*self.state.borrow())
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Watches state changes. Only actual transitions are announced.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Why bootstrap ended unauthenticated, if it failed.
    pub fn bootstrap_error(&self) -> Option<FlashprepError> {
        lock(&self.bootstrap_error).clone()
    }

    /// Waits until bootstrap has settled and returns the state at that point.
    pub async fn ready(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| !state.is_bootstrapping()).await {
            Ok(state) => state.clone(),
            // Sender lives in self; unreachable while the store exists.
            Err(_) => self.state(),
        }
    }

    /// Evaluates the navigation gate for a protected path.
    pub fn gate(&self, intended: &str) -> GateDecision {
        navigation::evaluate(&self.state.borrow(), intended)
    }

    /// Explicit login with caller-supplied credentials.
    pub fn login(&self, user: User, token: impl Into<String>) {
        apply(
            &self.state,
            SessionEvent::Login {
                user,
                token: token.into(),
            },
        );
    }

    /// Requests provider sign-out, then clears local state whatever the outcome.
    ///
    /// During bootstrap this settles the store as `Unauthenticated`; the
    /// pending bootstrap result is then ignored.
    pub async fn logout(&self) {
        if let Err(err) = self.provider.sign_out().await {
            tracing::warn!("[SessionStore] provider sign-out failed: {}", err);
        }
        apply(&self.state, SessionEvent::Logout);
    }

    /// Shallow-merges `patch` into the current user. No-op without a session.
    pub fn update_user(&self, patch: UserPatch) {
        if patch.is_empty() {
            return;
        }
        apply(&self.state, SessionEvent::UpdateUser(patch));
    }

    /// Stops listening to the provider and releases the subscription.
    ///
    /// A session query still running for bootstrap is cancelled with it.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
            tracing::debug!("[SessionStore] listener stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.listener)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs one event through the transition table, notifying watchers on change.
fn apply(state: &watch::Sender<AuthState>, event: SessionEvent) {
    let label = event.label();
    state.send_if_modified(|current| {
        let next = transition(current, event);
        if next == *current {
            tracing::debug!("[SessionStore] {} ignored in {}", label, current.label());
            return false;
        }
        tracing::info!(
            "[SessionStore] {}: {} -> {}",
            label,
            current.label(),
            next.label()
        );
        *current = next;
        true
    });
}

/// Aborts the wrapped task when dropped.
///
/// Held by the listener while the session query runs, so stopping the
/// listener also cancels the query.
struct QueryTask(JoinHandle<Result<Option<ProviderSession>, FlashprepError>>);

impl Drop for QueryTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn bootstrap(
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
) -> Result<SessionEvent, FlashprepError> {
    let mut query = QueryTask(tokio::spawn(async move { provider.get_session().await }));
    match tokio::time::timeout(timeout, &mut query.0).await {
        Ok(Ok(Ok(session))) => Ok(SessionEvent::Bootstrapped(session)),
        Ok(Ok(Err(err))) => Err(FlashprepError::bootstrap(err.to_string())),
        Ok(Err(join_err)) => Err(FlashprepError::bootstrap(format!(
            "session query aborted: {}",
            join_err
        ))),
        Err(_) => {
            query.0.abort();
            Err(FlashprepError::bootstrap(format!(
                "no answer from identity provider within {:?}",
                timeout
            )))
        }
    }
}

async fn run_listener(
    provider: Arc<dyn IdentityProvider>,
    mut changes: SessionChanges,
    state: Arc<watch::Sender<AuthState>>,
    bootstrap_error: Arc<Mutex<Option<FlashprepError>>>,
    timeout: Duration,
) {
    let event = match bootstrap(provider, timeout).await {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!("[SessionStore] {}", err);
            let reason = err.to_string();
            *lock(&bootstrap_error) = Some(err);
            SessionEvent::BootstrapFailed(reason)
        }
    };
    apply(&state, event);

    while let Some(snapshot) = changes.recv().await {
        apply(&state, SessionEvent::ProviderChanged(snapshot));
    }
    tracing::debug!("[SessionStore] provider closed its change channel");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flashprep_core::error::Result;
    use flashprep_infrastructure::MemoryIdentityProvider;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::{Notify, mpsc};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Lets aborted tasks get dropped by the runtime.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn ada() -> User {
        User::new("u1", "ada@example.com").with_name("Ada")
    }

    fn ada_session(token: &str) -> ProviderSession {
        ProviderSession::new(ada(), token)
    }

    /// Provider whose session query blocks until released.
    struct GatedProvider {
        release: Notify,
        session: Option<ProviderSession>,
        subscriptions: AtomicUsize,
        sender: Mutex<Option<mpsc::UnboundedSender<Option<ProviderSession>>>>,
        sign_out_fails: bool,
    }

    impl GatedProvider {
        fn new(session: Option<ProviderSession>) -> Self {
            Self {
                release: Notify::new(),
                session,
                subscriptions: AtomicUsize::new(0),
                sender: Mutex::new(None),
                sign_out_fails: false,
            }
        }

        fn push(&self, snapshot: Option<ProviderSession>) {
            if let Some(tx) = lock(&self.sender).as_ref() {
                tx.send(snapshot).unwrap();
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for GatedProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>> {
            self.release.notified().await;
            Ok(self.session.clone())
        }

        async fn sign_out(&self) -> Result<()> {
            if self.sign_out_fails {
                Err(FlashprepError::transport("offline"))
            } else {
                Ok(())
            }
        }

        fn subscribe(&self) -> SessionChanges {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::unbounded_channel();
            *lock(&self.sender) = Some(tx);
            rx
        }
    }

    /// Sets its flag when dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Provider whose session query never answers.
    #[derive(Default)]
    struct HangingProvider {
        query_started: AtomicBool,
        query_dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl IdentityProvider for HangingProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>> {
            let _flag = DropFlag(self.query_dropped.clone());
            self.query_started.store(true, Ordering::SeqCst);
            std::future::pending().await
        }

        async fn sign_out(&self) -> Result<()> {
            Ok(())
        }

        fn subscribe(&self) -> SessionChanges {
            mpsc::unbounded_channel().1
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl IdentityProvider for PanickingProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>> {
            panic!("provider bug");
        }

        async fn sign_out(&self) -> Result<()> {
            Ok(())
        }

        fn subscribe(&self) -> SessionChanges {
            mpsc::unbounded_channel().1
        }
    }

    #[tokio::test]
    async fn test_bootstrap_with_existing_session() {
        let provider = Arc::new(MemoryIdentityProvider::with_session(ada_session("tok")));
        let store = SessionStore::start(provider, TIMEOUT);

        let state = store.ready().await;
        assert!(state.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok"));
        let session = store.session();
        assert!(session.is_authenticated && !session.loading);
    }

    #[tokio::test]
    async fn test_bootstrap_without_session() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let store = SessionStore::start(provider, TIMEOUT);
        assert_eq!(store.ready().await, AuthState::Unauthenticated);
        assert!(store.bootstrap_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_bootstrap_resolves_unauthenticated() {
        let provider = Arc::new(MemoryIdentityProvider::unreachable("dns failure"));
        let store = SessionStore::start(provider, TIMEOUT);
        assert_eq!(store.ready().await, AuthState::Unauthenticated);
        assert!(matches!(
            store.bootstrap_error(),
            Some(FlashprepError::SessionBootstrap(_))
        ));
    }

    #[tokio::test]
    async fn test_panicking_provider_still_settles() {
        let store = SessionStore::start(Arc::new(PanickingProvider), TIMEOUT);
        assert_eq!(store.ready().await, AuthState::Unauthenticated);
        assert!(store.bootstrap_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_provider_times_out() {
        let provider = Arc::new(GatedProvider::new(Some(ada_session("never"))));
        let store = SessionStore::start(provider, Duration::from_secs(3));

        assert!(store.session().loading);
        assert_eq!(store.ready().await, AuthState::Unauthenticated);
        assert!(store.bootstrap_error().unwrap().to_string().contains("no answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_query_is_cancelled() {
        let provider = Arc::new(HangingProvider::default());
        let store = SessionStore::start(provider.clone(), Duration::from_secs(1));

        assert_eq!(store.ready().await, AuthState::Unauthenticated);
        settle().await;
        assert!(provider.query_started.load(Ordering::SeqCst));
        assert!(provider.query_dropped.load(Ordering::SeqCst));

        drop(store);
        settle().await;
        assert_eq!(Arc::strong_count(&provider), 1);
    }

    #[tokio::test]
    async fn test_shutdown_during_bootstrap_cancels_query() {
        let provider = Arc::new(HangingProvider::default());
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        while !provider.query_started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        store.shutdown();
        settle().await;
        assert!(provider.query_dropped.load(Ordering::SeqCst));

        drop(store);
        assert_eq!(Arc::strong_count(&provider), 1);
    }

    #[tokio::test]
    async fn test_logout_during_bootstrap_ignores_late_session() {
        let provider = Arc::new(GatedProvider::new(Some(ada_session("late"))));
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        assert!(store.state().is_bootstrapping());

        store.logout().await;
        assert_eq!(store.state(), AuthState::Unauthenticated);
        assert!(!store.gate("/dashboard").is_allow());

        provider.release.notify_one();
        settle().await;
        assert_eq!(store.state(), AuthState::Unauthenticated);
        assert!(store.token().is_none());
    }

    #[tokio::test]
    async fn test_gate_is_pending_while_bootstrapping() {
        let provider = Arc::new(GatedProvider::new(None));
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        assert_eq!(store.gate("/dashboard"), GateDecision::Pending);

        provider.release.notify_one();
        store.ready().await;
        assert!(matches!(store.gate("/dashboard"), GateDecision::Redirect { .. }));
    }

    #[tokio::test]
    async fn test_notifications_during_bootstrap_apply_after_it_in_order() {
        let provider = Arc::new(GatedProvider::new(None));
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        let mut rx = store.subscribe();

        provider.push(Some(ada_session("first")));
        provider.push(Some(ada_session("second")));
        tokio::task::yield_now().await;
        assert!(store.state().is_bootstrapping());

        provider.release.notify_one();
        let state = rx
            .wait_for(|s| s.token() == Some("second"))
            .await
            .unwrap()
            .clone();
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_session_loss_redirects_protected_views() {
        let provider = Arc::new(MemoryIdentityProvider::with_session(ada_session("tok")));
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        store.ready().await;
        assert!(store.gate("/dashboard").is_allow());

        let mut rx = store.subscribe();
        provider.expire();
        rx.wait_for(|s| *s == AuthState::Unauthenticated)
            .await
            .unwrap();

        assert_eq!(
            store.gate("/dashboard"),
            GateDecision::Redirect {
                to: "/login".to_string(),
                from: "/dashboard".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_provider_sign_in_authenticates() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        store.ready().await;

        let mut rx = store.subscribe();
        provider.sign_in(ada_session("fresh"));
        rx.wait_for(|s| s.is_authenticated()).await.unwrap();
        assert_eq!(store.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_explicit_login_update_and_logout() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        store.ready().await;

        store.login(ada(), "manual");
        assert_eq!(store.token().as_deref(), Some("manual"));

        store.update_user(UserPatch::name("Countess"));
        let user = store.user().unwrap();
        assert_eq!(user.name.as_deref(), Some("Countess"));
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(store.token().as_deref(), Some("manual"));

        store.logout().await;
        let session = store.session();
        assert!(!session.is_authenticated);
        assert!(session.user.is_none() && session.token.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_if_provider_fails() {
        let mut gated = GatedProvider::new(Some(ada_session("tok")));
        gated.sign_out_fails = true;
        let provider = Arc::new(gated);
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        provider.release.notify_one();
        assert!(store.ready().await.is_authenticated());

        store.logout().await;
        assert_eq!(store.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_single_subscription_released_on_shutdown() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        store.ready().await;
        assert_eq!(provider.active_subscribers(), 1);
        assert!(store.is_listening());

        store.shutdown();
        settle().await;
        assert!(!store.is_listening());
        assert_eq!(provider.active_subscribers(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let provider = Arc::new(GatedProvider::new(None));
        let store = SessionStore::start(provider.clone(), TIMEOUT);
        assert_eq!(provider.subscriptions.load(Ordering::SeqCst), 1);

        drop(store);
        settle().await;
        let sender = lock(&provider.sender);
        assert!(sender.as_ref().unwrap().is_closed());
    }
}
