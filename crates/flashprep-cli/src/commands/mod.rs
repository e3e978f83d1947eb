//! Command implementations and the shared per-invocation context.

pub mod auth;
pub mod output;
pub mod questions;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use flashprep_application::{FlashprepApp, Notification, Notifier};
use flashprep_core::navigation::GateDecision;
use flashprep_core::session::{IdentityProvider, ProviderSession};
use flashprep_core::user::User;
use flashprep_infrastructure::{
    AppConfig, ConfigService, GoTrueIdentityProvider, MemoryIdentityProvider,
};
use tokio::sync::mpsc;

/// Settings and credentials resolved once per invocation.
pub struct Context {
    config: AppConfig,
    token: Option<String>,
    pub json: bool,
}

/// A started application plus the notifications it emits.
pub struct Running {
    pub app: FlashprepApp,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Running {
    /// Prints every notification emitted so far.
    pub fn flush(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            output::notification(&notification);
        }
    }

    /// Token of the signed-in session, or an error telling the user to sign in.
    pub fn require_token(&self, path: &str) -> Result<String> {
        match self.app.session().gate(path) {
            GateDecision::Allow => self
                .app
                .session()
                .token()
                .context("session has no access token"),
            GateDecision::Redirect { .. } => {
                bail!("Not signed in. Run `flashprep login <email>` and export FLASHPREP_TOKEN.")
            }
            GateDecision::Pending => bail!("Session is still starting up"),
        }
    }
}

impl Context {
    pub fn load(config_path: Option<&Path>, token: Option<String>, json: bool) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new_default(),
        };
        let config = service.load().context("Failed to load configuration")?;
        Ok(Self {
            config,
            token: token.filter(|t| !t.trim().is_empty()),
            json,
        })
    }

    /// Identity provider for token-based commands.
    ///
    /// With an auth server configured the token is validated there; without
    /// one it is trusted as-is under a placeholder user.
    fn provider(&self) -> Arc<dyn IdentityProvider> {
        match (&self.config.auth, &self.token) {
            (Some(auth), Some(token)) => {
                Arc::new(GoTrueIdentityProvider::new(auth.clone()).with_access_token(token.clone()))
            }
            (Some(auth), None) => Arc::new(GoTrueIdentityProvider::new(auth.clone())),
            (None, Some(token)) => Arc::new(MemoryIdentityProvider::with_session(
                ProviderSession::new(User::new("cli", "unknown"), token.clone()),
            )),
            (None, None) => Arc::new(MemoryIdentityProvider::new()),
        }
    }

    pub fn gotrue(&self) -> Result<GoTrueIdentityProvider> {
        match &self.config.auth {
            Some(auth) => Ok(GoTrueIdentityProvider::new(auth.clone())),
            None => bail!(
                "No auth server configured. Set FLASHPREP_AUTH_URL and FLASHPREP_AUTH_ANON_KEY \
                 or add an [auth] section to the config file."
            ),
        }
    }

    /// Starts the application and waits for the session to settle.
    pub async fn start(&self) -> Result<Running> {
        let (notifier, notifications) = Notifier::channel();
        let app = FlashprepApp::start(self.config.api.clone(), self.provider(), notifier)?;
        let state = app.session().ready().await;
        tracing::debug!("[cli] session ready: {}", state.label());
        if let Some(err) = app.session().bootstrap_error() {
            tracing::warn!("[cli] {}", err);
        }
        Ok(Running { app, notifications })
    }
}
